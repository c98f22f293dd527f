//! Junction merging: folding convergent patches into one synthetic patch.
//!
//! When several patches aim at the same destination, the merger produces a
//! single patch carrying the strongest intensity, the union of all tags
//! plus a `junction` marker, and an audit trail of the contributing
//! patches in its metadata.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::PatchbayError;
use crate::patch::{Patch, META_SOURCE_PATCHES};
use crate::tags::PatchTag;

/// Folds convergent patches into a single synthetic patch.
pub struct JunctionMerger;

impl JunctionMerger {
    /// Merges a non-empty batch of patches converging on one destination.
    ///
    /// The synthetic patch's source is a composite label enumerating every
    /// input source; its destination is the (assumed-common) destination
    /// of the batch; its intensity is the maximum over the inputs; its
    /// tags are the union of all input tags plus [`PatchTag::Junction`].
    /// Priority is classified from the merged intensity and tags as for
    /// any other patch.
    ///
    /// An empty batch is a programmer error and returns
    /// [`PatchbayError::EmptyJunction`] immediately.
    pub fn create_junction(patches: &[Patch]) -> Result<Patch, PatchbayError> {
        let first = patches.first().ok_or(PatchbayError::EmptyJunction)?;

        let sources: Vec<&str> = patches.iter().map(|p| p.source_node.as_str()).collect();
        let source_label = format!("junction[{}]", sources.join("+"));
        let intensity = patches.iter().map(|p| p.intensity).max().unwrap_or(0);

        let mut tags: BTreeSet<PatchTag> = patches
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        tags.insert(PatchTag::Junction);

        let audit: Vec<Value> = patches
            .iter()
            .map(|p| json!({ "id": p.id, "intensity": p.intensity }))
            .collect();

        let merged = Patch::new(
            source_label,
            first.destination_node.clone(),
            intensity,
            tags,
        )
        .with_metadata(META_SOURCE_PATCHES, Value::Array(audit));

        debug!(
            destination = %merged.destination_node,
            inputs = patches.len(),
            intensity,
            "junction patch created"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::PriorityTier;

    #[test]
    fn test_junction_takes_max_intensity() {
        let inputs = vec![
            Patch::direct("heart", "throat", 50),
            Patch::direct("spleen", "throat", 90),
        ];
        let merged = JunctionMerger::create_junction(&inputs).unwrap();
        assert_eq!(merged.intensity, 90);
        assert_eq!(merged.destination_node, "throat");
        assert_eq!(merged.priority(), PriorityTier::Critical);
    }

    #[test]
    fn test_junction_unions_tags_and_adds_marker() {
        let a = Patch::new(
            "heart",
            "throat",
            40,
            [PatchTag::Fusion].into_iter().collect(),
        );
        let b = Patch::new(
            "spleen",
            "throat",
            30,
            [PatchTag::Recovery].into_iter().collect(),
        );
        let merged = JunctionMerger::create_junction(&[a, b]).unwrap();
        assert!(merged.tags.contains(&PatchTag::Junction));
        assert!(merged.tags.contains(&PatchTag::Fusion));
        assert!(merged.tags.contains(&PatchTag::Recovery));
    }

    #[test]
    fn test_junction_source_label_enumerates_inputs() {
        let inputs = vec![
            Patch::direct("heart", "throat", 10),
            Patch::direct("spleen", "throat", 20),
        ];
        let merged = JunctionMerger::create_junction(&inputs).unwrap();
        assert_eq!(merged.source_node, "junction[heart+spleen]");
    }

    #[test]
    fn test_junction_audit_trail_lists_every_input() {
        let inputs = vec![
            Patch::direct("heart", "throat", 10),
            Patch::direct("spleen", "throat", 20),
            Patch::direct("liver", "throat", 30),
        ];
        let merged = JunctionMerger::create_junction(&inputs).unwrap();
        let audit = merged
            .metadata
            .get(META_SOURCE_PATCHES)
            .and_then(Value::as_array)
            .unwrap();
        assert_eq!(audit.len(), 3);
        assert_eq!(audit[2]["intensity"], json!(30));
        assert_eq!(audit[0]["id"], json!(inputs[0].id));
    }

    #[test]
    fn test_empty_junction_is_an_error() {
        assert!(matches!(
            JunctionMerger::create_junction(&[]),
            Err(PatchbayError::EmptyJunction)
        ));
    }
}
