//! The patch entity: a directed routing request between two organs.
//!
//! A patch is created by a producer, owned by the queue while pending, and
//! handed to the consumer on dequeue. Its priority tier is classified once
//! at construction from intensity and tags and never changes afterwards;
//! re-prioritizing means constructing a new patch.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::priority::PriorityTier;
use crate::tags::PatchTag;

/// Metadata key set when a destination collision was observed at admission.
pub const META_COLLISION: &str = "collision_detected";
/// Metadata key holding the reason passed to `fail_route`.
pub const META_FAILURE_REASON: &str = "failure_reason";
/// Metadata key holding the `{id, intensity}` audit list on a junction patch.
pub const META_SOURCE_PATCHES: &str = "source_patches";

/// Lifecycle state of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    /// Admitted and waiting in the queue.
    Pending,
    /// Dequeued; its route is held in the active set.
    Active,
    /// Terminated successfully via `complete_route`.
    Completed,
    /// Terminated via `fail_route`; see [`META_FAILURE_REASON`].
    Failed,
    /// Escalated out of this layer (set by recovery collaborators).
    Escalated,
}

/// A directed routing request connecting a source organ to a destination
/// organ, carrying an intensity value and a tag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    /// Generated unique id.
    pub id: Uuid,
    /// Opaque identifier of the producing organ.
    pub source_node: String,
    /// Opaque identifier of the organ this patch routes toward.
    pub destination_node: String,
    /// Intensity in [0, 100]; drives priority classification.
    pub intensity: u8,
    /// Recognized vocabulary tags plus bounded custom tags.
    #[serde(default)]
    pub tags: BTreeSet<PatchTag>,
    /// Tier classified at construction. Fixed for the patch's lifetime.
    priority: PriorityTier,
    /// Lifecycle state.
    pub status: PatchStatus,
    /// Wall-clock admission timestamp. Observability only; FIFO ordering
    /// uses the queue-assigned `sequence` counter.
    pub enqueued_at: DateTime<Utc>,
    /// Set by `complete_route`.
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    /// Monotonic admission counter assigned by the queue; the
    /// authoritative same-tier tie-break.
    #[serde(default)]
    pub(crate) sequence: u64,
    /// Open diagnostic annotations (collision flags, failure reasons,
    /// junction audit trails).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Patch {
    /// Creates a pending patch. Intensity is clamped to [0, 100] and the
    /// priority tier is classified here, once.
    pub fn new(
        source_node: impl Into<String>,
        destination_node: impl Into<String>,
        intensity: u8,
        tags: BTreeSet<PatchTag>,
    ) -> Self {
        let intensity = intensity.min(100);
        let priority = PriorityTier::classify(intensity, &tags);
        Self {
            id: Uuid::new_v4(),
            source_node: source_node.into(),
            destination_node: destination_node.into(),
            intensity,
            tags,
            priority,
            status: PatchStatus::Pending,
            enqueued_at: Utc::now(),
            processed_at: None,
            sequence: 0,
            metadata: BTreeMap::new(),
        }
    }

    /// Creates an untagged patch.
    pub fn direct(
        source_node: impl Into<String>,
        destination_node: impl Into<String>,
        intensity: u8,
    ) -> Self {
        Self::new(source_node, destination_node, intensity, BTreeSet::new())
    }

    /// Attaches a metadata annotation. Metadata never influences priority.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The tier classified at construction.
    pub fn priority(&self) -> PriorityTier {
        self.priority
    }

    /// The queue-assigned admission sequence (0 until admitted).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The (source, destination) pair tracked in the active-route set.
    pub fn route(&self) -> (String, String) {
        (self.source_node.clone(), self.destination_node.clone())
    }

    /// True once admission stamped a collision marker on this patch.
    pub fn collision_detected(&self) -> bool {
        self.metadata
            .get(META_COLLISION)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Serializes to JSON bytes for external checkpoint payloads.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserializes from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}
