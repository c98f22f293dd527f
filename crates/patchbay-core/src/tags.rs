//! Patch tag vocabulary.
//!
//! Tags are drawn from a recognized set plus a bounded `custom` escape
//! hatch. Custom tags are validated at the admission boundary (lowercase
//! alphanumeric with `-`/`_`, 1-32 chars) instead of being trusted ad hoc.
//! Two tags carry routing semantics: `emergency` forces the Critical tier
//! and selects the emergency depth ceiling; `law-loop` lifts a patch to
//! High and selects the extended ceiling.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PatchbayError;

static CUSTOM_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,31}$").expect("custom tag regex"));

/// One tag on a patch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchTag {
    /// Forces the Critical tier regardless of intensity; selects the
    /// emergency depth ceiling.
    Emergency,
    /// Law-loop escalation: lifts the patch to at least High; selects the
    /// extended depth ceiling.
    LawLoop,
    /// Marker stamped onto synthetic patches produced by the junction
    /// merger.
    Junction,
    /// The patch belongs to a fusion protocol exchange.
    Fusion,
    /// The patch was emitted by the recovery protocol.
    Recovery,
    /// Bounded free-form escape hatch; validated by [`PatchTag::parse`].
    Custom(String),
}

impl PatchTag {
    /// Parses a raw tag string. Recognized vocabulary words map to their
    /// variants; anything else must pass custom-tag validation.
    pub fn parse(raw: &str) -> Result<Self, PatchbayError> {
        match raw.trim() {
            "emergency" => Ok(Self::Emergency),
            "law-loop" => Ok(Self::LawLoop),
            "junction" => Ok(Self::Junction),
            "fusion" => Ok(Self::Fusion),
            "recovery" => Ok(Self::Recovery),
            other if CUSTOM_TAG_RE.is_match(other) => Ok(Self::Custom(other.to_string())),
            other => Err(PatchbayError::InvalidTag {
                raw: other.to_string(),
            }),
        }
    }

    /// The wire/display form of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Emergency => "emergency",
            Self::LawLoop => "law-loop",
            Self::Junction => "junction",
            Self::Fusion => "fusion",
            Self::Recovery => "recovery",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for PatchTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recognized_vocabulary() {
        assert_eq!(PatchTag::parse("emergency").unwrap(), PatchTag::Emergency);
        assert_eq!(PatchTag::parse("law-loop").unwrap(), PatchTag::LawLoop);
        assert_eq!(PatchTag::parse("junction").unwrap(), PatchTag::Junction);
        assert_eq!(PatchTag::parse("fusion").unwrap(), PatchTag::Fusion);
        assert_eq!(PatchTag::parse("recovery").unwrap(), PatchTag::Recovery);
    }

    #[test]
    fn test_parse_custom_escape_hatch() {
        assert_eq!(
            PatchTag::parse("dream-echo").unwrap(),
            PatchTag::Custom("dream-echo".to_string())
        );
        assert_eq!(
            PatchTag::parse("  ritual_7  ").unwrap(),
            PatchTag::Custom("ritual_7".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_malformed_custom_tags() {
        assert!(PatchTag::parse("").is_err());
        assert!(PatchTag::parse("UPPERCASE").is_err());
        assert!(PatchTag::parse("has space").is_err());
        assert!(PatchTag::parse("-leading-dash").is_err());
        assert!(PatchTag::parse(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for raw in ["emergency", "law-loop", "junction", "free-form"] {
            let tag = PatchTag::parse(raw).unwrap();
            assert_eq!(tag.to_string(), raw);
        }
    }
}
