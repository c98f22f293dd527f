//! Priority classification.
//!
//! Maps (intensity, tag set) to an ordinal tier. Critical is numerically
//! lowest and most urgent; the queue dequeues ascending by ordinal. The
//! classification runs once at patch construction and the result is held
//! fixed for the patch's whole lifetime.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::tags::PatchTag;

/// Intensity floor for the Critical tier.
pub const CRITICAL_INTENSITY: u8 = 86;
/// Intensity floor for the High tier.
pub const HIGH_INTENSITY: u8 = 71;
/// Intensity floor for the Standard tier.
pub const STANDARD_INTENSITY: u8 = 51;

/// Ordinal priority tier. Lower ordinal = more urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Critical = 0,
    High = 1,
    Standard = 2,
    Background = 3,
}

impl PriorityTier {
    /// All tiers in dequeue order (most urgent first).
    pub const ALL: [PriorityTier; 4] = [
        Self::Critical,
        Self::High,
        Self::Standard,
        Self::Background,
    ];

    /// Classifies an intensity/tag combination into a tier.
    ///
    /// Rules, evaluated in order: intensity >= 86 or an `emergency` tag
    /// force Critical; intensity >= 71 or a `law-loop` tag give High;
    /// intensity >= 51 gives Standard; everything else is Background.
    pub fn classify(intensity: u8, tags: &BTreeSet<PatchTag>) -> Self {
        if intensity >= CRITICAL_INTENSITY || tags.contains(&PatchTag::Emergency) {
            Self::Critical
        } else if intensity >= HIGH_INTENSITY || tags.contains(&PatchTag::LawLoop) {
            Self::High
        } else if intensity >= STANDARD_INTENSITY {
            Self::Standard
        } else {
            Self::Background
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Standard => "standard",
            Self::Background => "background",
        }
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
