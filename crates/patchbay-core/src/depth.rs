//! Depth-limited recursion guarding.
//!
//! Each logical routing chain carries a hop counter. The ceiling that
//! applies to a given ascent is selected by the patch's tags: `emergency`
//! chains get the tallest tag ceiling, `law-loop` chains the extended
//! one, everything else the standard one. A separate absolute ceiling is
//! enforced on every chain regardless of tags; breaching it is
//! unrecoverable at this layer and signals upward toward emergency halt
//! handling.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::PatchbayError;
use crate::tags::PatchTag;

/// Default standard ceiling.
pub const DEFAULT_STANDARD_CEILING: u32 = 5;
/// Default extended (law-loop) ceiling.
pub const DEFAULT_EXTENDED_CEILING: u32 = 8;
/// Default emergency ceiling.
pub const DEFAULT_EMERGENCY_CEILING: u32 = 12;
/// Default absolute ceiling.
pub const DEFAULT_ABSOLUTE_CEILING: u32 = 16;

/// The four recursion ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthCeilings {
    /// Applies to untagged chains.
    pub standard: u32,
    /// Applies to `law-loop` chains without an `emergency` tag.
    pub extended: u32,
    /// Applies to `emergency` chains.
    pub emergency: u32,
    /// Hard cap on every chain regardless of tags.
    pub absolute: u32,
}

impl Default for DepthCeilings {
    fn default() -> Self {
        Self {
            standard: DEFAULT_STANDARD_CEILING,
            extended: DEFAULT_EXTENDED_CEILING,
            emergency: DEFAULT_EMERGENCY_CEILING,
            absolute: DEFAULT_ABSOLUTE_CEILING,
        }
    }
}

impl DepthCeilings {
    /// The absolute ceiling must cap everything; lift it to the tallest
    /// tag ceiling if a config set it lower.
    pub fn normalized(mut self) -> Self {
        self.absolute = self
            .absolute
            .max(self.standard)
            .max(self.extended)
            .max(self.emergency);
        self
    }
}

/// Per-chain recursion counter enforcing tiered depth ceilings.
#[derive(Debug, Clone, Default)]
pub struct DepthGuard {
    ceilings: DepthCeilings,
    depths: HashMap<String, u32>,
}

impl DepthGuard {
    pub fn new(ceilings: DepthCeilings) -> Self {
        Self {
            ceilings: ceilings.normalized(),
            depths: HashMap::new(),
        }
    }

    /// The ceiling selected by a tag set: `emergency` wins over
    /// `law-loop`, which wins over the standard ceiling.
    pub fn applicable_ceiling(&self, tags: &BTreeSet<PatchTag>) -> u32 {
        if tags.contains(&PatchTag::Emergency) {
            self.ceilings.emergency
        } else if tags.contains(&PatchTag::LawLoop) {
            self.ceilings.extended
        } else {
            self.ceilings.standard
        }
    }

    /// Records one recursive hop on `chain` and checks the ceilings.
    ///
    /// Returns the new depth on success. The counter retains the breaching
    /// value on failure so diagnostics see the attempted depth; recovery
    /// is expected to [`release`](Self::release) the chain.
    pub fn ascend(
        &mut self,
        chain: &str,
        tags: &BTreeSet<PatchTag>,
        action: &str,
    ) -> Result<u32, PatchbayError> {
        let depth = self.depths.entry(chain.to_string()).or_insert(0);
        *depth += 1;
        let depth = *depth;

        if depth > self.ceilings.absolute {
            error!(chain, depth, limit = self.ceilings.absolute, action, "absolute depth ceiling breached");
            return Err(PatchbayError::AbsoluteDepthBreached {
                depth,
                limit: self.ceilings.absolute,
                action: action.to_string(),
            });
        }

        let limit = self.applicable_ceiling(tags);
        if depth > limit {
            warn!(chain, depth, limit, action, "depth ceiling exceeded");
            return Err(PatchbayError::DepthLimitExceeded {
                depth,
                limit,
                action: action.to_string(),
            });
        }
        Ok(depth)
    }

    /// Unwinds one hop on `chain`; the counter is dropped at zero.
    pub fn descend(&mut self, chain: &str) {
        if let Some(depth) = self.depths.get_mut(chain) {
            *depth = depth.saturating_sub(1);
            if *depth == 0 {
                self.depths.remove(chain);
            }
        }
    }

    /// Forgets `chain` entirely (end of a logical request).
    pub fn release(&mut self, chain: &str) {
        self.depths.remove(chain);
    }

    /// Current depth of `chain` (0 when untracked).
    pub fn depth_of(&self, chain: &str) -> u32 {
        self.depths.get(chain).copied().unwrap_or(0)
    }
}
