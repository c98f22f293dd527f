//! Patchbay error taxonomy.
//!
//! Ordinary negative outcomes (maintenance rejection, Background-tier
//! overflow) are **not** errors; they are [`Admission`](crate::Admission)
//! values. Everything here is surfaced to the immediate caller; the core
//! never retries internally and never swallows an exceptional condition.

use thiserror::Error;

/// Errors raised by the Soul Patchbay core.
#[derive(Debug, Clone, Error)]
pub enum PatchbayError {
    /// The queue is full and no lower-priority patch exists to evict.
    /// Only raised for incoming patches above the Background tier.
    #[error("patchbay at capacity ({current}/{max}) with no lower-priority patch to evict")]
    CapacityExceeded { current: usize, max: usize },

    /// A cyclic routing chain was found in a candidate batch of edges.
    /// Carries the closed walk, e.g. `["heart", "lungs", "heart"]`.
    #[error("cyclic routing detected: {}", .cycle.join(" -> "))]
    DeadlockDetected { cycle: Vec<String> },

    /// A routing chain climbed past its applicable (tag-selected) ceiling.
    #[error("routing depth {depth} exceeds ceiling {limit} during '{action}'")]
    DepthLimitExceeded { depth: u32, limit: u32, action: String },

    /// The absolute ceiling was breached. Unrecoverable at this layer;
    /// expected to propagate toward emergency halt handling.
    #[error("routing depth {depth} breached the absolute ceiling {limit} during '{action}'")]
    AbsoluteDepthBreached { depth: u32, limit: u32, action: String },

    /// `create_junction` was called with no source patches. Programmer
    /// error; fatal to the call, not locally recoverable.
    #[error("junction requires at least one source patch")]
    EmptyJunction,

    /// A custom tag failed boundary validation.
    #[error("invalid custom tag '{raw}': lowercase alphanumeric with '-'/'_', 1-32 chars")]
    InvalidTag { raw: String },

    /// The shared queue lock was poisoned by a panicking holder.
    #[error("patchbay lock poisoned by a panicked holder")]
    QueuePoisoned,

    /// Configuration could not be read or written.
    #[error("patchbay configuration error: {0}")]
    Config(String),
}
