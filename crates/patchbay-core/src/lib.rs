//! patchbay-core: Soul Patchbay routing core (patch entity, bounded
//! priority queue, deadlock detection, junction merging, depth guarding).
//!
//! Organs exchange patches through the patchbay: producers classify and
//! admit, consumers dequeue and complete. This crate only orders, admits,
//! and hands off work. The organ handlers, the CLI surface, and the
//! checkpoint/recovery collaborators live outside it and talk to the
//! queue through the types re-exported here.

mod config;
mod deadlock;
mod depth;
mod error;
mod handle;
mod junction;
mod patch;
mod priority;
mod queue;
mod tags;

// Patch entity + tag vocabulary + classification
pub use patch::{
    Patch, PatchStatus, META_COLLISION, META_FAILURE_REASON, META_SOURCE_PATCHES,
};
pub use priority::{
    PriorityTier, CRITICAL_INTENSITY, HIGH_INTENSITY, STANDARD_INTENSITY,
};
pub use tags::PatchTag;

// Queue engine + admission signaling + introspection
pub use queue::{Admission, PatchQueue, QueueState, DEFAULT_MAX_SIZE};

// Safety checks over candidate batches
pub use deadlock::{DeadlockDetector, RouteEdge};
pub use junction::JunctionMerger;

// Recursion guarding
pub use depth::{
    DepthCeilings, DepthGuard, DEFAULT_ABSOLUTE_CEILING, DEFAULT_EMERGENCY_CEILING,
    DEFAULT_EXTENDED_CEILING, DEFAULT_STANDARD_CEILING,
};

// Configuration + shared boundary + errors
pub use config::PatchbayConfig;
pub use error::PatchbayError;
pub use handle::SharedPatchbay;
