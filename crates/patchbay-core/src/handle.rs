//! Shared handle: the single mutual-exclusion boundary for concurrent
//! dispatchers.
//!
//! The queue itself has no internal locking; it assumes one logical
//! owner. Dispatchers that run on multiple threads clone a
//! [`SharedPatchbay`] instead; every operation takes the one lock, so
//! ordering, capacity, and counter invariants hold exactly as in the
//! single-owner case.

use std::sync::{Arc, Mutex};

use crate::config::PatchbayConfig;
use crate::deadlock::RouteEdge;
use crate::error::PatchbayError;
use crate::patch::Patch;
use crate::queue::{Admission, PatchQueue, QueueState};

/// Cloneable handle over one [`PatchQueue`].
#[derive(Debug, Clone)]
pub struct SharedPatchbay {
    inner: Arc<Mutex<PatchQueue>>,
}

impl SharedPatchbay {
    pub fn new(queue: PatchQueue) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
        }
    }

    pub fn from_config(config: &PatchbayConfig) -> Self {
        Self::new(PatchQueue::from_config(config))
    }

    /// Runs a closure under the queue lock. All other methods are
    /// conveniences over this.
    pub fn with_queue<T>(
        &self,
        f: impl FnOnce(&mut PatchQueue) -> T,
    ) -> Result<T, PatchbayError> {
        let mut guard = self.inner.lock().map_err(|_| PatchbayError::QueuePoisoned)?;
        Ok(f(&mut guard))
    }

    pub fn enqueue(&self, patch: Patch) -> Result<Admission, PatchbayError> {
        self.with_queue(|queue| queue.enqueue(patch))?
    }

    pub fn dequeue(&self) -> Result<Option<Patch>, PatchbayError> {
        self.with_queue(PatchQueue::dequeue)
    }

    pub fn complete_route(&self, patch: &mut Patch) -> Result<(), PatchbayError> {
        self.with_queue(|queue| queue.complete_route(patch))
    }

    pub fn fail_route(&self, patch: &mut Patch, reason: &str) -> Result<(), PatchbayError> {
        self.with_queue(|queue| queue.fail_route(patch, reason))
    }

    pub fn check_deadlock(&self, edges: &[RouteEdge]) -> Result<bool, PatchbayError> {
        self.with_queue(|queue| queue.check_deadlock(edges))
    }

    pub fn enter_maintenance(&self) -> Result<(), PatchbayError> {
        self.with_queue(PatchQueue::enter_maintenance)
    }

    pub fn exit_maintenance(&self) -> Result<(), PatchbayError> {
        self.with_queue(PatchQueue::exit_maintenance)
    }

    pub fn queue_state(&self) -> Result<QueueState, PatchbayError> {
        self.with_queue(|queue| queue.queue_state())
    }
}

impl Default for SharedPatchbay {
    fn default() -> Self {
        Self::new(PatchQueue::default())
    }
}
