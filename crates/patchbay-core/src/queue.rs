//! The Soul Patchbay: bounded priority queue with tiered admission
//! control, eviction under overload, destination-collision tracking,
//! maintenance gating, and introspection.
//!
//! ## Ordering
//!
//! Pending patches live in per-tier FIFO buckets. Dequeue order is a
//! strict function of (tier ascending, admission sequence ascending); the
//! sequence counter is the authoritative same-tier tie-break, so two
//! patches admitted within the same wall-clock millisecond still have a
//! total order.
//!
//! ## Ownership
//!
//! The queue owns a patch while it is pending. Ownership transfers to the
//! consumer on dequeue; the consumer ends the lifecycle through
//! [`complete_route`](PatchQueue::complete_route) or
//! [`fail_route`](PatchQueue::fail_route). A patch evicted under overload
//! is discarded outright and never reaches a consumer: after any
//! `enqueue` call, a previously admitted lower-priority patch may have
//! vanished.
//!
//! All cumulative counters (`total_processed`, `collision_count`,
//! `deadlock_count`) are mutated only inside this type, so a concurrent
//! port needs exactly one synchronization boundary (see
//! [`SharedPatchbay`](crate::SharedPatchbay)).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PatchbayConfig;
use crate::deadlock::{DeadlockDetector, RouteEdge};
use crate::error::PatchbayError;
use crate::patch::{Patch, PatchStatus, META_COLLISION, META_FAILURE_REASON};
use crate::priority::PriorityTier;

/// Default pending capacity.
pub const DEFAULT_MAX_SIZE: usize = 64;

/// Outcome of an admission attempt. One deterministic value instead of a
/// boolean/exception mix: callers branch here, and only genuinely
/// exceptional overload (no victim, non-Background incoming) raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// Admitted with free capacity.
    Admitted,
    /// Admitted by evicting the named lower-priority pending patch.
    AdmittedWithEviction { victim: Uuid },
    /// Rejected because the maintenance gate is closed. Ordinary state,
    /// not a failure.
    RejectedMaintenance,
    /// Rejected: queue full and the incoming patch is itself Background.
    RejectedCapacity,
}

impl Admission {
    /// True when the patch entered the pending set.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted | Self::AdmittedWithEviction { .. })
    }
}

/// Immutable snapshot of queue state for status/telemetry surfaces and
/// the external checkpoint collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    pub pending: usize,
    pub max_size: usize,
    pub total_processed: u64,
    pub collision_count: u64,
    pub deadlock_count: u64,
    pub maintenance_mode: bool,
    /// Pending count per tier (every tier present, zeros included).
    pub by_tier: BTreeMap<PriorityTier, usize>,
}

/// The bounded priority routing queue.
#[derive(Debug)]
pub struct PatchQueue {
    /// Per-tier FIFO buckets; within a bucket, admission order equals
    /// sequence order.
    buckets: BTreeMap<PriorityTier, VecDeque<Patch>>,
    /// destination -> pending patch ids; used only for collision
    /// detection.
    pending_by_destination: HashMap<String, Vec<Uuid>>,
    /// (source, destination) pairs dequeued but not yet completed or
    /// failed.
    active_routes: HashSet<(String, String)>,
    max_size: usize,
    collision_tracking: bool,
    next_sequence: u64,
    total_processed: u64,
    collision_count: u64,
    deadlock_count: u64,
    maintenance_mode: bool,
}

impl PatchQueue {
    /// A queue with the given capacity and collision tracking on.
    pub fn new(max_size: usize) -> Self {
        Self {
            buckets: BTreeMap::new(),
            pending_by_destination: HashMap::new(),
            active_routes: HashSet::new(),
            max_size: max_size.max(1),
            collision_tracking: true,
            next_sequence: 0,
            total_processed: 0,
            collision_count: 0,
            deadlock_count: 0,
            maintenance_mode: false,
        }
    }

    /// A queue tuned by a [`PatchbayConfig`].
    pub fn from_config(config: &PatchbayConfig) -> Self {
        let mut queue = Self::new(config.max_size);
        queue.collision_tracking = config.collision_tracking;
        queue
    }

    /// Number of pending patches.
    pub fn len(&self) -> usize {
        self.buckets.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(VecDeque::is_empty)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // -----------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------

    /// Admits a patch, applying maintenance gating, then capacity and
    /// eviction policy, then collision tracking.
    ///
    /// Raises [`PatchbayError::CapacityExceeded`] only when the queue is
    /// full, no strictly lower-priority victim exists, and the incoming
    /// patch is above the Background tier.
    pub fn enqueue(&mut self, mut patch: Patch) -> Result<Admission, PatchbayError> {
        if self.maintenance_mode {
            debug!(patch = %patch.id, "admission refused: maintenance gate closed");
            return Ok(Admission::RejectedMaintenance);
        }

        let mut evicted = None;
        if self.len() >= self.max_size {
            match self.evict_below(patch.priority()) {
                Some(victim) => evicted = Some(victim),
                None if patch.priority() == PriorityTier::Background => {
                    debug!(patch = %patch.id, "background patch refused at capacity");
                    return Ok(Admission::RejectedCapacity);
                }
                None => {
                    return Err(PatchbayError::CapacityExceeded {
                        current: self.len(),
                        max: self.max_size,
                    });
                }
            }
        }

        patch.sequence = self.next_sequence;
        self.next_sequence += 1;
        patch.enqueued_at = Utc::now();
        patch.status = PatchStatus::Pending;

        if self.collision_tracking {
            let colliding = self
                .pending_by_destination
                .get(&patch.destination_node)
                .is_some_and(|ids| !ids.is_empty());
            if colliding {
                self.collision_count += 1;
                patch
                    .metadata
                    .insert(META_COLLISION.to_string(), json!(true));
                debug!(
                    destination = %patch.destination_node,
                    patch = %patch.id,
                    "destination collision recorded"
                );
            }
        }

        self.pending_by_destination
            .entry(patch.destination_node.clone())
            .or_default()
            .push(patch.id);

        debug!(
            patch = %patch.id,
            tier = %patch.priority(),
            sequence = patch.sequence,
            "patch admitted"
        );
        self.buckets
            .entry(patch.priority())
            .or_default()
            .push_back(patch);

        Ok(match evicted {
            Some(victim) => Admission::AdmittedWithEviction { victim },
            None => Admission::Admitted,
        })
    }

    /// Evicts the single lowest-priority pending patch, provided its tier
    /// is strictly lower than `incoming`. Ties within the victim tier are
    /// broken by latest admission (highest sequence). Returns the
    /// victim's id.
    fn evict_below(&mut self, incoming: PriorityTier) -> Option<Uuid> {
        let victim_tier = self
            .buckets
            .iter()
            .rev()
            .find(|(_, bucket)| !bucket.is_empty())
            .map(|(tier, _)| *tier)
            .filter(|tier| *tier > incoming)?;

        let victim = self
            .buckets
            .get_mut(&victim_tier)
            .and_then(VecDeque::pop_back)?;
        self.unindex_destination(&victim);
        warn!(
            victim = %victim.id,
            tier = %victim_tier,
            "pending patch evicted for a higher-priority admission"
        );
        Some(victim.id)
    }

    // -----------------------------------------------------------------
    // Retrieval & lifecycle
    // -----------------------------------------------------------------

    /// Removes and returns the next patch by (tier, sequence) order, or
    /// `None` during maintenance mode or when nothing is pending. The
    /// returned patch's route is held active until
    /// [`complete_route`](Self::complete_route) or
    /// [`fail_route`](Self::fail_route).
    pub fn dequeue(&mut self) -> Option<Patch> {
        if self.maintenance_mode {
            return None;
        }
        let tier = self
            .buckets
            .iter()
            .find(|(_, bucket)| !bucket.is_empty())
            .map(|(tier, _)| *tier)?;
        let mut patch = self.buckets.get_mut(&tier).and_then(VecDeque::pop_front)?;

        self.unindex_destination(&patch);
        patch.status = PatchStatus::Active;
        self.active_routes.insert(patch.route());
        debug!(patch = %patch.id, tier = %tier, "patch dequeued; route active");
        Some(patch)
    }

    /// Inspects the next-to-dequeue patch without removing it.
    pub fn peek_next(&self) -> Option<&Patch> {
        self.buckets
            .values()
            .find(|bucket| !bucket.is_empty())
            .and_then(VecDeque::front)
    }

    /// Marks a dequeued patch completed: its route leaves the active set,
    /// `processed_at` is stamped, and `total_processed` increments.
    /// Calling this for a route that is not active is a no-op on the
    /// active set and the counter, so defensive double-completion is
    /// safe.
    pub fn complete_route(&mut self, patch: &mut Patch) {
        let was_active = self.active_routes.remove(&patch.route());
        patch.status = PatchStatus::Completed;
        patch.processed_at = Some(Utc::now());
        if was_active {
            self.total_processed += 1;
        }
        debug!(patch = %patch.id, was_active, "route completed");
    }

    /// Marks a dequeued patch failed with a reason; its route leaves the
    /// active set. `total_processed` is untouched.
    pub fn fail_route(&mut self, patch: &mut Patch, reason: &str) {
        self.active_routes.remove(&patch.route());
        patch.status = PatchStatus::Failed;
        patch
            .metadata
            .insert(META_FAILURE_REASON.to_string(), json!(reason));
        warn!(patch = %patch.id, reason, "route failed");
    }

    /// True while the (source, destination) pair of a dequeued patch has
    /// not yet been completed or failed.
    pub fn is_route_active(&self, source: &str, destination: &str) -> bool {
        self.active_routes
            .contains(&(source.to_string(), destination.to_string()))
    }

    // -----------------------------------------------------------------
    // Deadlock checks (counter lives behind this boundary)
    // -----------------------------------------------------------------

    /// Runs cycle detection over a candidate batch; increments the
    /// `deadlock_count` side-counter when a cycle is found. Never raises.
    pub fn check_deadlock(&mut self, edges: &[RouteEdge]) -> bool {
        let cyclic = DeadlockDetector::detect(edges);
        if cyclic {
            self.deadlock_count += 1;
            warn!(edges = edges.len(), "cyclic routing batch detected");
        }
        cyclic
    }

    /// Like [`check_deadlock`](Self::check_deadlock) but raises
    /// [`PatchbayError::DeadlockDetected`] carrying the cyclic path.
    pub fn check_deadlock_or_raise(&mut self, edges: &[RouteEdge]) -> Result<(), PatchbayError> {
        match DeadlockDetector::find_cycle(edges) {
            Some(cycle) => {
                self.deadlock_count += 1;
                warn!(cycle = ?cycle, "cyclic routing batch detected");
                Err(PatchbayError::DeadlockDetected { cycle })
            }
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------
    // Maintenance gate
    // -----------------------------------------------------------------

    /// Closes the gate: every `enqueue` returns `RejectedMaintenance` and
    /// every `dequeue` returns `None` until the gate reopens.
    pub fn enter_maintenance(&mut self) {
        if !self.maintenance_mode {
            info!("patchbay entering maintenance mode");
        }
        self.maintenance_mode = true;
    }

    /// Reopens the gate; admission and retrieval resume immediately.
    pub fn exit_maintenance(&mut self) {
        if self.maintenance_mode {
            info!("patchbay leaving maintenance mode");
        }
        self.maintenance_mode = false;
    }

    pub fn is_in_maintenance(&self) -> bool {
        self.maintenance_mode
    }

    // -----------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------

    /// Immutable snapshot of the queue's scalar state and per-tier
    /// pending counts.
    pub fn queue_state(&self) -> QueueState {
        let by_tier = PriorityTier::ALL
            .iter()
            .map(|tier| {
                (
                    *tier,
                    self.buckets.get(tier).map_or(0, VecDeque::len),
                )
            })
            .collect();
        QueueState {
            pending: self.len(),
            max_size: self.max_size,
            total_processed: self.total_processed,
            collision_count: self.collision_count,
            deadlock_count: self.deadlock_count,
            maintenance_mode: self.maintenance_mode,
            by_tier,
        }
    }

    /// All pending patches, cloned, in dequeue order.
    pub fn to_list(&self) -> Vec<Patch> {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.iter().cloned())
            .collect()
    }

    /// Pending patches of one tier, in dequeue order.
    pub fn get_by_priority(&self, tier: PriorityTier) -> Vec<Patch> {
        self.buckets
            .get(&tier)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Pending patches aimed at one destination, in dequeue order.
    pub fn get_by_destination(&self, destination: &str) -> Vec<Patch> {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.iter())
            .filter(|patch| patch.destination_node == destination)
            .cloned()
            .collect()
    }

    /// Purges the pending set, the destination index, and the active
    /// route set. Cumulative counters (`total_processed`,
    /// `collision_count`, `deadlock_count`) are lifetime telemetry and
    /// are preserved.
    pub fn clear(&mut self) {
        let dropped = self.len();
        self.buckets.clear();
        self.pending_by_destination.clear();
        self.active_routes.clear();
        info!(dropped, "patchbay cleared");
    }

    /// Re-admits a snapshot payload (e.g. `to_list()` output persisted by
    /// the checkpoint collaborator) inside a maintenance window.
    ///
    /// Patches are re-sequenced in the given order with their classified
    /// priorities intact. This is reconstruction, not fresh admission:
    /// the maintenance gate and collision marking are bypassed, but
    /// capacity is still enforced.
    pub fn restore_pending(&mut self, patches: Vec<Patch>) -> Result<usize, PatchbayError> {
        if self.len() + patches.len() > self.max_size {
            return Err(PatchbayError::CapacityExceeded {
                current: self.len() + patches.len(),
                max: self.max_size,
            });
        }
        let restored = patches.len();
        for mut patch in patches {
            patch.sequence = self.next_sequence;
            self.next_sequence += 1;
            patch.status = PatchStatus::Pending;
            self.pending_by_destination
                .entry(patch.destination_node.clone())
                .or_default()
                .push(patch.id);
            self.buckets
                .entry(patch.priority())
                .or_default()
                .push_back(patch);
        }
        info!(restored, "pending patches restored from snapshot");
        Ok(restored)
    }

    fn unindex_destination(&mut self, patch: &Patch) {
        if let Some(ids) = self.pending_by_destination.get_mut(&patch.destination_node) {
            ids.retain(|id| *id != patch.id);
            if ids.is_empty() {
                self.pending_by_destination.remove(&patch.destination_node);
            }
        }
    }
}

impl Default for PatchQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_background(queue: &mut PatchQueue, n: usize) {
        for i in 0..n {
            let admitted = queue
                .enqueue(Patch::direct(format!("organ-{i}"), format!("dest-{i}"), 10))
                .unwrap();
            assert!(admitted.is_admitted());
        }
    }

    #[test]
    fn test_dequeue_strict_priority_order() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("a", "x", 10)).unwrap(); // background
        queue.enqueue(Patch::direct("b", "y", 95)).unwrap(); // critical
        queue.enqueue(Patch::direct("c", "z", 60)).unwrap(); // standard
        queue.enqueue(Patch::direct("d", "w", 75)).unwrap(); // high

        let order: Vec<String> = std::iter::from_fn(|| queue.dequeue())
            .map(|p| p.source_node)
            .collect();
        assert_eq!(order, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_same_tier_fifo_by_sequence() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("first", "x", 60)).unwrap();
        queue.enqueue(Patch::direct("second", "y", 60)).unwrap();
        queue.enqueue(Patch::direct("third", "z", 60)).unwrap();

        assert_eq!(queue.dequeue().unwrap().source_node, "first");
        assert_eq!(queue.dequeue().unwrap().source_node, "second");
        assert_eq!(queue.dequeue().unwrap().source_node, "third");
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut queue = PatchQueue::new(3);
        fill_background(&mut queue, 3);
        for intensity in [10, 60, 95] {
            let _ = queue.enqueue(Patch::direct("s", "d", intensity));
            assert!(queue.len() <= 3);
        }
    }

    #[test]
    fn test_full_queue_evicts_latest_of_lowest_tier() {
        let mut queue = PatchQueue::new(2);
        queue.enqueue(Patch::direct("old-bg", "x", 10)).unwrap();
        let newer = Patch::direct("new-bg", "y", 10);
        let newer_id = newer.id;
        queue.enqueue(newer).unwrap();

        let admission = queue.enqueue(Patch::direct("urgent", "z", 95)).unwrap();
        assert_eq!(
            admission,
            Admission::AdmittedWithEviction { victim: newer_id }
        );
        assert_eq!(queue.len(), 2);
        // The earlier background patch survives.
        let remaining: Vec<String> = queue.to_list().into_iter().map(|p| p.source_node).collect();
        assert!(remaining.contains(&"old-bg".to_string()));
        assert!(!remaining.contains(&"new-bg".to_string()));
    }

    #[test]
    fn test_full_critical_queue_raises_for_critical_incoming() {
        let mut queue = PatchQueue::new(2);
        queue.enqueue(Patch::direct("a", "x", 95)).unwrap();
        queue.enqueue(Patch::direct("b", "y", 95)).unwrap();

        let err = queue.enqueue(Patch::direct("c", "z", 95)).unwrap_err();
        assert!(matches!(
            err,
            PatchbayError::CapacityExceeded { current: 2, max: 2 }
        ));
    }

    #[test]
    fn test_full_queue_background_incoming_rejected_gracefully() {
        let mut queue = PatchQueue::new(2);
        queue.enqueue(Patch::direct("a", "x", 10)).unwrap();
        queue.enqueue(Patch::direct("b", "y", 10)).unwrap();

        let admission = queue.enqueue(Patch::direct("c", "z", 10)).unwrap();
        assert_eq!(admission, Admission::RejectedCapacity);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_collision_marks_later_patch_and_counts() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("heart", "throat", 50)).unwrap();
        queue.enqueue(Patch::direct("spleen", "throat", 50)).unwrap();

        let state = queue.queue_state();
        assert_eq!(state.collision_count, 1);
        assert_eq!(state.pending, 2);

        let by_dest = queue.get_by_destination("throat");
        assert_eq!(by_dest.len(), 2);
        // The earlier patch is untouched; the later one carries the marker.
        assert!(!by_dest[0].collision_detected());
        assert!(by_dest[1].collision_detected());
    }

    #[test]
    fn test_collision_cleared_after_dequeue() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("heart", "throat", 50)).unwrap();
        let _ = queue.dequeue();
        // Destination index entry was removed with the dequeue.
        queue.enqueue(Patch::direct("spleen", "throat", 50)).unwrap();
        assert_eq!(queue.queue_state().collision_count, 0);
    }

    #[test]
    fn test_maintenance_gates_enqueue_and_dequeue() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("a", "x", 60)).unwrap();

        queue.enter_maintenance();
        assert_eq!(
            queue.enqueue(Patch::direct("b", "y", 95)).unwrap(),
            Admission::RejectedMaintenance
        );
        assert!(queue.dequeue().is_none());
        assert_eq!(queue.len(), 1);

        queue.exit_maintenance();
        assert!(queue.enqueue(Patch::direct("b", "y", 95)).unwrap().is_admitted());
        assert_eq!(queue.dequeue().unwrap().source_node, "b");
    }

    #[test]
    fn test_route_lifecycle_and_total_processed() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("heart", "lungs", 60)).unwrap();
        let mut patch = queue.dequeue().unwrap();
        assert!(queue.is_route_active("heart", "lungs"));
        assert_eq!(patch.status, PatchStatus::Active);

        queue.complete_route(&mut patch);
        assert!(!queue.is_route_active("heart", "lungs"));
        assert_eq!(patch.status, PatchStatus::Completed);
        assert!(patch.processed_at.is_some());
        assert_eq!(queue.queue_state().total_processed, 1);

        // Defensive second completion: no-op on the counter.
        queue.complete_route(&mut patch);
        assert_eq!(queue.queue_state().total_processed, 1);
    }

    #[test]
    fn test_fail_route_records_reason_without_counting() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("heart", "lungs", 60)).unwrap();
        let mut patch = queue.dequeue().unwrap();

        queue.fail_route(&mut patch, "organ unresponsive");
        assert_eq!(patch.status, PatchStatus::Failed);
        assert_eq!(
            patch.metadata.get(META_FAILURE_REASON),
            Some(&json!("organ unresponsive"))
        );
        assert!(!queue.is_route_active("heart", "lungs"));
        assert_eq!(queue.queue_state().total_processed, 0);
    }

    #[test]
    fn test_check_deadlock_counts_only_cycles() {
        let mut queue = PatchQueue::new(8);
        assert!(!queue.check_deadlock(&[RouteEdge::new("a", "b"), RouteEdge::new("b", "c")]));
        assert_eq!(queue.queue_state().deadlock_count, 0);

        assert!(queue.check_deadlock(&[RouteEdge::new("a", "b"), RouteEdge::new("b", "a")]));
        assert_eq!(queue.queue_state().deadlock_count, 1);

        let err = queue
            .check_deadlock_or_raise(&[RouteEdge::new("x", "y"), RouteEdge::new("y", "x")])
            .unwrap_err();
        assert!(matches!(err, PatchbayError::DeadlockDetected { .. }));
        assert_eq!(queue.queue_state().deadlock_count, 2);
    }

    #[test]
    fn test_queue_state_by_tier_includes_zeros() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("a", "x", 95)).unwrap();
        let state = queue.queue_state();
        assert_eq!(state.by_tier[&PriorityTier::Critical], 1);
        assert_eq!(state.by_tier[&PriorityTier::Background], 0);
        assert_eq!(state.by_tier.len(), 4);
    }

    #[test]
    fn test_peek_next_does_not_remove() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("a", "x", 60)).unwrap();
        assert_eq!(queue.peek_next().unwrap().source_node, "a");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_preserves_cumulative_counters() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("a", "throat", 60)).unwrap();
        queue.enqueue(Patch::direct("b", "throat", 60)).unwrap();
        let mut patch = queue.dequeue().unwrap();
        queue.complete_route(&mut patch);
        queue.check_deadlock(&[RouteEdge::new("p", "q"), RouteEdge::new("q", "p")]);

        queue.clear();
        let state = queue.queue_state();
        assert_eq!(state.pending, 0);
        assert_eq!(queue.get_by_destination("throat").len(), 0);
        assert_eq!(state.total_processed, 1);
        assert_eq!(state.collision_count, 1);
        assert_eq!(state.deadlock_count, 1);
    }

    #[test]
    fn test_restore_pending_round_trip() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("a", "x", 95)).unwrap();
        queue.enqueue(Patch::direct("b", "y", 10)).unwrap();

        queue.enter_maintenance();
        let snapshot = queue.to_list();
        queue.clear();
        assert_eq!(queue.restore_pending(snapshot).unwrap(), 2);
        queue.exit_maintenance();

        assert_eq!(queue.dequeue().unwrap().source_node, "a");
        assert_eq!(queue.dequeue().unwrap().source_node, "b");
    }

    #[test]
    fn test_restore_pending_enforces_capacity() {
        let mut queue = PatchQueue::new(1);
        let snapshot = vec![Patch::direct("a", "x", 10), Patch::direct("b", "y", 10)];
        assert!(matches!(
            queue.restore_pending(snapshot),
            Err(PatchbayError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_collision_tracking_disabled_by_config() {
        let config = PatchbayConfig {
            collision_tracking: false,
            ..PatchbayConfig::default()
        };
        let mut queue = PatchQueue::from_config(&config);
        queue.enqueue(Patch::direct("a", "throat", 50)).unwrap();
        queue.enqueue(Patch::direct("b", "throat", 50)).unwrap();
        assert_eq!(queue.queue_state().collision_count, 0);
    }

    #[test]
    fn test_get_by_priority_filters_without_mutating() {
        let mut queue = PatchQueue::new(8);
        queue.enqueue(Patch::direct("a", "x", 95)).unwrap();
        queue.enqueue(Patch::direct("b", "y", 10)).unwrap();
        let critical = queue.get_by_priority(PriorityTier::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].source_node, "a");
        assert_eq!(queue.len(), 2);
    }
}
