/// Image readiness tracking
///
/// Every image slot of every loaded item races three outcomes: the image
/// loads, the image fails, or the timeout fires. Whichever arrives first
/// settles the slot; everything after that is a no-op. Consumers only ever
/// see a boolean "ready" - the reason is kept for logging.

use std::cell::OnceCell;
use std::collections::HashMap;

use tracing::{debug, trace};

use super::data::{Generation, ImageSlotKey};

/// How long a slot may stay unsettled before the spinner is dismissed
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 5000;

/// A cancellable pending timer
pub trait TimerHandle {
    fn cancel(&self);
}

impl TimerHandle for iced::futures::future::AbortHandle {
    fn cancel(&self) {
        self.abort();
    }
}

/// Why a slot stopped waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Loaded,
    Failed,
    TimedOut,
}

/// Settlement table for one view activation
///
/// Each tracked slot owns a set-once cell; the first `settle` call for a
/// key wins. Pending timeout timers live in a table keyed the same way and
/// are cancelled as soon as their slot settles or the view is torn down.
pub struct ReadinessTracker<H: TimerHandle> {
    generation: Generation,
    slots: HashMap<ImageSlotKey, OnceCell<Settlement>>,
    timers: HashMap<ImageSlotKey, H>,
}

impl<H: TimerHandle> ReadinessTracker<H> {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            slots: HashMap::new(),
            timers: HashMap::new(),
        }
    }

    /// Start a fresh load cycle: cancel timers and forget every slot
    pub fn reset(&mut self, generation: Generation) {
        self.cancel_all();
        self.slots.clear();
        self.generation = generation;
    }

    /// Register a slot as pending. Returns false if it was already tracked.
    pub fn track(&mut self, key: ImageSlotKey) -> bool {
        if self.slots.contains_key(&key) {
            return false;
        }
        self.slots.insert(key, OnceCell::new());
        true
    }

    /// Attach the timeout timer of a tracked slot
    ///
    /// A timer for a slot that is unknown or already settled is cancelled
    /// right away instead of being stored.
    pub fn arm(&mut self, key: ImageSlotKey, handle: H) {
        let pending = self
            .slots
            .get(&key)
            .map(|cell| cell.get().is_none())
            .unwrap_or(false);

        if !pending {
            handle.cancel();
            return;
        }

        if let Some(previous) = self.timers.insert(key, handle) {
            previous.cancel();
        }
    }

    /// Record the outcome of a slot
    ///
    /// Returns true only for the call that actually settled the slot.
    /// Calls from another generation, for untracked keys, or for slots
    /// that are already settled change nothing.
    pub fn settle(
        &mut self,
        generation: Generation,
        key: &ImageSlotKey,
        settlement: Settlement,
    ) -> bool {
        if generation != self.generation {
            trace!(%generation, current = %self.generation, slot = %key, "Ignoring stale settlement");
            return false;
        }

        let Some(cell) = self.slots.get(key) else {
            trace!(slot = %key, "Ignoring settlement for untracked slot");
            return false;
        };

        if cell.set(settlement).is_err() {
            trace!(slot = %key, ?settlement, "Slot already settled");
            return false;
        }

        if let Some(timer) = self.timers.remove(key) {
            // Firing timers settle through here too; aborting a finished task is harmless
            timer.cancel();
        }

        debug!(slot = %key, ?settlement, "Image slot settled");
        true
    }

    /// True once the slot has settled, for whatever reason
    pub fn is_ready(&self, key: &ImageSlotKey) -> bool {
        self.slots
            .get(key)
            .map(|cell| cell.get().is_some())
            .unwrap_or(false)
    }

    pub fn tracked_count(&self) -> usize {
        self.slots.len()
    }

    pub fn settled_count(&self) -> usize {
        self.slots.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Tear down the activation: cancel all pending timers and drop state.
    /// Returns how many timers were cancelled.
    pub fn teardown(&mut self) -> usize {
        let cancelled = self.cancel_all();
        self.slots.clear();
        cancelled
    }

    fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        for (_, timer) in self.timers.drain() {
            timer.cancel();
        }
        count
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Timer handle that records whether it was cancelled
    #[derive(Clone, Default)]
    pub struct FakeTimer {
        cancelled: Rc<Cell<bool>>,
    }

    impl FakeTimer {
        pub fn is_cancelled(&self) -> bool {
            self.cancelled.get()
        }
    }

    impl TimerHandle for FakeTimer {
        fn cancel(&self) {
            self.cancelled.set(true);
        }
    }

    fn key(item: &str, slot: &str) -> ImageSlotKey {
        ImageSlotKey::new(item, slot)
    }

    #[test]
    fn test_untracked_slot_is_not_ready() {
        let tracker: ReadinessTracker<FakeTimer> = ReadinessTracker::new(Generation(1));
        assert!(!tracker.is_ready(&key("1", "img1")));
    }

    #[test]
    fn test_load_settles_and_cancels_timer() {
        let generation = Generation(1);
        let mut tracker = ReadinessTracker::new(generation);
        let timer = FakeTimer::default();

        tracker.track(key("1", "img1"));
        tracker.arm(key("1", "img1"), timer.clone());
        assert!(!tracker.is_ready(&key("1", "img1")));
        assert_eq!(tracker.pending_timers(), 1);

        assert!(tracker.settle(generation, &key("1", "img1"), Settlement::Loaded));
        assert!(tracker.is_ready(&key("1", "img1")));
        assert!(timer.is_cancelled());
        assert_eq!(tracker.pending_timers(), 0);
    }

    #[test]
    fn test_first_settlement_wins() {
        let generation = Generation(3);
        let mut tracker: ReadinessTracker<FakeTimer> = ReadinessTracker::new(generation);
        tracker.track(key("1", "img2"));

        assert!(tracker.settle(generation, &key("1", "img2"), Settlement::TimedOut));
        // The load finishing later changes nothing
        assert!(!tracker.settle(generation, &key("1", "img2"), Settlement::Loaded));
        assert!(!tracker.settle(generation, &key("1", "img2"), Settlement::Failed));
        assert!(tracker.is_ready(&key("1", "img2")));
        assert_eq!(tracker.settled_count(), 1);
    }

    #[test]
    fn test_failure_counts_as_ready() {
        let generation = Generation(1);
        let mut tracker: ReadinessTracker<FakeTimer> = ReadinessTracker::new(generation);
        tracker.track(key("9", "img1"));
        assert!(tracker.settle(generation, &key("9", "img1"), Settlement::Failed));
        assert!(tracker.is_ready(&key("9", "img1")));
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut tracker: ReadinessTracker<FakeTimer> = ReadinessTracker::new(Generation(1));
        tracker.track(key("1", "img1"));
        tracker.reset(Generation(2));
        tracker.track(key("1", "img1"));

        assert!(!tracker.settle(Generation(1), &key("1", "img1"), Settlement::Loaded));
        assert!(!tracker.is_ready(&key("1", "img1")));
    }

    #[test]
    fn test_settling_unknown_slot_is_noop() {
        let generation = Generation(1);
        let mut tracker: ReadinessTracker<FakeTimer> = ReadinessTracker::new(generation);
        assert!(!tracker.settle(generation, &key("ghost", "img1"), Settlement::Loaded));
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn test_arming_settled_slot_cancels_immediately() {
        let generation = Generation(1);
        let mut tracker = ReadinessTracker::new(generation);
        tracker.track(key("1", "img1"));
        tracker.settle(generation, &key("1", "img1"), Settlement::Loaded);

        let timer = FakeTimer::default();
        tracker.arm(key("1", "img1"), timer.clone());
        assert!(timer.is_cancelled());
        assert_eq!(tracker.pending_timers(), 0);
    }

    #[test]
    fn test_teardown_cancels_pending_timers() {
        let generation = Generation(1);
        let mut tracker = ReadinessTracker::new(generation);
        let timers: Vec<FakeTimer> = (0..3).map(|_| FakeTimer::default()).collect();

        for (i, timer) in timers.iter().enumerate() {
            let slot_key = key(&i.to_string(), "img1");
            tracker.track(slot_key.clone());
            tracker.arm(slot_key, timer.clone());
        }
        tracker.settle(generation, &key("0", "img1"), Settlement::Loaded);

        assert_eq!(tracker.teardown(), 2);
        assert!(timers.iter().all(FakeTimer::is_cancelled));
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn test_settlement_is_monotonic_under_any_order() {
        let generation = Generation(1);
        let mut tracker: ReadinessTracker<FakeTimer> = ReadinessTracker::new(generation);
        let keys: Vec<ImageSlotKey> = (0..4).map(|i| key(&i.to_string(), "img1")).collect();
        for k in &keys {
            tracker.track(k.clone());
        }

        // Out of submission order
        for k in keys.iter().rev() {
            tracker.settle(generation, k, Settlement::Loaded);
            assert!(tracker.is_ready(k));
        }
        for k in &keys {
            tracker.settle(generation, k, Settlement::TimedOut);
            assert!(tracker.is_ready(k));
        }
        assert_eq!(tracker.settled_count(), keys.len());
    }
}
