//! Request lifecycle tracking.
//!
//! A request only moves forward: wait -> exec -> done. Stale and duplicate
//! updates from concurrent observers are dropped without side effects.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use tracing::{debug, trace};

use crate::{slots::SlotNotifier, state_types::RequestState};

#[derive(Debug, Default)]
struct Inner {
    state: RequestState,
    start: Option<Instant>,
}

/// Lifecycle of a single request. State only ever moves forward.
#[derive(Debug, Default)]
pub struct RequestStateTracker {
    inner: Mutex<Inner>,
}

impl RequestStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance to `new_state` if it is ahead of the current state.
    ///
    /// Returns true if this call performed the transition. Stale or
    /// duplicate updates are ignored and produce no notifications.
    pub fn update_state(&self, new_state: RequestState, slots: Option<&dyn SlotNotifier>) -> bool {
        let old_state = {
            let mut inner = self.lock();
            let old_state = inner.state;
            if old_state < new_state {
                inner.state = new_state;
                inner.start = Some(Instant::now());
            }
            old_state
        };

        if old_state >= new_state {
            trace!(current = %old_state, requested = %new_state, "Ignoring request state update");
            return false;
        }

        debug!(from = %old_state, to = %new_state, "Request state changed");

        if let Some(slots) = slots {
            slots.enter_request_state(new_state);
            slots.exit_request_state(old_state);
        }
        true
    }

    pub fn state(&self) -> RequestState {
        self.lock().state
    }

    /// When the current state was entered, or `None` before the first
    /// transition.
    pub fn entered_at(&self) -> Option<Instant> {
        self.lock().start
    }

    pub fn get_state(&self) -> &'static str {
        self.state().as_str()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use strum::IntoEnumIterator;

    use super::*;
    use crate::slots::SlotStats;

    #[test]
    fn test_advances_forward() {
        let tracker = RequestStateTracker::new();
        assert_eq!(tracker.state(), RequestState::None);
        assert!(tracker.entered_at().is_none());

        assert!(tracker.update_state(RequestState::Wait, None));
        assert_eq!(tracker.get_state(), "wait");
        assert!(tracker.update_state(RequestState::Done, None));
        assert_eq!(tracker.state(), RequestState::Done);
    }

    #[test]
    fn test_backward_and_repeated_updates_are_ignored() {
        let tracker = RequestStateTracker::new();
        let slots = SlotStats::new();
        assert!(tracker.update_state(RequestState::Exec, Some(&slots)));
        let entered = tracker.entered_at();

        for state in [RequestState::None, RequestState::Wait, RequestState::Exec] {
            assert!(!tracker.update_state(state, Some(&slots)));
            assert_eq!(tracker.state(), RequestState::Exec);
            assert_eq!(tracker.entered_at(), entered);
        }

        assert_eq!(slots.request_count(RequestState::Exec), 1);
        assert_eq!(slots.request_count(RequestState::Wait), 0);
        assert_eq!(slots.request_count(RequestState::None), -1);
    }

    #[test]
    fn test_monotonic_over_all_sequences() {
        // Every ordered pair of updates: the second only applies if it is
        // strictly ahead of the first.
        for first in RequestState::iter() {
            for second in RequestState::iter() {
                let tracker = RequestStateTracker::new();
                tracker.update_state(first, None);
                let before = tracker.state();
                let accepted = tracker.update_state(second, None);
                assert_eq!(accepted, before < second, "{first} -> {second}");
                assert_eq!(tracker.state(), before.max(second));
            }
        }
    }

    #[test]
    fn test_single_winner_race() {
        const THREADS: usize = 16;

        let tracker = Arc::new(RequestStateTracker::new());
        tracker.update_state(RequestState::Wait, None);
        let slots = Arc::new(SlotStats::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let tracker = tracker.clone();
                let slots = slots.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    tracker.update_state(RequestState::Done, Some(&*slots))
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(slots.request_count(RequestState::Done), 1);
        assert_eq!(slots.request_count(RequestState::Wait), -1);
    }
}
