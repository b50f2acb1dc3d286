//! Slot queue notifications.
//!
//! The slot manager is told about every accepted request and container
//! transition so it can keep its own accounting of hot capacity. Hooks are
//! invoked outside the tracker locks, "enter new" first, then "exit old".

use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::state_types::{is_idle_state, ContainerState, RequestState};

/// Receiver of request and container state changes.
pub trait SlotNotifier: Send + Sync {
    fn enter_request_state(&self, state: RequestState);
    fn exit_request_state(&self, state: RequestState);
    fn enter_container_state(&self, state: ContainerState);
    fn exit_container_state(&self, state: ContainerState);
}

/// Per-state standing counts for one slot queue.
///
/// The initial `None` states are counted like any other, so the `None` slot
/// goes negative as entities leave it. Only the occupancy states carry
/// meaning for readers.
#[derive(Debug, Default)]
pub struct SlotStats {
    requests: [AtomicI64; RequestState::MAX],
    containers: [AtomicI64; ContainerState::MAX],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSnapshot {
    pub requests: [i64; RequestState::MAX],
    pub containers: [i64; ContainerState::MAX],
}

impl SlotStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self, state: RequestState) -> i64 {
        self.requests[state.index()].load(Ordering::Acquire)
    }

    pub fn container_count(&self, state: ContainerState) -> i64 {
        self.containers[state.index()].load(Ordering::Acquire)
    }

    /// Containers that are up and not serving anything.
    pub fn idle_containers(&self) -> i64 {
        ContainerState::iter()
            .filter(|s| is_idle_state(*s))
            .map(|s| self.container_count(s))
            .sum()
    }

    pub fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            requests: std::array::from_fn(|i| self.requests[i].load(Ordering::Acquire)),
            containers: std::array::from_fn(|i| self.containers[i].load(Ordering::Acquire)),
        }
    }
}

impl SlotNotifier for SlotStats {
    fn enter_request_state(&self, state: RequestState) {
        self.requests[state.index()].fetch_add(1, Ordering::AcqRel);
    }

    fn exit_request_state(&self, state: RequestState) {
        self.requests[state.index()].fetch_sub(1, Ordering::AcqRel);
    }

    fn enter_container_state(&self, state: ContainerState) {
        self.containers[state.index()].fetch_add(1, Ordering::AcqRel);
    }

    fn exit_container_state(&self, state: ContainerState) {
        self.containers[state.index()].fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit_balances() {
        let stats = SlotStats::new();
        stats.enter_container_state(ContainerState::Idle);
        stats.exit_container_state(ContainerState::Start);
        stats.enter_container_state(ContainerState::Paused);
        stats.exit_container_state(ContainerState::Idle);

        assert_eq!(stats.container_count(ContainerState::Idle), 0);
        assert_eq!(stats.container_count(ContainerState::Paused), 1);
        assert_eq!(stats.container_count(ContainerState::Start), -1);
        assert_eq!(stats.idle_containers(), 1);
    }

    #[test]
    fn test_snapshot() {
        let stats = SlotStats::new();
        stats.enter_request_state(RequestState::Wait);
        stats.exit_request_state(RequestState::None);
        stats.enter_request_state(RequestState::Exec);
        stats.exit_request_state(RequestState::Wait);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, [-1, 0, 1, 0]);
        assert_eq!(snapshot.containers, [0; ContainerState::MAX]);
    }
}
