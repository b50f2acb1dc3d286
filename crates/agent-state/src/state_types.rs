//! Lifecycle states for requests and containers.
//!
//! Both enums are ordered: declaration order is the integer tag, and the
//! trackers rely on `Ord` to decide whether a transition moves forward.
//! Per-state metric keys live in static tables indexed by that tag.

use serde::Serialize;
use strum::{EnumCount, EnumIter, FromRepr};

/// Lifecycle state of an inbound request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    EnumCount,
    EnumIter,
    FromRepr,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Uninitialized.
    #[default]
    None = 0,
    /// Request is waiting.
    Wait,
    /// Request is executing.
    Exec,
    /// Request is done.
    Done,
}

/// Lifecycle state of a container.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    EnumCount,
    EnumIter,
    FromRepr,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Uninitialized.
    #[default]
    None = 0,
    /// Waiting for resources (cpu + mem).
    Wait,
    /// Launching.
    Start,
    /// Running: idle but not paused.
    Idle,
    /// Running: idle but paused.
    Paused,
    /// Running: busy.
    Busy,
    /// Exited, failed or done.
    Done,
}

const REQUEST_STATE_KEYS: [&str; RequestState::MAX] = ["none", "wait", "exec", "done"];

const CONTAINER_STATE_KEYS: [&str; ContainerState::MAX] =
    ["none", "wait", "start", "idle", "paused", "busy", "done"];

const CONTAINER_GAUGE_KEYS: [Option<&str>; ContainerState::MAX] = [
    None,
    Some("container_wait_total"),
    Some("container_start_total"),
    Some("container_idle_total"),
    Some("container_paused_total"),
    Some("container_busy_total"),
    None,
];

const CONTAINER_DURATION_KEYS: [Option<&str>; ContainerState::MAX] = [
    None,
    Some("container_wait_duration_ms"),
    Some("container_start_duration_ms"),
    Some("container_idle_duration_ms"),
    Some("container_paused_duration_ms"),
    Some("container_busy_duration_ms"),
    None,
];

impl RequestState {
    /// Number of real states. Sizes lookup tables; never a runtime value.
    pub const MAX: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        REQUEST_STATE_KEYS[self.index()]
    }
}

impl ContainerState {
    /// Number of real states. Sizes lookup tables; never a runtime value.
    pub const MAX: usize = 7;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        CONTAINER_STATE_KEYS[self.index()]
    }

    /// Occupancy gauge for this state, if it is tracked as a standing count.
    pub fn gauge_key(self) -> Option<&'static str> {
        CONTAINER_GAUGE_KEYS[self.index()]
    }

    /// Duration histogram recorded when a container leaves this state.
    pub fn duration_key(self) -> Option<&'static str> {
        CONTAINER_DURATION_KEYS[self.index()]
    }

    /// Whether a container in state `self` may move to `new_state`.
    ///
    /// Any forward move is allowed. Going back is only allowed from paused
    /// to idle, and from busy to idle or paused.
    pub fn can_transition_to(self, new_state: ContainerState) -> bool {
        self < new_state ||
            (self == ContainerState::Paused && new_state == ContainerState::Idle) ||
            (self == ContainerState::Busy && is_idle_state(new_state))
    }
}

/// Idle-like states: running but not serving an invocation.
pub fn is_idle_state(state: ContainerState) -> bool {
    matches!(state, ContainerState::Idle | ContainerState::Paused)
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
