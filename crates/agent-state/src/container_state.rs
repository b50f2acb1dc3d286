//! Container lifecycle tracking.
//!
//! A container moves through wait -> start -> idle/paused/busy -> done. Any
//! forward move is accepted; a container may also drop back to idle or
//! paused when it finishes an invocation. Every accepted transition fans out
//! to the slot queue and to telemetry once the lock is released.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use tracing::{debug, trace};

use crate::{call::Call, metrics::TelemetrySink, state_types::ContainerState};

#[derive(Debug, Default)]
struct Inner {
    state: ContainerState,
    start: Option<Instant>,
}

/// What an accepted transition replaced.
struct Transition {
    old_state: ContainerState,
    entered_old: Option<Instant>,
    now: Instant,
}

pub struct ContainerStateTracker {
    inner: Mutex<Inner>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl ContainerStateTracker {
    pub fn new(telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            telemetry,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `new_state` if the transition is allowed.
    ///
    /// Returns true if this call performed the transition. Disallowed
    /// transitions leave the tracker untouched and emit nothing.
    pub fn update_state(&self, new_state: ContainerState, call: &Call) -> bool {
        let result = {
            let mut inner = self.lock();
            if inner.state.can_transition_to(new_state) {
                let now = Instant::now();
                let transition = Transition {
                    old_state: inner.state,
                    entered_old: inner.start,
                    now,
                };
                inner.state = new_state;
                inner.start = Some(now);
                Ok(transition)
            } else {
                Err(inner.state)
            }
        };

        match result {
            Ok(transition) => {
                self.publish(&transition, new_state, call);
                true
            }
            Err(current) => {
                trace!(
                    container_state = %current,
                    requested = %new_state,
                    app_id = %call.identity.app_id,
                    fn_id = %call.identity.fn_id,
                    "Ignoring container state update"
                );
                false
            }
        }
    }

    fn publish(&self, transition: &Transition, new_state: ContainerState, call: &Call) {
        let old_state = transition.old_state;
        let identity = &call.identity;

        debug!(
            app_id = %identity.app_id,
            fn_id = %identity.fn_id,
            image = %identity.image,
            from = %old_state,
            to = %new_state,
            "Container state changed"
        );

        self.set_hot(call, new_state);

        if let Some(slots) = call.slots() {
            slots.enter_container_state(new_state);
            slots.exit_container_state(old_state);
        }

        if old_state.gauge_key().is_some() {
            self.telemetry.record_state_gauge(old_state, identity, -1);
        }
        if new_state.gauge_key().is_some() {
            self.telemetry.record_state_gauge(new_state, identity, 1);
        }

        if old_state.duration_key().is_some() {
            let elapsed = transition
                .entered_old
                .map(|entered| transition.now.saturating_duration_since(entered))
                .unwrap_or_default();
            let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            self.telemetry.record_state_duration(old_state, identity, millis);
        }
    }

    /// Only container creation and teardown flip whether an identity has a
    /// hot container.
    fn set_hot(&self, call: &Call, state: ContainerState) {
        let delta = match state {
            ContainerState::Start => 1,
            ContainerState::Done => -1,
            _ => return,
        };
        self.telemetry.record_hot(&call.identity, delta);
    }

    pub fn state(&self) -> ContainerState {
        self.lock().state
    }

    pub fn get_state(&self) -> &'static str {
        self.state().as_str()
    }
}

impl std::fmt::Debug for ContainerStateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ContainerStateTracker")
            .field("state", &inner.state)
            .field("start", &inner.start)
            .finish()
    }
}
