//! Lifecycle tracking for the function agent.
//!
//! Records and validates request and container state transitions, fans
//! accepted transitions out to the slot queue, and turns them into
//! occupancy, duration and hot-container telemetry.

pub mod call;
pub mod config;
pub mod container_state;
pub mod error;
pub mod metrics;
pub mod request_state;
pub mod slots;
pub mod state_types;
pub mod tracing;

pub use call::{Call, CallIdentity};
pub use config::{AgentConfig, TelemetryConfig};
pub use container_state::ContainerStateTracker;
pub use error::{AgentError, FuncError};
pub use metrics::{AgentMetrics, TelemetrySink};
pub use request_state::RequestStateTracker;
pub use slots::{SlotNotifier, SlotSnapshot, SlotStats};
pub use state_types::{is_idle_state, ContainerState, RequestState};

/// Install logging and metrics export for the agent, then bind the
/// container state instruments.
///
/// Call once at startup. With metrics enabled this must run inside a Tokio
/// runtime.
pub fn init(config: &AgentConfig) -> anyhow::Result<AgentMetrics> {
    crate::tracing::setup_tracing(config)?;
    metrics::init_provider(&config.telemetry)?;
    Ok(AgentMetrics::new())
}
