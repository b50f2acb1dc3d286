//! Startup wiring: logging, metrics and a tracker fed by them.
//!
//! Installs process-wide globals, so this file holds a single test.

use std::sync::Arc;

use agent_state::{
    AgentConfig,
    Call,
    CallIdentity,
    ContainerState,
    ContainerStateTracker,
    RequestState,
    RequestStateTracker,
};

#[test]
fn test_init_wires_logging_and_metrics() {
    let config = AgentConfig::from_yaml_str(
        r#"
env: production
log_filter: "warn,agent_state=trace"
telemetry:
  enable_metrics: false
"#,
    )
    .unwrap();

    let metrics = agent_state::init(&config).unwrap();

    let container = ContainerStateTracker::new(Arc::new(metrics));
    let call = Call::new(CallIdentity::new("app", "fn", "img:1"));
    assert!(container.update_state(ContainerState::Start, &call));
    assert!(!container.update_state(ContainerState::Wait, &call));
    assert!(container.update_state(ContainerState::Done, &call));

    let request = RequestStateTracker::new();
    assert!(request.update_state(RequestState::Exec, None));

    // The subscriber is global; a second install is refused.
    let err = agent_state::tracing::setup_tracing(&config).unwrap_err();
    assert!(err.to_string().contains("already installed"), "{err:#}");
}
