//! Metrics for container lifecycle tracking.
//!
//! Provides OTLP metrics export with:
//! - An up/down counter for hot containers per app/function/image
//! - Up/down counters for per-state container occupancy
//! - Histograms for time spent in each container state

use anyhow::{Context, Result};
use opentelemetry::{
    metrics::{Histogram, Meter, UpDownCounter},
    KeyValue,
};
use opentelemetry_otlp::{MetricExporter, WithExportConfig};
use opentelemetry_sdk::{
    metrics::{PeriodicReader, SdkMeterProvider},
    Resource,
};

use crate::{call::CallIdentity, config::TelemetryConfig, state_types::ContainerState};

const METER_NAME: &str = "indexify-agent";
const UNKNOWN_INSTANCE: &str = "unknown";

/// Build a meter provider exporting container state metrics over OTLP.
///
/// Returns `None` when metrics are disabled. The tonic exporter connects
/// through the current Tokio runtime, so enabled metrics must be built from
/// within one; outside a runtime this returns an error.
pub fn build_provider(config: &TelemetryConfig) -> Result<Option<SdkMeterProvider>> {
    if !config.enable_metrics {
        return Ok(None);
    }

    tokio::runtime::Handle::try_current()
        .context("exporting agent metrics requires a Tokio runtime")?;

    let instance_id = config.instance_id.as_deref().unwrap_or(UNKNOWN_INSTANCE);
    let resource = Resource::builder()
        .with_attribute(KeyValue::new("service.namespace", "indexify"))
        .with_attribute(KeyValue::new("service.name", "indexify-agent"))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .with_attribute(KeyValue::new(
            "indexify.agent.instance.id",
            instance_id.to_string(),
        ))
        .build();

    let mut exporter_builder = MetricExporter::builder().with_tonic();
    if let Some(endpoint) = &config.endpoint {
        exporter_builder = exporter_builder.with_endpoint(endpoint.clone());
    }
    let exporter = exporter_builder
        .build()
        .context("building OTLP metric exporter")?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(config.metrics_interval)
        .build();

    Ok(Some(
        SdkMeterProvider::builder()
            .with_resource(resource)
            .with_reader(reader)
            .build(),
    ))
}

/// Install the agent's meter provider globally.
///
/// Must run before [`AgentMetrics::new`], since instruments bind to whatever
/// provider is global at construction time.
pub fn init_provider(config: &TelemetryConfig) -> Result<()> {
    let Some(provider) = build_provider(config)? else {
        return Ok(());
    };
    opentelemetry::global::set_meter_provider(provider);

    tracing::info!(
        instance_id = config.instance_id.as_deref().unwrap_or(UNKNOWN_INSTANCE),
        endpoint = ?config.endpoint,
        interval_secs = config.metrics_interval.as_secs(),
        "Container state metrics export enabled"
    );

    Ok(())
}

/// Destination for the telemetry produced by accepted container transitions.
///
/// Implementations must not block; they are called on the transition path
/// right after the tracker releases its lock.
pub trait TelemetrySink: Send + Sync {
    /// +1 when a container for `identity` starts, -1 when it is done.
    fn record_hot(&self, identity: &CallIdentity, delta: i64);

    /// Occupancy change for a state that has a gauge.
    fn record_state_gauge(&self, state: ContainerState, identity: &CallIdentity, delta: i64);

    /// Time spent in `state` before leaving it.
    fn record_state_duration(&self, state: ContainerState, identity: &CallIdentity, millis: u64);
}

/// OpenTelemetry instruments for container state telemetry.
///
/// Per-state instruments are indexed by the state's integer tag; states
/// without a metric key hold `None`.
#[derive(Clone)]
pub struct AgentMetrics {
    hot_containers: UpDownCounter<i64>,
    state_gauges: [Option<UpDownCounter<i64>>; ContainerState::MAX],
    state_durations: [Option<Histogram<u64>>; ContainerState::MAX],
}

impl AgentMetrics {
    pub fn new() -> Self {
        Self::with_meter(&opentelemetry::global::meter(METER_NAME))
    }

    pub fn with_meter(meter: &Meter) -> Self {
        let hot_containers = meter
            .i64_up_down_counter("indexify.agent.hot_containers")
            .with_description("Number of open container lifecycles per app, function and image")
            .build();

        let state_gauges = std::array::from_fn(|i| {
            let key = ContainerState::from_repr(i as u8)?.gauge_key()?;
            Some(
                meter
                    .i64_up_down_counter(key)
                    .with_description("Number of containers in this state")
                    .build(),
            )
        });

        let state_durations = std::array::from_fn(|i| {
            let key = ContainerState::from_repr(i as u8)?.duration_key()?;
            Some(
                meter
                    .u64_histogram(key)
                    .with_description("Time a container spent in this state")
                    .with_unit("ms")
                    .build(),
            )
        });

        Self {
            hot_containers,
            state_gauges,
            state_durations,
        }
    }
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for AgentMetrics {
    fn record_hot(&self, identity: &CallIdentity, delta: i64) {
        self.hot_containers.add(delta, &identity.attributes());
    }

    fn record_state_gauge(&self, state: ContainerState, identity: &CallIdentity, delta: i64) {
        if let Some(gauge) = &self.state_gauges[state.index()] {
            gauge.add(delta, &identity.attributes());
        }
    }

    fn record_state_duration(&self, state: ContainerState, identity: &CallIdentity, millis: u64) {
        if let Some(histogram) = &self.state_durations[state.index()] {
            histogram.record(millis, &identity.attributes());
        }
    }
}
