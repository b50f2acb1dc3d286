use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

const LOCAL_ENV: &str = "local";
const DEFAULT_METRICS_INTERVAL_SECS: u64 = 5;

fn default_env() -> String {
    LOCAL_ENV.to_string()
}

fn default_metrics_interval() -> Duration {
    Duration::from_secs(DEFAULT_METRICS_INTERVAL_SECS)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Enable metrics export.
    #[serde(default)]
    pub enable_metrics: bool,
    /// OpenTelemetry collector grpc endpoint for metrics.
    /// Defaults to using OTEL_EXPORTER_OTLP_ENDPOINT env var or to
    /// localhost:4317 if empty.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Metrics export interval in seconds. Defaults to 5 seconds.
    #[serde(default = "default_metrics_interval", with = "duration_serde")]
    pub metrics_interval: Duration,
    /// Instance ID attached to exported metrics.
    #[serde(default)]
    pub instance_id: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            endpoint: None,
            metrics_interval: default_metrics_interval(),
            instance_id: None,
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "telemetry endpoint must include a scheme (http:// or https://), got: {}",
                    endpoint
                ));
            }
        }

        if self.metrics_interval.is_zero() {
            return Err(anyhow::anyhow!("metrics_interval must be greater than zero"));
        }

        Ok(())
    }
}

mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(seconds))
    }
}

/// Configuration for the agent's lifecycle tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Environment name (e.g., "local", "staging", "production").
    #[serde(default = "default_env")]
    pub env: String,
    /// Log directives in `RUST_LOG` syntax (e.g. "info,agent_state=debug"),
    /// used when `RUST_LOG` is unset. Defaults to "info".
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            log_filter: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn from_path(path: &str) -> Result<AgentConfig> {
        let config_str = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<AgentConfig> {
        let config: AgentConfig = serde_yaml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(directives) = &self.log_filter {
            tracing_subscriber::EnvFilter::try_new(directives)
                .map_err(|e| anyhow::anyhow!("invalid log_filter {:?}: {}", directives, e))?;
        }
        self.telemetry.validate()
    }

    pub fn structured_logging(&self) -> bool {
        self.env != LOCAL_ENV
    }
}
