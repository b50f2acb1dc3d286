//! Log setup for the agent.
//!
//! Transition logs are emitted at debug (accepted) and trace (ignored)
//! level, so the filter decides how noisy lifecycle tracking is.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

use crate::config::AgentConfig;

const DEFAULT_DIRECTIVES: &str = "info";

/// `RUST_LOG` wins; otherwise the configured `log_filter`, else info.
pub fn get_env_filter(config: &AgentConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = config.log_filter.as_deref().unwrap_or(DEFAULT_DIRECTIVES);
    EnvFilter::try_new(directives).with_context(|| format!("invalid log_filter {directives:?}"))
}

pub fn get_log_layer<S>(config: &AgentConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    S: tracing::Subscriber,
{
    // Transitions on one tracker arrive from many threads.
    if config.structured_logging() {
        return Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_span_list(false)
                .flatten_event(true)
                .with_thread_ids(true),
        );
    }

    Box::new(tracing_subscriber::fmt::layer().compact().with_target(false))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn setup_tracing(config: &AgentConfig) -> Result<()> {
    let env_filter = get_env_filter(config)?;
    let log_layer = get_log_layer(config).with_filter(env_filter);

    let subscriber = tracing_subscriber::Registry::default().with(log_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("a global tracing subscriber is already installed")?;
    Ok(())
}
