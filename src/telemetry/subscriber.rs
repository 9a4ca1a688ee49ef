//! Tracing subscriber setup with layered architecture
//!
//! ```text
//! Registry
//!   ├── OpenTelemetry Layer (`otel` feature, when enabled)
//!   ├── EnvFilter (RUST_LOG, falling back to the configured level)
//!   └── Fmt Layer (text or JSON)
//! ```

use crate::config::{LogFormat, TelemetryConfig};
use crate::telemetry::init::{init_telemetry, TelemetryError, TelemetryGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber described by `config`
///
/// Fails if a global subscriber is already set.
pub fn init_subscriber(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let guard = init_telemetry(config)?;
    let env_filter = build_filter(&config.log_level)?;

    let json_layer = (config.log_format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
    });
    let text_layer = (config.log_format == LogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
    });

    let registry = tracing_subscriber::registry();

    #[cfg(feature = "otel")]
    let registry = {
        use opentelemetry::trace::TracerProvider as _;

        let telemetry_layer = guard.provider().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
        });
        registry.with(telemetry_layer)
    };

    registry
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberError(e.to_string()))?;

    Ok(guard)
}

/// `RUST_LOG` if set, otherwise `default_level`
fn build_filter(default_level: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| TelemetryError::InvalidFilter(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_level() {
        assert!(build_filter("debug").is_ok());
    }

    #[test]
    fn test_subscriber_init_default() {
        let config = TelemetryConfig::default();
        // May fail if another test installed a subscriber first
        let _ = init_subscriber(&config);
    }
}
