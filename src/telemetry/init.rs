//! Tracer provider lifecycle
//!
//! With the `otel` feature this builds the OpenTelemetry tracer provider and
//! hands it to a [`TelemetryGuard`], which flushes and shuts it down when
//! dropped. Without the feature the guard is always inactive.

use crate::config::TelemetryConfig;
use thiserror::Error;

#[cfg(feature = "otel")]
use opentelemetry::global;
#[cfg(feature = "otel")]
use opentelemetry_sdk::trace::TracerProvider;

/// Errors that can occur during telemetry initialization
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to initialize tracer provider: {0}")]
    ProviderError(String),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    SubscriberError(String),
}

/// RAII guard for the tracer provider
///
/// Flushes pending spans and shuts the global provider down on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    #[cfg(feature = "otel")]
    provider: Option<TracerProvider>,
    active: bool,
}

impl TelemetryGuard {
    #[cfg(feature = "otel")]
    fn new(provider: TracerProvider) -> Self {
        Self {
            provider: Some(provider),
            active: true,
        }
    }

    /// Guard with nothing to flush (export disabled)
    pub(crate) fn inactive() -> Self {
        Self {
            #[cfg(feature = "otel")]
            provider: None,
            active: false,
        }
    }

    /// Whether spans are being exported
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(feature = "otel")]
    pub(crate) fn provider(&self) -> Option<&TracerProvider> {
        self.provider.as_ref()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.active {
            #[cfg(feature = "otel")]
            {
                if let Some(provider) = &self.provider {
                    let _ = provider.force_flush();
                }
                global::shutdown_tracer_provider();
            }
        }
    }
}

/// Build the tracer provider for `config`
///
/// Returns an inactive guard when export is disabled in config or the crate
/// was built without the `otel` feature.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    if !config.otel_enabled {
        return Ok(TelemetryGuard::inactive());
    }

    #[cfg(feature = "otel")]
    {
        use opentelemetry::KeyValue;
        use opentelemetry_sdk::{trace, Resource};

        if config.service_name.trim().is_empty() {
            return Err(TelemetryError::ProviderError(
                "service name cannot be empty".into(),
            ));
        }

        let resource = Resource::new(vec![KeyValue::new(
            "service.name",
            config.service_name.clone(),
        )]);
        let provider = TracerProvider::builder()
            .with_config(trace::config().with_resource(resource))
            .build();

        global::set_tracer_provider(provider.clone());

        Ok(TelemetryGuard::new(provider))
    }

    #[cfg(not(feature = "otel"))]
    {
        tracing::warn!("otel_enabled is set but the crate was built without the `otel` feature");
        Ok(TelemetryGuard::inactive())
    }
}

/// Explicitly flush and shut down span export
///
/// Called automatically when the guard drops; use this to observe flush
/// errors.
pub fn shutdown_telemetry(mut guard: TelemetryGuard) -> Result<(), TelemetryError> {
    if guard.active {
        #[cfg(feature = "otel")]
        {
            if let Some(provider) = &guard.provider {
                for result in provider.force_flush() {
                    result.map_err(|e| TelemetryError::ProviderError(e.to_string()))?;
                }
            }
            global::shutdown_tracer_provider();
        }
        guard.active = false;
    }
    Ok(())
}
