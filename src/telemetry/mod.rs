//! Logging and span export
//!
//! Installs the global `tracing` subscriber: an `EnvFilter`, a text or JSON
//! fmt layer and, with the `otel` feature, an OpenTelemetry layer so the
//! spans emitted by [`TracingAgent`](crate::apm::TracingAgent) leave the
//! process.
//!
//! # Example
//!
//! ```no_run
//! use apm_segments::config::TelemetryConfig;
//! use apm_segments::telemetry::init_subscriber;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TelemetryConfig::default();
//! let _guard = init_subscriber(&config)?;
//! // Guard flushes exported spans on drop
//! # Ok(())
//! # }
//! ```

pub mod init;
pub mod subscriber;

pub use init::{shutdown_telemetry, TelemetryError, TelemetryGuard};
pub use subscriber::init_subscriber;
