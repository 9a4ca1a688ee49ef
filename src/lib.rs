//! APM Segments Library
//!
//! Attaches APM transaction tracing to hyper request handling and records
//! timed segments (database, cache, outbound HTTP, generic) against the
//! active transaction.
//!
//! # Features
//!
//! - **Per-request transactions**: [`Application::handler`] wraps any hyper service
//! - **Guaranteed end**: transactions end exactly once, even on panic
//! - **Fail-safe façade**: segment constructors degrade to no-ops without a transaction
//! - **Pluggable backend**: anything implementing [`apm::Agent`]; `tracing` spans by default
//!
//! # Example
//!
//! ```no_run
//! use apm_segments::{config::Config, server::Server, transaction::Application};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let app = Application::new(&config.apm)?;
//!     let mut server = Server::new(config.server, app)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod apm;
pub mod config;
pub mod segments;
pub mod server;
pub mod telemetry;
pub mod transaction;

// Re-export commonly used types
pub use config::Config;
pub use segments::{
    add_attribute, start_cache_segment, start_database_segment, start_external_segment,
    start_segment, Segment, SegmentKind,
};
pub use transaction::{Application, ConfigurationError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
