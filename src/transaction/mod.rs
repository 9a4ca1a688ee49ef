//! Transaction context carrier
//!
//! [`Application`] is the process-wide APM handle. It is built once at
//! startup (and refuses to build from a bad name/license pair), then wraps the
//! service stack via [`Application::handler`]. Each request gets its own
//! transaction, stored in the request extensions for the segment façade and
//! ended exactly once when the wrapped service finishes.
//!
//! # Example
//!
//! ```no_run
//! use apm_segments::config::ApmConfig;
//! use apm_segments::transaction::Application;
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use hyper::service::service_fn;
//! use hyper::{Request, Response};
//! use std::convert::Infallible;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApmConfig {
//!     app_name: "orders-api".to_string(),
//!     license_key: "0123456789abcdef0123456789abcdef01234567".to_string(),
//!     enabled: true,
//! };
//!
//! let app = Application::new(&config)?;
//! let service = app.handler(service_fn(|_req: Request<hyper::body::Incoming>| async {
//!     Ok::<_, Infallible>(Response::new(Full::new(Bytes::from("ok"))))
//! }));
//! # let _ = service;
//! # Ok(())
//! # }
//! ```

mod context;
mod middleware;

pub use context::{transaction_from, TransactionGuard};
pub use middleware::Traced;

pub(crate) use context::attach;

use crate::apm::{Agent, RequestInfo, TracingAgent, Transaction};
use crate::config::ApmConfig;
use hyper::Request;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Required license key length
pub const LICENSE_KEY_LENGTH: usize = 40;

/// Maximum number of `;`-separated application names
pub const MAX_APP_NAMES: usize = 3;

/// Errors raised while building an [`Application`]
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Application name is required")]
    MissingAppName,

    #[error("Too many application names: {0} (at most {max})", max = MAX_APP_NAMES)]
    TooManyAppNames(usize),

    #[error("License key must be {expected} characters, got {0}", expected = LICENSE_KEY_LENGTH)]
    InvalidLicenseKey(usize),

    #[error("Failed to initialize APM backend: {0}")]
    Backend(String),
}

/// Process-wide APM application handle
///
/// Cheap to clone; every clone shares the same backend agent.
#[derive(Clone)]
pub struct Application {
    app_name: Arc<str>,
    enabled: bool,
    agent: Arc<dyn Agent>,
}

impl Application {
    /// Build an application reporting through [`TracingAgent`]
    pub fn new(config: &ApmConfig) -> Result<Self, ConfigurationError> {
        Self::try_with_agent(config, |config| {
            let agent: Arc<dyn Agent> = Arc::new(TracingAgent::new(primary_name(&config.app_name)));
            Ok::<_, ConfigurationError>(agent)
        })
    }

    /// Build an application on top of an existing backend agent
    pub fn with_agent(
        config: &ApmConfig,
        agent: Arc<dyn Agent>,
    ) -> Result<Self, ConfigurationError> {
        Self::try_with_agent(config, |_| Ok::<_, ConfigurationError>(agent))
    }

    /// Build an application whose backend client may fail to initialize
    ///
    /// The config is validated before `init` runs; an `init` failure is
    /// reported as [`ConfigurationError::Backend`].
    pub fn try_with_agent<F, E>(config: &ApmConfig, init: F) -> Result<Self, ConfigurationError>
    where
        F: FnOnce(&ApmConfig) -> Result<Arc<dyn Agent>, E>,
        E: fmt::Display,
    {
        validate(config)?;
        let agent = init(config).map_err(|e| ConfigurationError::Backend(e.to_string()))?;

        info!(
            app_name = %config.app_name,
            enabled = config.enabled,
            "APM application initialized"
        );

        Ok(Self {
            app_name: Arc::from(config.app_name.as_str()),
            enabled: config.enabled,
            agent,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wrap a service so every request runs inside a transaction
    pub fn handler<S>(&self, next: S) -> Traced<S> {
        Traced::new(self.clone(), next)
    }

    /// Start a transaction named after the request path
    ///
    /// Returns `None` when the application is disabled.
    pub fn start_transaction<B>(&self, request: &Request<B>) -> Option<Arc<dyn Transaction>> {
        if !self.enabled {
            return None;
        }

        let info = RequestInfo::from_request(request);
        debug!(method = %info.method, path = %info.path, "starting transaction");
        Some(self.agent.start_transaction(&info.path, &info))
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("app_name", &self.app_name)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

fn validate(config: &ApmConfig) -> Result<(), ConfigurationError> {
    let names: Vec<&str> = config
        .app_name
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return Err(ConfigurationError::MissingAppName);
    }
    if names.len() > MAX_APP_NAMES {
        return Err(ConfigurationError::TooManyAppNames(names.len()));
    }

    if config.enabled {
        let length = config.license_key.chars().count();
        if length != LICENSE_KEY_LENGTH {
            return Err(ConfigurationError::InvalidLicenseKey(length));
        }
    }

    Ok(())
}

/// First of the `;`-separated application names
fn primary_name(app_name: &str) -> &str {
    app_name
        .split(';')
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(app_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef01234567";

    fn config(app_name: &str, license_key: &str) -> ApmConfig {
        ApmConfig {
            app_name: app_name.to_string(),
            license_key: license_key.to_string(),
            enabled: true,
        }
    }

    #[test]
    fn test_new_with_valid_config() {
        let app = Application::new(&config("orders-api", KEY)).unwrap();
        assert_eq!(app.app_name(), "orders-api");
        assert!(app.is_enabled());
    }

    #[test]
    fn test_missing_app_name() {
        let err = Application::new(&config("  ", KEY)).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingAppName));
    }

    #[test]
    fn test_too_many_app_names() {
        let err = Application::new(&config("a;b;c;d", KEY)).unwrap_err();
        assert!(matches!(err, ConfigurationError::TooManyAppNames(4)));
    }

    #[test]
    fn test_three_app_names_allowed() {
        assert!(Application::new(&config("a;b;c", KEY)).is_ok());
    }

    #[test]
    fn test_short_license_key() {
        let err = Application::new(&config("orders-api", "short")).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidLicenseKey(5)));
        assert_eq!(err.to_string(), "License key must be 40 characters, got 5");
    }

    #[test]
    fn test_disabled_skips_license_check() {
        let mut cfg = config("orders-api", "");
        cfg.enabled = false;
        let app = Application::new(&cfg).unwrap();
        assert!(!app.is_enabled());

        let request = Request::new(());
        assert!(app.start_transaction(&request).is_none());
    }

    #[test]
    fn test_backend_init_failure() {
        let err = Application::try_with_agent(&config("orders-api", KEY), |_| {
            Err::<Arc<dyn Agent>, _>("collector unreachable")
        })
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::Backend(ref msg) if msg == "collector unreachable"));
    }

    #[test]
    fn test_primary_name() {
        assert_eq!(primary_name("orders-api;orders-all"), "orders-api");
        assert_eq!(primary_name(" ;billing"), "billing");
    }
}
