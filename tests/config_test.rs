//! Configuration Loading Tests

use apm_segments::config::{Config, ConfigError, LogFormat};
use apm_segments::transaction::{Application, ConfigurationError};
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
server:
  address: "127.0.0.1:9000"
apm:
  app_name: "orders-api;orders-all"
  license_key: "0123456789abcdef0123456789abcdef01234567"
telemetry:
  service_name: "orders-api"
  log_level: "debug"
  log_format: "json"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.address, "127.0.0.1:9000");
    assert_eq!(config.apm.app_name, "orders-api;orders-all");
    assert!(config.apm.enabled);
    assert_eq!(config.telemetry.log_level, "debug");
    assert_eq!(config.telemetry.log_format, LogFormat::Json);
    assert!(!config.telemetry.otel_enabled);

    let app = Application::new(&config.apm).unwrap();
    assert!(app.is_enabled());
}

#[test]
#[serial]
fn test_env_expansion_in_apm_section() {
    std::env::set_var("APM_SEGMENTS_TEST_LICENSE", "fedcba9876543210fedcba9876543210fedcba98");
    let file = write_config(
        r#"
apm:
  app_name: "${APM_SEGMENTS_TEST_APP:-billing}"
  license_key: "${APM_SEGMENTS_TEST_LICENSE}"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    std::env::remove_var("APM_SEGMENTS_TEST_LICENSE");

    assert_eq!(config.apm.app_name, "billing");
    assert_eq!(
        config.apm.license_key,
        "fedcba9876543210fedcba9876543210fedcba98"
    );
    assert!(Application::new(&config.apm).is_ok());
}

#[test]
#[serial]
fn test_unset_license_fails_application_startup() {
    std::env::remove_var("APM_SEGMENTS_TEST_LICENSE");
    let file = write_config(
        r#"
apm:
  app_name: "billing"
  license_key: "${APM_SEGMENTS_TEST_LICENSE}"
"#,
    );

    // The file itself is fine; the bad credential is caught at startup
    let config = Config::load(file.path()).unwrap();
    let err = Application::new(&config.apm).unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidLicenseKey(_)));
}

#[test]
fn test_invalid_log_level_rejected() {
    let file = write_config(
        r#"
apm:
  app_name: "billing"
  enabled: false
telemetry:
  log_level: "loud"
"#,
    );

    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        Config::load("/nonexistent/apm-segments.yaml"),
        Err(ConfigError::IoError(_))
    ));
}
