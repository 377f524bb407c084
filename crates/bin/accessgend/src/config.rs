//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `accessgen.toml` in the working directory, or at the path named
//! by `ACCESSGEN_CONFIG`. Every section has a default, but a usable file must
//! at least list devices, users and the default URI. Environment variables
//! take precedence over file values.

use serde::Deserialize;

use accessgen_adapter_http_reqwest::HttpConfig;
use accessgen_domain::device::Device;
use accessgen_domain::settings::{BootConfig, RequestPacing};
use accessgen_domain::user::User;

const DEFAULT_PATH: &str = "accessgen.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Request shaping settings.
    pub boot: BootConfig,
    /// Pacing between simulated interactions.
    pub requests: RequestPacing,
    /// HTTP client settings.
    pub transport: HttpConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated devices.
    pub devices: Vec<Device>,
    /// Shared pool of users presenting credentials.
    pub users: Vec<User>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result has no devices, no users or no usable default URI.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ACCESSGEN_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("ACCESSGEN_DEFAULT_URI") {
            self.boot.default_uri = val;
        }
        if let Some(delay) = var("ACCESSGEN_REQUEST_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.requests.request_delay_ms = delay;
        }
        if let Some(jitter) = var("ACCESSGEN_JITTER_MS").and_then(|v| v.parse().ok()) {
            self.requests.jitter_ms = jitter;
        }
        if let Some(val) = var("ACCESSGEN_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::Validation(
                "at least one device is required".to_string(),
            ));
        }
        if self.users.is_empty() {
            return Err(ConfigError::Validation(
                "at least one user is required".to_string(),
            ));
        }
        if url::Url::parse(&self.boot.default_uri).is_err() {
            return Err(ConfigError::Validation(format!(
                "default_uri {:?} is not an absolute URI",
                self.boot.default_uri
            )));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "accessgend=info,accessgen=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use accessgen_domain::settings::CertificateValidation;

    const FULL: &str = r#"
        [boot]
        default_uri = "https://api.example"
        certificate_validation = "validate_certificate"
        app_version = "OEM-Access:v2"

        [[boot.services]]
        name = "events"
        uri = "https://ingest.example"

        [[boot.custom_headers]]
        name = "x-tenant"
        value = "acme"

        [requests]
        request_delay_ms = 250
        jitter_ms = 0

        [transport]
        timeout_secs = 4

        [logging]
        filter = "debug"

        [[devices]]
        serial_number = "S1"
        shared_key = "YWJjMTIz"

        [[devices.portals]]
        portal_id = "P1"
        reader_ids = ["R1", "R2"]

        [[users]]
        user_id = "U1"
        token_id = "T1"
        token_data = "AAAA"
    "#;

    fn full() -> Config {
        toml::from_str(FULL).unwrap()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.requests.request_delay_ms, 1000);
        assert_eq!(config.requests.jitter_ms, 500);
        assert_eq!(config.transport.timeout_secs, 10);
        assert_eq!(config.boot.app_version, "OEM-Access:v1");
        assert_eq!(
            config.boot.certificate_validation,
            CertificateValidation::EncryptionOnly
        );
        assert_eq!(config.logging.filter, "accessgend=info,accessgen=info");
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_parse_full_toml() {
        let config = full();
        assert_eq!(config.boot.default_uri, "https://api.example");
        assert_eq!(
            config.boot.certificate_validation,
            CertificateValidation::ValidateCertificate
        );
        assert_eq!(config.boot.app_version, "OEM-Access:v2");
        assert_eq!(config.boot.services[0].name, "events");
        assert_eq!(config.boot.custom_headers[0].value, "acme");
        assert_eq!(config.requests.request_delay_ms, 250);
        assert_eq!(config.requests.jitter_ms, 0);
        assert_eq!(config.transport.timeout_secs, 4);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].portals[0].reader_ids, ["R1", "R2"]);
        assert_eq!(config.users[0].token_id, "T1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_reject_missing_devices() {
        let mut config = full();
        config.devices.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_missing_users() {
        let mut config = full();
        config.users.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_relative_default_uri() {
        let mut config = full();
        config.boot.default_uri = "api.example".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_leave_device_checks_to_setup() {
        let mut config = full();
        config.devices[0].portals.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_apply_overrides_over_file_values() {
        let vars = HashMap::from([
            ("ACCESSGEN_DEFAULT_URI", "https://other.example"),
            ("ACCESSGEN_REQUEST_DELAY_MS", "50"),
            ("ACCESSGEN_JITTER_MS", "5"),
            ("ACCESSGEN_LOG", "trace"),
        ]);
        let mut config = full();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.boot.default_uri, "https://other.example");
        assert_eq!(config.requests.request_delay_ms, 50);
        assert_eq!(config.requests.jitter_ms, 5);
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_prefer_rust_log_over_accessgen_log() {
        let vars = HashMap::from([("ACCESSGEN_LOG", "trace"), ("RUST_LOG", "warn")]);
        let mut config = full();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_ignore_unparseable_numeric_overrides() {
        let vars = HashMap::from([("ACCESSGEN_REQUEST_DELAY_MS", "soon")]);
        let mut config = full();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));
        assert_eq!(config.requests.request_delay_ms, 250);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
