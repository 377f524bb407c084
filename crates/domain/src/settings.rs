//! Boot and pacing settings read once at startup.

use serde::Deserialize;

/// How the transport treats the server certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateValidation {
    /// Encrypt, but accept any server certificate.
    #[default]
    EncryptionOnly,
    ValidateCertificate,
}

impl CertificateValidation {
    #[must_use]
    pub fn accepts_invalid_certs(self) -> bool {
        matches!(self, Self::EncryptionOnly)
    }
}

/// A named base URI substituted for `{name}` tokens in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceBaseUri {
    pub name: String,
    pub uri: String,
}

/// A header attached verbatim to every outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomHeader {
    pub name: String,
    pub value: String,
}

/// Settings that shape every outbound request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Base URI that relative request paths are resolved against.
    pub default_uri: String,
    pub services: Vec<ServiceBaseUri>,
    pub custom_headers: Vec<CustomHeader>,
    pub certificate_validation: CertificateValidation,
    /// Value of the `x-gtl-oem-client-application-name` header.
    pub app_version: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            default_uri: String::new(),
            services: Vec::new(),
            custom_headers: Vec::new(),
            certificate_validation: CertificateValidation::default(),
            app_version: "OEM-Access:v1".to_string(),
        }
    }
}

/// Pacing between simulated interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestPacing {
    /// Fixed delay after each interaction, in milliseconds.
    pub request_delay_ms: u64,
    /// Exclusive upper bound of the random jitter added to the delay.
    pub jitter_ms: u64,
}

impl Default for RequestPacing {
    fn default() -> Self {
        Self {
            request_delay_ms: 1000,
            jitter_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_encryption_only() {
        let boot = BootConfig::default();
        assert_eq!(
            boot.certificate_validation,
            CertificateValidation::EncryptionOnly
        );
        assert!(boot.certificate_validation.accepts_invalid_certs());
        assert!(!CertificateValidation::ValidateCertificate.accepts_invalid_certs());
    }

    #[test]
    fn should_deserialize_boot_config_from_toml() {
        let toml = r#"
            default_uri = "https://api.example"
            certificate_validation = "validate_certificate"

            [[services]]
            name = "events"
            uri = "https://events.example"

            [[custom_headers]]
            name = "x-tenant"
            value = "acme"
        "#;
        let boot: BootConfig = toml::from_str(toml).unwrap();
        assert_eq!(boot.default_uri, "https://api.example");
        assert_eq!(
            boot.certificate_validation,
            CertificateValidation::ValidateCertificate
        );
        assert_eq!(boot.services[0].name, "events");
        assert_eq!(boot.custom_headers[0].value, "acme");
        assert_eq!(boot.app_version, "OEM-Access:v1");
    }

    #[test]
    fn should_use_pacing_defaults_for_missing_fields() {
        let pacing: RequestPacing = toml::from_str("jitter_ms = 0").unwrap();
        assert_eq!(pacing.request_delay_ms, 1000);
        assert_eq!(pacing.jitter_ms, 0);
    }
}
