//! Request URI templates.
//!
//! `{name}` tokens are replaced by the matching service base URI, then
//! `{deviceSerial}` by the device serial. A result that is still relative is
//! appended to the default base URI.

use url::{ParseError, Url};

use accessgen_domain::error::ValidationError;
use accessgen_domain::settings::{BootConfig, ServiceBaseUri};

/// Path events are posted to.
pub const EVENTS_PATH: &str = "device/{deviceSerial}/events";

const DEVICE_SERIAL_TOKEN: &str = "{deviceSerial}";

#[derive(Debug, Clone)]
pub struct UriResolver {
    default_uri: String,
    services: Vec<ServiceBaseUri>,
}

impl UriResolver {
    #[must_use]
    pub fn new(boot: &BootConfig) -> Self {
        Self {
            default_uri: boot.default_uri.clone(),
            services: boot.services.clone(),
        }
    }

    /// Expand `template` for `serial` into an absolute URI.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUri`] when the expanded text is not a
    /// valid URI even after joining it to the default base.
    pub fn resolve(&self, template: &str, serial: &str) -> Result<Url, ValidationError> {
        let mut expanded = template.to_string();
        for service in &self.services {
            expanded = expanded.replace(&format!("{{{}}}", service.name), &service.uri);
        }
        let expanded = expanded.replace(DEVICE_SERIAL_TOKEN, serial);

        match Url::parse(&expanded) {
            Ok(url) => Ok(url),
            Err(ParseError::RelativeUrlWithoutBase) => {
                let joined = format!(
                    "{}/{}",
                    self.default_uri.trim_end_matches('/'),
                    expanded.trim_start_matches('/')
                );
                Url::parse(&joined).map_err(|_| ValidationError::InvalidUri { uri: joined })
            }
            Err(_) => Err(ValidationError::InvalidUri { uri: expanded }),
        }
    }
}
