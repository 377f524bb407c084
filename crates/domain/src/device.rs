//! Device: a simulated access-control controller with its portals and readers.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A simulated controller identified by its serial number.
///
/// `shared_key` is the base64 text form of the device's pre-shared key. It is
/// only ever decoded by the request signer and never sent over the wire.
#[derive(Clone, Serialize, Deserialize)]
pub struct Device {
    pub serial_number: String,
    pub shared_key: String,
    #[serde(default)]
    pub portals: Vec<Portal>,
}

/// A door, turnstile or gate attached to exactly one [`Device`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub portal_id: String,
    #[serde(default)]
    pub reader_ids: Vec<String>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the serial is empty, when the device
    /// has no portals, or when one of its portals has no readers.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.serial_number.is_empty() {
            return Err(ValidationError::EmptySerial);
        }
        if self.portals.is_empty() {
            return Err(ValidationError::NoPortals {
                serial: self.serial_number.clone(),
            });
        }
        if let Some(portal) = self.portals.iter().find(|p| p.reader_ids.is_empty()) {
            return Err(ValidationError::NoReaders {
                portal: portal.portal_id.clone(),
            });
        }
        Ok(())
    }
}

// The shared key stays out of debug output.
impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("serial_number", &self.serial_number)
            .field("shared_key", &"<redacted>")
            .field("portals", &self.portals)
            .finish()
    }
}

impl Portal {
    #[must_use]
    pub fn new<I, S>(portal_id: impl Into<String>, reader_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            portal_id: portal_id.into(),
            reader_ids: reader_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    serial_number: Option<String>,
    shared_key: Option<String>,
    portals: Vec<Portal>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn serial_number(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    #[must_use]
    pub fn shared_key(mut self, key: impl Into<String>) -> Self {
        self.shared_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn portal(mut self, portal: Portal) -> Self {
        self.portals.push(portal);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the assembled device breaks an invariant.
    pub fn build(self) -> Result<Device, ValidationError> {
        let device = Device {
            serial_number: self.serial_number.unwrap_or_default(),
            shared_key: self.shared_key.unwrap_or_default(),
            portals: self.portals,
        };
        device.validate()?;
        Ok(device)
    }
}
