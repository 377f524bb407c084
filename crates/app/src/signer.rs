//! Request signer: HMAC-SHA256 `amx` authorization for device requests.
//!
//! The canonical string is the concatenation, without separators, of the
//! method, body length, content type, nonce, timestamp and absolute URI.
//! The device's pre-shared key never leaves the MAC state built at setup.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use accessgen_domain::device::Device;
use accessgen_domain::error::ValidationError;
use accessgen_domain::time;

use crate::ports::transport::{Method, OutboundRequest};

/// Authorization scheme name.
pub const SCHEME: &str = "amx";

/// Content type used in the signing string for requests without a body.
pub const NO_CONTENT: &str = "no-content";

type HmacSha256 = Hmac<Sha256>;

/// Everything that goes into one signature.
#[derive(Debug, Clone, Copy)]
pub struct SigningInput<'a> {
    pub method: Method,
    /// Absolute request URI.
    pub uri: &'a str,
    pub content_length: usize,
    /// `None` when the request carries no body.
    pub content_type: Option<&'a str>,
    pub nonce: &'a str,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl SigningInput<'_> {
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.method,
            self.content_length,
            self.content_type.unwrap_or(NO_CONTENT),
            self.nonce,
            self.timestamp,
            self.uri,
        )
    }
}

/// Fresh nonce: 32 lowercase hex characters from a random 128-bit value.
#[must_use]
pub fn nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Signs requests on behalf of one device.
#[derive(Clone)]
pub struct Signer {
    serial: String,
    mac: HmacSha256,
}

impl Signer {
    /// Build a signer from a raw key. Any key length is accepted, including
    /// an empty key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSharedKey`] when the MAC rejects
    /// the key.
    pub fn new(serial: impl Into<String>, key: &[u8]) -> Result<Self, ValidationError> {
        let serial = serial.into();
        match HmacSha256::new_from_slice(key) {
            Ok(mac) => Ok(Self { serial, mac }),
            Err(_) => Err(ValidationError::InvalidSharedKey { serial }),
        }
    }

    /// Build a signer from the device's base64 shared key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSharedKey`] when the key is not
    /// valid base64.
    pub fn from_device(device: &Device) -> Result<Self, ValidationError> {
        let key = STANDARD.decode(device.shared_key.trim()).map_err(|_| {
            ValidationError::InvalidSharedKey {
                serial: device.serial_number.clone(),
            }
        })?;
        Self::new(device.serial_number.clone(), &key)
    }

    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Base64 HMAC-SHA256 of the canonical signing string.
    #[must_use]
    pub fn signature(&self, input: &SigningInput<'_>) -> String {
        let mut mac = self.mac.clone();
        mac.update(input.canonical().as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Full `Authorization` header value.
    #[must_use]
    pub fn authorization(&self, input: &SigningInput<'_>) -> String {
        format!(
            "{SCHEME} {}:{}:{}:{}",
            self.serial,
            self.signature(input),
            input.nonce,
            input.timestamp
        )
    }

    /// Sign `request` with a fresh nonce and the current time and attach the
    /// `Authorization` header.
    pub fn sign(&self, request: &mut OutboundRequest) {
        let nonce = nonce();
        let header = {
            let input = SigningInput {
                method: request.method,
                uri: request.uri.as_str(),
                content_length: request.body.as_ref().map_or(0, |b| b.bytes.len()),
                content_type: request.body.as_ref().map(|b| b.content_type.as_str()),
                nonce: &nonce,
                timestamp: time::unix_seconds(time::now()),
            };
            self.authorization(&input)
        };
        request.push_header("Authorization", header);
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}
