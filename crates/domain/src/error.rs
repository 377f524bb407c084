//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`AccessGenError`] via `#[from]` when crossing a port boundary.

/// Top-level error for domain and setup failures.
#[derive(Debug, thiserror::Error)]
pub enum AccessGenError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),
}

/// Invariant violations detected while loading or setting up a device.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("serial number must not be empty")]
    EmptySerial,

    /// The shared key is not valid base64.
    #[error("shared key for device {serial} is not a valid base64 secret")]
    InvalidSharedKey { serial: String },

    #[error("device {serial} has no portals")]
    NoPortals { serial: String },

    #[error("portal {portal} has no readers")]
    NoReaders { portal: String },

    #[error("user pool is empty")]
    NoUsers,

    #[error("invalid uri {uri:?}")]
    InvalidUri { uri: String },
}
