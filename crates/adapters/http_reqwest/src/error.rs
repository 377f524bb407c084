//! HTTP adapter error types.

use accessgen_app::ports::TransportError;

/// Errors specific to the reqwest transport.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    /// The request failed before a response arrived.
    #[error("HTTP request failed")]
    Request(#[source] reqwest::Error),
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        TransportError::Failed(Box::new(err))
    }
}
