//! # accessgen-adapter-http-reqwest
//!
//! Driven adapter implementing the [`Transport`] port on top of a shared
//! reqwest client.
//!
//! ## Responsibilities
//! - Build one pooled client per process with the configured timeout
//! - Skip server certificate checks when the boot settings ask for
//!   encryption only
//! - Translate [`OutboundRequest`] descriptors into HTTP requests and report
//!   status and reason back
//! - Abort in-flight requests when the caller's token fires
//!
//! ## Dependency rule
//! Depends on `accessgen-app` (port trait) and `accessgen-domain` (settings).

pub mod config;
pub mod error;

use tokio_util::sync::CancellationToken;

use accessgen_app::ports::transport::{
    Method, OutboundRequest, Transport, TransportError, TransportResponse,
};
use accessgen_domain::settings::CertificateValidation;

pub use config::HttpConfig;
pub use error::HttpError;

/// [`Transport`] backed by [`reqwest::Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Build`] when the TLS backend cannot be initialised.
    pub fn new(config: &HttpConfig, validation: CertificateValidation) -> Result<Self, HttpError> {
        if validation.accepts_invalid_certs() {
            tracing::debug!("server certificates are not validated");
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(validation.accepts_invalid_certs())
            .build()
            .map_err(HttpError::Build)?;
        Ok(Self { client })
    }

    fn prepare(&self, request: OutboundRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.uri);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, body.content_type)
                .body(body.bytes);
        }
        builder
    }
}

impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: OutboundRequest,
        cancel: CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        let builder = self.prepare(request);
        let exchange = async {
            let response = builder.send().await.map_err(HttpError::Request)?;
            let status = response.status();
            // Read the body to the end so the connection returns to the pool.
            if let Err(err) = response.bytes().await {
                tracing::trace!(error = %err, "failed to drain response body");
            }
            Ok::<_, HttpError>(TransportResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
            })
        };

        tokio::select! {
            () = cancel.cancelled() => Err(TransportError::Cancelled),
            result = exchange => Ok(result?),
        }
    }
}
