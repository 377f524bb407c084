//! Signed dispatcher: one device's authenticated, guarded request path.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use accessgen_domain::device::Device;
use accessgen_domain::error::ValidationError;
use accessgen_domain::id::{RequestId, SessionId};
use accessgen_domain::settings::{BootConfig, CustomHeader};

use crate::error::DispatchError;
use crate::guard::{GuardConfig, RequestGuard};
use crate::ports::transport::{
    Method, OutboundRequest, RequestBody, Transport, TransportResponse,
};
use crate::signer::Signer;

pub const HEADER_DEVICE_SERIAL: &str = "x-gtl-oem-device-serial";
pub const HEADER_REQUEST_ID: &str = "x-gtl-oem-client-request-id";
pub const HEADER_SESSION_ID: &str = "x-gtl-oem-client-session-id";
pub const HEADER_APPLICATION_NAME: &str = "x-gtl-oem-client-application-name";

/// Sends requests for one device: admission, identity headers, signature,
/// then a time-budgeted send.
pub struct SignedDispatcher<T> {
    signer: Signer,
    guard: RequestGuard,
    app_version: String,
    custom_headers: Vec<CustomHeader>,
    transport: Arc<T>,
}

impl<T: Transport> SignedDispatcher<T> {
    /// Set up the dispatcher for `device`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSharedKey`] when the device key
    /// cannot be decoded.
    pub fn new(
        device: &Device,
        boot: &BootConfig,
        transport: Arc<T>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            signer: Signer::from_device(device)?,
            guard: RequestGuard::default(),
            app_version: boot.app_version.clone(),
            custom_headers: boot.custom_headers.clone(),
            transport,
        })
    }

    #[must_use]
    pub fn with_guard_config(mut self, config: GuardConfig) -> Self {
        self.guard = RequestGuard::new(config);
        self
    }

    #[must_use]
    pub fn serial(&self) -> &str {
        self.signer.serial()
    }

    /// Sends tracked after overrunning their budget.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.guard.outstanding()
    }

    /// Send a prepared request.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, DispatchError> {
        self.send_with_cancellation(request, &CancellationToken::new()).await
    }

    /// `POST` `body` to `uri`.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn post(
        &self,
        uri: Url,
        body: RequestBody,
    ) -> Result<TransportResponse, DispatchError> {
        self.send(OutboundRequest::new(Method::Post, uri).with_body(body)).await
    }

    /// `POST` `body` to `uri`, aborting early when `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn post_with_cancellation(
        &self,
        uri: Url,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, DispatchError> {
        let request = OutboundRequest::new(Method::Post, uri).with_body(body);
        self.send_with_cancellation(request, cancel).await
    }

    /// `DELETE` `uri`.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn delete(&self, uri: Url) -> Result<TransportResponse, DispatchError> {
        self.send(OutboundRequest::new(Method::Delete, uri)).await
    }

    #[tracing::instrument(skip_all, fields(device = %self.serial()))]
    async fn send_with_cancellation(
        &self,
        mut request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, DispatchError> {
        if let Err(err) = self.guard.admit() {
            tracing::warn!(
                method = %request.method,
                uri = %request.uri,
                "prevented due to timeout pile-up"
            );
            return Err(err);
        }

        self.stamp(&mut request);
        self.signer.sign(&mut request);
        self.guard
            .dispatch(Arc::clone(&self.transport), request, cancel)
            .await
    }

    fn stamp(&self, request: &mut OutboundRequest) {
        request.push_header(HEADER_DEVICE_SERIAL, self.serial());
        request.push_header(HEADER_REQUEST_ID, RequestId::new().to_string());
        request.push_header(HEADER_SESSION_ID, SessionId::new().to_string());
        request.push_header(HEADER_APPLICATION_NAME, self.app_version.as_str());
        for header in &self.custom_headers {
            request.push_header(header.name.as_str(), header.value.as_str());
        }
    }
}
