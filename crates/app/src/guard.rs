//! Request guard: per-device timeout budget and pile-up protection.
//!
//! Sends that overrun their budget are cancelled but kept in an outstanding
//! list until they are observed finished. While that list holds
//! [`GuardConfig::ceiling`] entries, new sends are rejected without touching
//! the network. This is a soft limit: admission looks at the list size at
//! call time only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

use crate::error::{DispatchError, ErrorChain};
use crate::ports::transport::{
    Method, OutboundRequest, Transport, TransportError, TransportResponse,
};

/// Default admission ceiling.
pub const DEFAULT_CEILING: usize = 20;
/// Default per-send time budget.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(12);

type SendOutcome = Result<TransportResponse, TransportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// Outstanding sends at which new sends are suppressed.
    pub ceiling: usize,
    /// Time a single send may take before it is cancelled.
    pub budget: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            budget: DEFAULT_BUDGET,
        }
    }
}

/// Admission and timeout control for one device's sends.
#[derive(Debug, Default)]
pub struct RequestGuard {
    config: GuardConfig,
    outstanding: Mutex<Vec<JoinHandle<SendOutcome>>>,
}

impl RequestGuard {
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            outstanding: Mutex::new(Vec::new()),
        }
    }

    /// Number of tracked sends, without purging finished ones.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    /// Purge finished sends, then decide whether a new send may start.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Suppressed`] when the purged list is still at
    /// or above the ceiling.
    pub fn admit(&self) -> Result<(), DispatchError> {
        let mut outstanding = self.lock();
        outstanding.retain(|handle| !handle.is_finished());
        if outstanding.len() >= self.config.ceiling {
            return Err(DispatchError::Suppressed {
                outstanding: outstanding.len(),
            });
        }
        Ok(())
    }

    /// Start `request` on `transport` and race it against the budget.
    ///
    /// The send runs in its own task, which also logs the eventual outcome.
    /// `cancel` aborts the attempt early; the budget cancels it through a
    /// child token.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::TimedOut`] when the budget elapses first, or
    /// [`DispatchError::Transport`] when the send fails.
    pub async fn dispatch<T: Transport>(
        &self,
        transport: Arc<T>,
        request: OutboundRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, DispatchError> {
        let method = request.method;
        let uri = request.uri.clone();
        let attempt = cancel.child_token();

        tracing::trace!(%method, %uri, "sending");
        let mut handle = tokio::spawn(
            observe(transport, request, attempt.clone(), method, uri.clone()).in_current_span(),
        );

        match tokio::time::timeout(self.config.budget, &mut handle).await {
            Ok(Ok(outcome)) => Ok(outcome?),
            Ok(Err(join_err)) => Err(TransportError::Failed(Box::new(join_err)).into()),
            Err(_) => {
                attempt.cancel();
                let outstanding = {
                    let mut list = self.lock();
                    list.push(handle);
                    list.len()
                };
                tracing::warn!(%method, %uri, outstanding, "timed out");
                Err(DispatchError::TimedOut {
                    budget: self.config.budget,
                })
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<SendOutcome>>> {
        self.outstanding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// Runs inside the spawned send task. Logging only, the outcome is passed
// through untouched.
async fn observe<T: Transport>(
    transport: Arc<T>,
    request: OutboundRequest,
    cancel: CancellationToken,
    method: Method,
    uri: Url,
) -> SendOutcome {
    let outcome = transport.execute(request, cancel).await;
    match &outcome {
        Ok(response) => tracing::trace!(%method, %uri, status = response.status, "complete"),
        Err(err) => tracing::warn!(%method, %uri, error = %ErrorChain(err), "failed"),
    }
    outcome
}
