//! Dispatch error types and log formatting for error chains.

use std::fmt;
use std::time::Duration;

use crate::ports::transport::TransportError;

/// Why a guarded send produced no response.
///
/// All variants are non-fatal for the simulation loop.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Rejected before any network attempt because too many earlier sends
    /// are still unresolved.
    #[error("send suppressed: timeout pile-up ({outstanding} outstanding)")]
    Suppressed { outstanding: usize },

    /// The send overran its budget and was cancelled.
    #[error("request timed out after {budget:?}")]
    TimedOut { budget: Duration },

    #[error("transport error")]
    Transport(#[from] TransportError),
}

/// Renders an error followed by every `source()` in its chain.
///
/// ```
/// use accessgen_app::error::{DispatchError, ErrorChain};
/// use accessgen_app::ports::transport::TransportError;
///
/// let err = DispatchError::Transport(TransportError::Cancelled);
/// assert_eq!(ErrorChain(&err).to_string(), "transport error: request cancelled");
/// ```
pub struct ErrorChain<'a>(pub &'a (dyn std::error::Error + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
