//! User: a credential holder presenting a token at a reader.

use serde::{Deserialize, Serialize};

/// A user and the token they present.
///
/// Users form one pool shared by every simulated device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub token_id: String,
    /// Opaque credential payload, forwarded verbatim.
    pub token_data: String,
}

impl User {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        token_id: impl Into<String>,
        token_data: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            token_id: token_id.into(),
            token_data: token_data.into(),
        }
    }
}
