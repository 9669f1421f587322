//! OAuth token pair model

use serde::{Deserialize, Serialize};

/// OAuth access/refresh token pair for the Skydrop API.
///
/// Both halves are opaque bearer strings. The pair is always replaced
/// wholesale after a grant-code exchange or a refresh, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token sent as the Bearer credential
    pub access: String,

    /// Long-lived refresh token used to obtain new pairs
    pub refresh: String,
}

impl TokenPair {
    /// Create a new token pair
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// A pair is good only when both halves are present
    pub fn is_good(&self) -> bool {
        !self.access.is_empty() && !self.refresh.is_empty()
    }
}
