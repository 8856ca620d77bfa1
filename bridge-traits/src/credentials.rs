//! Per-user upstream credentials
//!
//! The host owns credential persistence. The core only reads a fresh
//! [`Credentials`] value at the start of each request and drops it when the
//! request completes.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// Connection settings for one user's photo server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    base_url: String,
    api_key: String,
}

impl Credentials {
    /// Create credentials, stripping trailing slashes from the base URL
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Normalized base URL (no trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API key sent as `x-api-key`; never log this value
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Read access to the host's per-user credential table
///
/// # Security
///
/// Implementations must not log or cache the returned API key.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the credentials configured for `user_id`
    ///
    /// Returns `Ok(None)` when the user has not configured a photo server.
    async fn credentials_for(&self, user_id: &str) -> Result<Option<Credentials>>;
}
