//! Error types for the Immich provider

use thiserror::Error;

/// Immich provider errors
#[derive(Error, Debug)]
pub enum ImmichError {
    /// No base URL / API key stored for the requesting user
    #[error("Photo server not configured")]
    ConfigurationMissing,

    /// Network failure, timeout or non-2xx answer from the photo server
    #[error("Failed to connect to photo server: {message}")]
    UpstreamConnection {
        status: Option<u16>,
        message: String,
    },

    /// Response JSON did not have the expected shape
    #[error("Unexpected response from photo server: {0}")]
    UpstreamShape(String),

    /// Bridge error
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl ImmichError {
    pub(crate) fn connection(status: Option<u16>, message: impl Into<String>) -> Self {
        ImmichError::UpstreamConnection {
            status,
            message: message.into(),
        }
    }

    /// Upstream HTTP status, when the server answered at all
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ImmichError::UpstreamConnection { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type for Immich operations
pub type Result<T> = std::result::Result<T, ImmichError>;
