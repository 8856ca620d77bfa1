use bridge_traits::error::BridgeError;
use core_library::PersistError;
use provider_immich::ImmichError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced to the host boundary
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Core initialization failed: {0}")]
    InitializationFailed(#[from] core_runtime::Error),

    #[error("Credential lookup failed: {0}")]
    Credentials(BridgeError),

    #[error(transparent)]
    Upstream(#[from] ImmichError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// JSON body returned alongside a failure status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl CoreError {
    /// HTTP status the host should answer with
    ///
    /// A missing configuration is reported as 412 so hosts can send the user
    /// to the settings screen instead of showing a server failure.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Unauthenticated => 401,
            CoreError::Upstream(ImmichError::ConfigurationMissing) => 412,
            CoreError::Upstream(ImmichError::Bridge(_)) => 500,
            CoreError::Upstream(_) => 502,
            CoreError::Persist(e) if e.is_conflict() => 400,
            CoreError::Persist(_) => 500,
            CoreError::InitializationFailed(_) | CoreError::Credentials(_) => 500,
        }
    }

    /// `{"error": "..."}` body for this failure
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
        }
    }

    /// Whether the user still has to configure a photo server
    pub fn is_not_configured(&self) -> bool {
        matches!(self, CoreError::Upstream(ImmichError::ConfigurationMissing))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
