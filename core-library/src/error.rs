use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Failures while saving an asset into host storage
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Target folder does not exist: {0}")]
    TargetMissing(String),

    #[error("Target is not a folder: {0}")]
    TargetNotFolder(String),

    #[error("Invalid target path: {0}")]
    InvalidTarget(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Failed to write file: {0}")]
    Write(String),

    #[error("Storage error: {0}")]
    Storage(#[from] BridgeError),
}

impl PersistError {
    /// True for request-level validation failures raised before any write
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            PersistError::TargetMissing(_)
                | PersistError::TargetNotFolder(_)
                | PersistError::InvalidTarget(_)
                | PersistError::InvalidFileName(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
