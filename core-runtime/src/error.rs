use thiserror::Error;

/// Startup and wiring failures
#[derive(Error, Debug)]
pub enum Error {
    /// A setting is missing or out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host capability was not injected and has no default
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A default capability could not be constructed
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
