//! # Host Bridge Traits
//!
//! Capability traits that must be implemented by each host embedding the photo bridge.
//!
//! ## Overview
//!
//! This crate defines the contract between the bridge core and host-specific
//! implementations. Each trait represents a capability that the core requires but
//! that the host provides (or that `bridge-desktop` provides by default).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP with timeouts and streamed bodies
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Per-user folders and new-file creation
//!
//! ### Security
//! - [`CredentialStore`](credentials::CredentialStore) - Per-user photo server credentials
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Host implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Keep I/O errors intact (`BridgeError::Io`) so callers can inspect the kind
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent usage
//! across async tasks. Implementations must ensure thread safety.
//!
//! ## Examples
//!
//! ### Implementing CredentialStore
//!
//! ```ignore
//! use bridge_traits::credentials::{CredentialStore, Credentials};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct ConfigTable {
//!     db: Arc<HostDatabase>,
//! }
//!
//! #[async_trait]
//! impl CredentialStore for ConfigTable {
//!     async fn credentials_for(&self, user_id: &str) -> Result<Option<Credentials>> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod credentials;
pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use credentials::{CredentialStore, Credentials};
pub use http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpStreamResponse};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
