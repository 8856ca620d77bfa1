//! # Bridge Configuration Module
//!
//! Provides configuration management for the photo bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `BridgeConfig`
//! instance that holds all necessary capabilities and upstream limits for the
//! bridge. It enforces fail-fast validation so that a missing capability is
//! reported at startup instead of on the first request.
//!
//! ## Required Dependencies
//!
//! - `CredentialStore` - Per-user photo server credentials (always host-provided)
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `FileSystemAccess` - Host file storage (desktop default: tokio fs)
//! - `Clock` - Time source (default: system clock)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `HttpClient` and `FileSystemAccess` are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{BridgeConfig, UpstreamSettings};
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .credential_store(Arc::new(MyCredentialTable::new(pool)))
//!     .upstream(UpstreamSettings::default().with_max_timeline_buckets(12))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, CredentialStore, FileSystemAccess, HttpClient, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Limits and timeouts applied to calls against the photo server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    /// Timeout for JSON requests
    pub json_timeout: Duration,

    /// Timeout for binary downloads (thumbnails, previews, originals)
    pub binary_timeout: Duration,

    /// Number of month buckets visited per timeline page
    pub max_timeline_buckets: usize,

    /// Default page size for metadata search
    pub search_page_size: u32,

    /// Number of calendar years offered when no asset carries a date
    pub year_fallback_span: u32,

    /// Cache lifetime hosts may advertise for streamed renditions
    pub cache_max_age: Duration,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            json_timeout: Duration::from_secs(30),
            binary_timeout: Duration::from_secs(60),
            max_timeline_buckets: 6,
            search_page_size: 100,
            year_fallback_span: 20,
            cache_max_age: Duration::from_secs(3600),
        }
    }
}

impl UpstreamSettings {
    /// Sets the JSON request timeout
    pub fn with_json_timeout(mut self, timeout: Duration) -> Self {
        self.json_timeout = timeout;
        self
    }

    /// Sets the binary download timeout
    pub fn with_binary_timeout(mut self, timeout: Duration) -> Self {
        self.binary_timeout = timeout;
        self
    }

    /// Sets the number of buckets visited per timeline page
    pub fn with_max_timeline_buckets(mut self, buckets: usize) -> Self {
        self.max_timeline_buckets = buckets;
        self
    }

    /// Sets the default metadata search page size
    pub fn with_search_page_size(mut self, size: u32) -> Self {
        self.search_page_size = size;
        self
    }

    /// Sets the fallback year range length
    pub fn with_year_fallback_span(mut self, years: u32) -> Self {
        self.year_fallback_span = years;
        self
    }

    /// Sets the cache lifetime advertised for streamed renditions
    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.cache_max_age = max_age;
        self
    }

    /// Validates the settings
    pub fn validate(&self) -> Result<()> {
        if self.json_timeout.is_zero() {
            return Err(Error::Config(
                "JSON timeout must be greater than zero".to_string(),
            ));
        }

        if self.binary_timeout.is_zero() {
            return Err(Error::Config(
                "Binary timeout must be greater than zero".to_string(),
            ));
        }

        if self.max_timeline_buckets == 0 {
            return Err(Error::Config(
                "Timeline must visit at least one bucket per page".to_string(),
            ));
        }

        if self.search_page_size == 0 {
            return Err(Error::Config(
                "Search page size must be greater than zero".to_string(),
            ));
        }

        if self.year_fallback_span == 0 {
            return Err(Error::Config(
                "Year fallback span must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Bridge configuration.
///
/// This struct holds all capabilities and settings required to serve host
/// requests. Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// HTTP client for upstream requests
    pub http_client: Arc<dyn HttpClient>,

    /// Host file storage for saved originals
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Per-user credential lookup (required)
    pub credential_store: Arc<dyn CredentialStore>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Upstream limits and timeouts
    pub upstream: UpstreamSettings,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("credential_store", &"CredentialStore { ... }")
            .field("clock", &"Clock { ... }")
            .field("upstream", &self.upstream)
            .finish()
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.upstream.validate()
    }
}

fn credential_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "CredentialStore".to_string(),
        message: "CredentialStore implementation is required to look up each user's \
                 photo server URL and API key. Inject an adapter over the host's \
                 credential table."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: ensure the 'desktop-shims' feature is enabled. \
                 Embedded hosts: inject the host's HTTP client adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    Ok(Arc::new(TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "No file system implementation provided. \
                 Desktop: ensure the 'desktop-shims' feature is enabled. \
                 Embedded hosts: inject an adapter over the host's user storage."
            .to_string(),
    })
}

/// Builder for constructing [`BridgeConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](BridgeConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct BridgeConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    credential_store: Option<Arc<dyn CredentialStore>>,
    clock: Option<Arc<dyn Clock>>,
    upstream: Option<UpstreamSettings>,
}

impl BridgeConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the file system access implementation.
    ///
    /// If not provided, the desktop default (tokio fs-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the credential store (required).
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets upstream limits and timeouts.
    pub fn upstream(mut self, settings: UpstreamSettings) -> Self {
        self.upstream = Some(settings);
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No `CredentialStore` was provided
    /// - A capability without a default is missing
    /// - Upstream settings are invalid
    pub fn build(self) -> Result<BridgeConfig> {
        let credential_store = self
            .credential_store
            .ok_or_else(credential_store_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = BridgeConfig {
            http_client,
            file_system,
            credential_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            upstream: self.upstream.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
