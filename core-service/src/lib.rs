//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! credential lookup) into the photo bridge and exposes one method per host
//! endpoint. Desktop apps typically enable the `desktop-shims` feature (which
//! depends on `bridge-desktop`) and only supply a `CredentialStore`.
//!
//! Every method takes a [`RequestContext`] naming the calling user.
//! Credentials are looked up again on each call; nothing is cached between
//! requests.

pub mod error;

pub use error::{CoreError, ErrorPayload, Result};

use bridge_traits::ByteStream;
use core_library::{
    Album, Asset, AssetPersister, ConfigStatus, SearchPage, Tag, TimelineFilters, TimelinePage,
};
use core_runtime::config::BridgeConfig;
use core_runtime::logging::strip_path;
use provider_immich::{BinaryPayload, ImmichConnector, ThumbnailHints};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

#[cfg(feature = "desktop-shims")]
use bridge_traits::CredentialStore;

/// Identity of the host user behind a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    user_id: Option<String>,
}

impl RequestContext {
    /// Context for an authenticated user
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// Context for a request without a logged-in user
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated user id, or [`CoreError::Unauthenticated`]
    pub fn user_id(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(CoreError::Unauthenticated)
    }
}

/// A rendition ready to be streamed to the client
pub struct StreamedAsset {
    pub content_type: String,
    /// How long clients may cache the rendition
    pub cache_max_age: Duration,
    pub body: ByteStream,
}

impl StreamedAsset {
    fn new(payload: BinaryPayload, cache_max_age: Duration) -> Self {
        Self {
            content_type: payload.content_type,
            cache_max_age,
            body: payload.body,
        }
    }

    /// `Cache-Control` header value
    pub fn cache_control(&self) -> String {
        format!("max-age={}", self.cache_max_age.as_secs())
    }
}

impl fmt::Debug for StreamedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamedAsset")
            .field("content_type", &self.content_type)
            .field("cache_max_age", &self.cache_max_age)
            .field("body", &"ByteStream { ... }")
            .finish()
    }
}

/// Answer to a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub success: bool,
    /// `<target>/<file name>` relative to the user's root folder
    pub path: String,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct PhotoBridgeService {
    config: Arc<BridgeConfig>,
    persister: Arc<AssetPersister>,
}

impl PhotoBridgeService {
    /// Create a new service from a validated configuration.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        let persister = AssetPersister::new(Arc::clone(&config.file_system));
        Ok(Self {
            config: Arc::new(config),
            persister: Arc::new(persister),
        })
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Per-request connector for the calling user
    async fn connector(&self, ctx: &RequestContext) -> Result<ImmichConnector> {
        let user_id = ctx.user_id()?;
        let credentials = self
            .config
            .credential_store
            .credentials_for(user_id)
            .await
            .map_err(CoreError::Credentials)?;

        Ok(ImmichConnector::new(
            Arc::clone(&self.config.http_client),
            credentials,
            Arc::clone(&self.config.clock),
            &self.config.upstream,
        )?)
    }

    fn streamed(&self, payload: BinaryPayload) -> StreamedAsset {
        StreamedAsset::new(payload, self.config.upstream.cache_max_age)
    }

    /// Whether the calling user has configured a photo server
    #[instrument(skip(self))]
    pub async fn config_status(&self, ctx: &RequestContext) -> Result<ConfigStatus> {
        let user_id = ctx.user_id()?;
        let credentials = self
            .config
            .credential_store
            .credentials_for(user_id)
            .await
            .map_err(CoreError::Credentials)?;

        Ok(ConfigStatus {
            configured: credentials.is_some(),
            base_url: credentials.map(|c| c.base_url().to_string()),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_albums(&self, ctx: &RequestContext) -> Result<Vec<Album>> {
        let result: Result<Vec<Album>> =
            async { Ok(self.connector(ctx).await?.list_albums().await?) }.await;
        logged("fetch albums", result)
    }

    #[instrument(skip(self))]
    pub async fn get_album(&self, ctx: &RequestContext, album_id: &str) -> Result<Album> {
        let result: Result<Album> =
            async { Ok(self.connector(ctx).await?.get_album(album_id).await?) }.await;
        logged("fetch album", result)
    }

    /// Assets of one album
    #[instrument(skip(self))]
    pub async fn get_assets(&self, ctx: &RequestContext, album_id: &str) -> Result<Vec<Asset>> {
        let result: Result<Vec<Asset>> =
            async { Ok(self.connector(ctx).await?.album_assets(album_id).await?) }.await;
        logged("fetch assets", result)
    }

    #[instrument(skip(self))]
    pub async fn get_tags(&self, ctx: &RequestContext) -> Result<Vec<Tag>> {
        let result: Result<Vec<Tag>> =
            async { Ok(self.connector(ctx).await?.list_tags().await?) }.await;
        logged("fetch tags", result)
    }

    /// One page of the flattened timeline
    ///
    /// Hosts that show "load more" pass `page + 1` and merge the result with
    /// [`TimelinePage::append`].
    #[instrument(skip(self))]
    pub async fn get_timeline(
        &self,
        ctx: &RequestContext,
        filters: &TimelineFilters,
        page: u32,
    ) -> Result<TimelinePage> {
        let result: Result<TimelinePage> =
            async { Ok(self.connector(ctx).await?.timeline(filters, page).await?) }.await;
        logged("fetch timeline", result)
    }

    /// Metadata search; `size` defaults to the configured page size
    #[instrument(skip(self))]
    pub async fn search_assets(
        &self,
        ctx: &RequestContext,
        page: u32,
        size: Option<u32>,
        is_favorite: Option<bool>,
    ) -> Result<SearchPage> {
        let result: Result<SearchPage> = async {
            Ok(self
                .connector(ctx)
                .await?
                .search_metadata(page, size, is_favorite)
                .await?)
        }
        .await;
        logged("search assets", result)
    }

    /// Grid thumbnail
    ///
    /// Only a size hint is forwarded; the server reserves `key` for share keys.
    #[instrument(skip(self))]
    pub async fn get_thumbnail(
        &self,
        ctx: &RequestContext,
        asset_id: &str,
        size: Option<&str>,
    ) -> Result<StreamedAsset> {
        let hints = size
            .filter(|s| !s.is_empty())
            .map(ThumbnailHints::size)
            .unwrap_or_default();
        let result: Result<StreamedAsset> = async {
            let connector = self.connector(ctx).await?;
            Ok(self.streamed(connector.thumbnail(asset_id, &hints).await?))
        }
        .await;
        logged("fetch thumbnail", result)
    }

    /// Lightbox-sized rendition
    #[instrument(skip(self))]
    pub async fn get_preview(&self, ctx: &RequestContext, asset_id: &str) -> Result<StreamedAsset> {
        let result: Result<StreamedAsset> = async {
            let connector = self.connector(ctx).await?;
            Ok(self.streamed(connector.preview(asset_id).await?))
        }
        .await;
        logged("fetch preview", result)
    }

    #[instrument(skip(self))]
    pub async fn get_original(&self, ctx: &RequestContext, asset_id: &str) -> Result<StreamedAsset> {
        let result: Result<StreamedAsset> = async {
            let connector = self.connector(ctx).await?;
            Ok(self.streamed(connector.original(asset_id).await?))
        }
        .await;
        logged("fetch original", result)
    }

    /// Copy an original into the user's storage
    ///
    /// The target folder is checked before the download starts, so an
    /// invalid target never costs an upstream request.
    #[instrument(skip(self))]
    pub async fn save_to_folder(
        &self,
        ctx: &RequestContext,
        asset_id: &str,
        target_path: &str,
        file_name: &str,
    ) -> Result<SaveResult> {
        let result: Result<SaveResult> = async {
            let user_id = ctx.user_id()?;
            let connector = self.connector(ctx).await?;
            let target = self.persister.resolve_target(user_id, target_path).await?;

            let original = connector.original(asset_id).await?;
            let saved = self
                .persister
                .persist(&target, file_name, asset_id, original.body)
                .await?;

            info!(
                file = %strip_path(&saved.path),
                bytes = saved.bytes_written,
                "Saved original to user storage"
            );
            Ok(SaveResult {
                success: true,
                path: saved.path,
            })
        }
        .await;
        logged("save to folder", result)
    }
}

/// Log a failed operation before it reaches the host
fn logged<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        error!(operation, status = e.status_code(), error = %e, "Request failed");
    }
    result
}

/// Build a service with desktop defaults for everything but credentials.
///
/// ```ignore
/// let service = core_service::bootstrap_desktop(Arc::new(ConfigTable::new(pool)))?;
/// let albums = service.get_albums(&RequestContext::for_user("alice")).await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    credential_store: Arc<dyn CredentialStore>,
) -> Result<PhotoBridgeService> {
    let config = BridgeConfig::builder()
        .credential_store(credential_store)
        .build()?;
    PhotoBridgeService::new(config)
}
