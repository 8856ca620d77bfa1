//! Immich API connector
//!
//! Typed access to the endpoints the bridge uses. A connector lives for one
//! host request and owns the transport built from that request's credentials.

use bridge_traits::http::HttpClient;
use bridge_traits::{Clock, Credentials};
use core_library::{Album, Asset, SearchPage, Tag, TimelineFilters, TimelinePage};
use core_runtime::config::UpstreamSettings;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::timeline::TimelineAggregator;
use crate::transport::{BinaryPayload, UpstreamTransport};
use crate::types::{decode_album, decode_albums, decode_search, decode_tags};
use crate::variants::{ThumbnailHints, VariantResolver};

/// Request body for `POST /search/metadata`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataSearch {
    page: u32,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_favorite: Option<bool>,
}

/// Immich API connector
///
/// # Example
///
/// ```ignore
/// use provider_immich::ImmichConnector;
///
/// let creds = credential_store.credentials_for(user_id).await?;
/// let connector = ImmichConnector::new(http_client, creds, clock, &settings)?;
/// let albums = connector.list_albums().await?;
/// ```
pub struct ImmichConnector {
    transport: UpstreamTransport,
    clock: Arc<dyn Clock>,
    settings: UpstreamSettings,
}

impl ImmichConnector {
    /// Create a connector for one user's credentials
    ///
    /// Fails with `ConfigurationMissing` when `credentials` is `None`.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        credentials: Option<Credentials>,
        clock: Arc<dyn Clock>,
        settings: &UpstreamSettings,
    ) -> Result<Self> {
        Ok(Self {
            transport: UpstreamTransport::new(http_client, credentials, settings)?,
            clock,
            settings: settings.clone(),
        })
    }

    pub fn transport(&self) -> &UpstreamTransport {
        &self.transport
    }

    /// List all albums
    #[instrument(skip(self))]
    pub async fn list_albums(&self) -> Result<Vec<Album>> {
        let raw = self.transport.get_json("albums").await?;
        let albums: Vec<Album> = decode_albums(raw)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Treating unexpected album list as empty");
                Vec::new()
            })
            .into_iter()
            .map(Album::from)
            .collect();

        info!("Listed {} albums", albums.len());
        Ok(albums)
    }

    /// Fetch one album
    #[instrument(skip(self))]
    pub async fn get_album(&self, album_id: &str) -> Result<Album> {
        let raw = self
            .transport
            .get_json(&format!("albums/{}", urlencoding::encode(album_id)))
            .await?;
        let album = decode_album(raw).unwrap_or_else(|e| {
            warn!(error = %e, "Treating unexpected album body as empty");
            Default::default()
        });
        Ok(Album::from(album))
    }

    /// Assets nested in an album's detail
    #[instrument(skip(self))]
    pub async fn album_assets(&self, album_id: &str) -> Result<Vec<Asset>> {
        let raw = self
            .transport
            .get_json(&format!("albums/{}", urlencoding::encode(album_id)))
            .await?;
        let assets = match decode_album(raw) {
            Ok(album) => album.assets.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Treating unexpected album body as empty");
                Vec::new()
            }
        };
        Ok(assets.into_iter().map(Asset::from).collect())
    }

    /// List all tags
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let raw = self.transport.get_json("tags").await?;
        let tags = decode_tags(raw).unwrap_or_else(|e| {
            warn!(error = %e, "Treating unexpected tag list as empty");
            Vec::new()
        });
        Ok(tags.into_iter().map(Tag::from).collect())
    }

    /// One page of metadata search results
    ///
    /// `size` defaults to the configured search page size.
    #[instrument(skip(self))]
    pub async fn search_metadata(
        &self,
        page: u32,
        size: Option<u32>,
        is_favorite: Option<bool>,
    ) -> Result<SearchPage> {
        let body = MetadataSearch {
            page: page.max(1),
            size: size.filter(|s| *s > 0).unwrap_or(self.settings.search_page_size),
            is_favorite,
        };
        let raw = self.transport.post_json("search/metadata", &body).await?;
        let response = decode_search(raw).unwrap_or_else(|e| {
            warn!(error = %e, "Treating unexpected search result as empty");
            Default::default()
        });

        let next_page = response.assets.next_page();
        let assets: Vec<Asset> = response.assets.items.into_iter().map(Asset::from).collect();
        let total = response.assets.total.unwrap_or(assets.len() as u64);

        Ok(SearchPage {
            assets,
            total,
            next_page,
        })
    }

    /// One page of the flattened timeline
    pub async fn timeline(&self, filters: &TimelineFilters, page: u32) -> Result<TimelinePage> {
        TimelineAggregator::new(
            &self.transport,
            self.clock.as_ref(),
            self.settings.max_timeline_buckets,
            self.settings.year_fallback_span,
        )
        .fetch_page(filters, page)
        .await
    }

    pub async fn thumbnail(&self, asset_id: &str, hints: &ThumbnailHints) -> Result<BinaryPayload> {
        VariantResolver::new(&self.transport)
            .resolve_thumbnail(asset_id, hints)
            .await
    }

    pub async fn preview(&self, asset_id: &str) -> Result<BinaryPayload> {
        VariantResolver::new(&self.transport)
            .resolve_preview(asset_id)
            .await
    }

    pub async fn original(&self, asset_id: &str) -> Result<BinaryPayload> {
        VariantResolver::new(&self.transport)
            .resolve_original(asset_id)
            .await
    }
}
