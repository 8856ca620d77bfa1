//! Rendition lookup across photo server versions
//!
//! Servers have accepted different query parameters for the larger
//! "preview" rendition over time. Rather than detecting the version, the
//! resolver probes an ordered list of [`RenditionVariant`]s and keeps the
//! first answer that passes the variant's check.

use std::fmt;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::transport::{BinaryPayload, UpstreamTransport};

/// One way of asking for a rendition
#[derive(Clone, Copy)]
pub struct RenditionVariant {
    /// Query string appended to the thumbnail endpoint
    pub query: &'static str,
    /// Whether a successful answer is usable
    pub accepts: fn(&BinaryPayload) -> bool,
}

impl fmt::Debug for RenditionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenditionVariant")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// Preview probes, in the order they are tried
pub const PREVIEW_VARIANTS: &[RenditionVariant] = &[
    RenditionVariant {
        query: "key=preview",
        accepts: BinaryPayload::is_image,
    },
    RenditionVariant {
        query: "key=preview&format=WEBP",
        accepts: BinaryPayload::is_image,
    },
    RenditionVariant {
        query: "size=preview",
        accepts: BinaryPayload::is_image,
    },
];

/// Optional query hints for a thumbnail request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailHints {
    pub size: Option<String>,
    pub key: Option<String>,
    pub format: Option<String>,
}

impl ThumbnailHints {
    pub fn size(size: impl Into<String>) -> Self {
        Self {
            size: Some(size.into()),
            ..Default::default()
        }
    }

    /// Encoded query string, or `None` when no hint is set
    pub fn query(&self) -> Option<String> {
        let pairs: Vec<String> = [
            ("size", &self.size),
            ("key", &self.key),
            ("format", &self.format),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", name, urlencoding::encode(v)))
        })
        .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("&"))
        }
    }
}

fn thumbnail_endpoint(asset_id: &str) -> String {
    format!("assets/{}/thumbnail", urlencoding::encode(asset_id))
}

fn original_endpoint(asset_id: &str) -> String {
    format!("assets/{}/original", urlencoding::encode(asset_id))
}

/// Picks the best available rendition of an asset
pub struct VariantResolver<'a> {
    transport: &'a UpstreamTransport,
    preview_variants: &'a [RenditionVariant],
}

impl<'a> VariantResolver<'a> {
    pub fn new(transport: &'a UpstreamTransport) -> Self {
        Self {
            transport,
            preview_variants: PREVIEW_VARIANTS,
        }
    }

    /// Replace the preview probe list
    pub fn with_preview_variants(mut self, variants: &'a [RenditionVariant]) -> Self {
        self.preview_variants = variants;
        self
    }

    /// Thumbnail, honouring `hints` when the server accepts them
    ///
    /// A failed hinted request is retried once without hints; only the
    /// plain request's failure is reported.
    #[instrument(skip(self))]
    pub async fn resolve_thumbnail(
        &self,
        asset_id: &str,
        hints: &ThumbnailHints,
    ) -> Result<BinaryPayload> {
        let endpoint = thumbnail_endpoint(asset_id);

        if let Some(query) = hints.query() {
            match self
                .transport
                .get_binary(&format!("{}?{}", endpoint, query))
                .await
            {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    debug!(error = %e, "Hinted thumbnail failed, using plain thumbnail");
                }
            }
        }

        self.transport.get_binary(&endpoint).await
    }

    /// Preview-sized rendition, falling back to the plain thumbnail
    #[instrument(skip(self))]
    pub async fn resolve_preview(&self, asset_id: &str) -> Result<BinaryPayload> {
        let endpoint = thumbnail_endpoint(asset_id);

        for variant in self.preview_variants {
            match self
                .transport
                .get_binary(&format!("{}?{}", endpoint, variant.query))
                .await
            {
                Ok(payload) if (variant.accepts)(&payload) => {
                    debug!(variant = variant.query, "Preview variant accepted");
                    return Ok(payload);
                }
                Ok(payload) => {
                    debug!(
                        variant = variant.query,
                        content_type = %payload.content_type,
                        "Preview variant rejected"
                    );
                }
                Err(e) => {
                    debug!(variant = variant.query, error = %e, "Preview variant failed");
                }
            }
        }

        self.resolve_thumbnail(asset_id, &ThumbnailHints::default())
            .await
    }

    /// Original file, single stable endpoint
    #[instrument(skip(self))]
    pub async fn resolve_original(&self, asset_id: &str) -> Result<BinaryPayload> {
        self.transport.get_binary(&original_endpoint(asset_id)).await
    }
}
