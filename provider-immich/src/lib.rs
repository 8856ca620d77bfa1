//! # Immich Provider
//!
//! Client for the Immich photo server REST API.
//!
//! ## Overview
//!
//! - [`UpstreamTransport`] - authenticated JSON and streamed binary calls
//! - [`VariantResolver`] - thumbnail / preview / original renditions with
//!   fallbacks across server versions
//! - [`TimelineAggregator`] - paged "all photos" view built from month buckets
//! - [`ImmichConnector`] - albums, tags and metadata search
//!
//! Every operation is scoped to one user's credentials. A connector is built
//! per request and dropped with it.

pub mod connector;
pub mod error;
pub mod timeline;
pub mod transport;
pub mod types;
pub mod variants;

pub use connector::ImmichConnector;
pub use error::{ImmichError, Result};
pub use timeline::TimelineAggregator;
pub use transport::{build_url, BinaryPayload, UpstreamTransport};
pub use variants::{RenditionVariant, ThumbnailHints, VariantResolver, PREVIEW_VARIANTS};
