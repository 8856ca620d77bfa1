//! # Photo Library Projections
//!
//! Host-facing view of the remote photo library and the one place where the
//! bridge touches host storage.
//!
//! ## Overview
//!
//! This module provides:
//! - Read-only projections of upstream albums, assets and tags
//! - Timeline and search page types, including year facets
//! - [`AssetPersister`], which writes a downloaded original into a user's
//!   folder without overwriting existing files

pub mod error;
pub mod models;
pub mod persister;

pub use error::{PersistError, Result};
pub use models::{
    Album, Asset, AssetType, ConfigStatus, SearchPage, Tag, TimelineFilters, TimelinePage,
};
pub use persister::{AssetPersister, SavedAsset, TargetFolder};
