//! Domain models for the photo library
//!
//! Every type here is a transient projection of upstream state at request
//! time. Nothing is persisted; field names serialize in camelCase so the
//! host can hand them straight to its UI.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// =============================================================================
// Albums and tags
// =============================================================================

/// Album summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub title: String,
    pub asset_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Tag summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub value: String,
}

// =============================================================================
// Assets
// =============================================================================

/// Media kind of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Image,
    Video,
    Other,
}

impl AssetType {
    /// Map the upstream `type` string; absent means image
    pub fn from_upstream(value: Option<&str>) -> Self {
        match value {
            None => AssetType::Image,
            Some(v) if v.eq_ignore_ascii_case("IMAGE") => AssetType::Image,
            Some(v) if v.eq_ignore_ascii_case("VIDEO") => AssetType::Video,
            Some(_) => AssetType::Other,
        }
    }
}

/// Asset summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub file_name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub is_favorite: bool,
    pub file_date: Option<DateTime<Utc>>,
}

/// Distinct years present in asset dates, newest first
pub fn years_from_assets(assets: &[Asset]) -> Vec<i32> {
    let years: BTreeSet<i32> = assets
        .iter()
        .filter_map(|a| a.file_date.map(|d| d.year()))
        .collect();
    years.into_iter().rev().collect()
}

/// `span` consecutive years ending at `current_year`, newest first
pub fn fallback_years(current_year: i32, span: u32) -> Vec<i32> {
    (0..span as i32).map(|offset| current_year - offset).collect()
}

// =============================================================================
// Timeline
// =============================================================================

/// Filters accepted by the timeline
///
/// Only `is_favorite` is guaranteed to be honoured; `year` and `rating` are
/// forwarded upstream and not re-checked locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineFilters {
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<u8>,
}

/// One page of the flattened timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePage {
    pub assets: Vec<Asset>,
    /// 1-based page index of the last window included
    pub page: u32,
    pub has_more: bool,
    /// Best-effort asset count across all buckets
    pub total: u64,
    /// Year facet for the filter selector
    pub years: Vec<i32>,
}

impl TimelinePage {
    /// Extend this page with the following one
    ///
    /// Assets already present are skipped; bucket order is preserved.
    pub fn append(&mut self, next: TimelinePage) {
        let mut seen: HashSet<String> = self.assets.iter().map(|a| a.id.clone()).collect();
        self.assets
            .extend(next.assets.into_iter().filter(|a| seen.insert(a.id.clone())));

        self.page = next.page;
        self.has_more = next.has_more;
        self.total = self.total.max(next.total);

        let years = years_from_assets(&self.assets);
        if !years.is_empty() {
            self.years = years;
        } else if self.years.is_empty() {
            self.years = next.years;
        }
    }
}

// =============================================================================
// Search and configuration
// =============================================================================

/// One page of metadata search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub assets: Vec<Asset>,
    pub total: u64,
    pub next_page: Option<u32>,
}

/// Whether the current user has configured a photo server
///
/// The API key is never part of this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatus {
    pub configured: bool,
    pub base_url: Option<String>,
}
