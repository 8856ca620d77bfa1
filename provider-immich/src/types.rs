//! Immich API response types
//!
//! The photo server omits optional fields freely and returns a bare object
//! instead of a one-element list for single-asset buckets. Every field here
//! is therefore optional, and the `decode_*` functions are the only place
//! where raw JSON becomes typed data. They report
//! [`ImmichError::UpstreamShape`] so callers can log and substitute an empty
//! value instead of failing the request.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use core_library::{Album, Asset, AssetType, Tag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ImmichError, Result};

/// Album resource (`GET /albums`, `GET /albums/{id}`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub album_name: Option<String>,

    #[serde(default)]
    pub asset_count: Option<i64>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Only present on the album detail endpoint
    #[serde(default)]
    pub assets: Option<Vec<AssetResponse>>,
}

/// Asset resource
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub original_file_name: Option<String>,

    #[serde(default)]
    pub original_path: Option<String>,

    #[serde(default, rename = "type")]
    pub asset_type: Option<String>,

    #[serde(default)]
    pub is_favorite: Option<bool>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub file_created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub local_date_time: Option<DateTime<Utc>>,
}

/// Timestamp field that never fails the surrounding object
///
/// Accepts RFC 3339, a naive date-time (read as UTC) or a plain date.
/// Anything else, including non-strings, decodes as `None`.
fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Tag resource (`GET /tags`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub value: Option<String>,
}

/// Entry of `GET /asset/timeBuckets`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    #[serde(default)]
    pub time_bucket: Option<String>,

    #[serde(default)]
    pub count: Option<u64>,
}

impl BucketSummary {
    /// Bucket key, if present and non-empty
    pub fn key(&self) -> Option<&str> {
        self.time_bucket.as_deref().filter(|k| !k.is_empty())
    }
}

/// Body of `GET /asset/timeBucket`
///
/// A list for most buckets, a bare asset object for some single-asset ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BucketAssets {
    List(Vec<Value>),
    Single(Box<AssetResponse>),
}

/// Body of `POST /search/metadata`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub assets: SearchAssets,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAssets {
    #[serde(default)]
    pub items: Vec<AssetResponse>,

    #[serde(default)]
    pub total: Option<u64>,

    /// Sent as a string by the server (`"2"`), tolerated as a number
    #[serde(default)]
    pub next_page: Option<Value>,
}

impl SearchAssets {
    pub fn next_page(&self) -> Option<u32> {
        match self.next_page.as_ref()? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        }
    }
}

// =============================================================================
// Decoders
// =============================================================================

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ImmichError::UpstreamShape(format!("{}: {}", what, e)))
}

/// Decode a JSON list, dropping entries that do not fit `T`
fn decode_list<T: DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        other => Err(ImmichError::UpstreamShape(format!(
            "{}: expected a list, got {}",
            what,
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

pub fn decode_albums(value: Value) -> Result<Vec<AlbumResponse>> {
    decode_list(value, "album list")
}

pub fn decode_album(value: Value) -> Result<AlbumResponse> {
    decode(value, "album")
}

pub fn decode_tags(value: Value) -> Result<Vec<TagResponse>> {
    decode_list(value, "tag list")
}

pub fn decode_buckets(value: Value) -> Result<Vec<BucketSummary>> {
    decode_list(value, "time bucket list")
}

pub fn decode_search(value: Value) -> Result<SearchResponse> {
    decode(value, "search result")
}

/// Normalize a bucket detail body into assets that carry an id
///
/// An empty object (what an empty body decodes to) yields an empty list.
pub fn decode_bucket_assets(value: Value) -> Result<Vec<AssetResponse>> {
    let assets = match decode::<BucketAssets>(value, "time bucket")? {
        BucketAssets::List(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<AssetResponse>(item).ok())
            .collect(),
        BucketAssets::Single(asset) => vec![*asset],
    };

    Ok(assets.into_iter().filter(|a| a.id.is_some()).collect())
}

// =============================================================================
// Projections
// =============================================================================

impl From<AlbumResponse> for Album {
    fn from(album: AlbumResponse) -> Self {
        Album {
            id: album.id.unwrap_or_default(),
            title: album.album_name.unwrap_or_else(|| "Untitled".to_string()),
            asset_count: album.asset_count.unwrap_or(0),
            created_at: album.created_at,
            updated_at: album.updated_at,
        }
    }
}

impl From<AssetResponse> for Asset {
    fn from(asset: AssetResponse) -> Self {
        Asset {
            id: asset.id.unwrap_or_default(),
            file_name: asset
                .original_file_name
                .or(asset.original_path)
                .unwrap_or_else(|| "Unknown".to_string()),
            asset_type: AssetType::from_upstream(asset.asset_type.as_deref()),
            is_favorite: asset.is_favorite.unwrap_or(false),
            file_date: asset.file_created_at.or(asset.local_date_time),
        }
    }
}

impl From<TagResponse> for Tag {
    fn from(tag: TagResponse) -> Self {
        Tag {
            id: tag.id.unwrap_or_default(),
            name: tag
                .name
                .clone()
                .or_else(|| tag.value.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            value: tag.value.or(tag.name).unwrap_or_default(),
        }
    }
}
