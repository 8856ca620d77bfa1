//! Flattened "all photos" timeline
//!
//! The photo server only lists assets per month bucket. A timeline page is
//! built by walking a window of buckets in server order and concatenating
//! their assets:
//!
//! - page `n` (1-based) covers keyed buckets `(n - 1) * cap .. n * cap`
//! - buckets without a key are skipped and do not count toward the cap
//! - `total` is the sum of the server's per-bucket counts
//! - `years` comes from asset dates, or a fallback range when none are dated

use bridge_traits::Clock;
use core_library::models::{fallback_years, years_from_assets};
use core_library::{Asset, TimelineFilters, TimelinePage};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::transport::UpstreamTransport;
use crate::types::{decode_bucket_assets, decode_buckets, BucketSummary};

/// Bucket granularity requested from the server
const BUCKET_SIZE: &str = "MONTH";

/// Filter parameters shared by the bucket list and bucket detail calls
fn filter_query(filters: &TimelineFilters) -> String {
    let mut query = String::new();
    if filters.is_favorite {
        query.push_str("&isFavorite=true");
    }
    if let Some(year) = filters.year {
        query.push_str(&format!("&year={}", year));
    }
    if let Some(rating) = filters.rating {
        query.push_str(&format!("&rating={}", rating));
    }
    query
}

/// Builds timeline pages out of month buckets
pub struct TimelineAggregator<'a> {
    transport: &'a UpstreamTransport,
    clock: &'a dyn Clock,
    max_buckets: usize,
    year_fallback_span: u32,
}

impl<'a> TimelineAggregator<'a> {
    pub fn new(
        transport: &'a UpstreamTransport,
        clock: &'a dyn Clock,
        max_buckets: usize,
        year_fallback_span: u32,
    ) -> Self {
        Self {
            transport,
            clock,
            max_buckets: max_buckets.max(1),
            year_fallback_span,
        }
    }

    /// Fetch page `page` of the timeline (`0` is treated as `1`)
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, filters: &TimelineFilters, page: u32) -> Result<TimelinePage> {
        let page = page.max(1);
        let query = filter_query(filters);

        let raw = self
            .transport
            .get_json(&format!("asset/timeBuckets?timeBucket={}{}", BUCKET_SIZE, query))
            .await?;
        let buckets: Vec<BucketSummary> = decode_or_empty(raw, decode_buckets, "time buckets");

        let keys: Vec<&str> = buckets.iter().filter_map(BucketSummary::key).collect();
        let total: u64 = buckets
            .iter()
            .filter(|b| b.key().is_some())
            .filter_map(|b| b.count)
            .sum();

        let skip = (page as usize - 1).saturating_mul(self.max_buckets);
        let window: Vec<&str> = keys
            .iter()
            .skip(skip)
            .take(self.max_buckets)
            .copied()
            .collect();
        let has_more = keys.len() > skip.saturating_add(window.len());

        let mut assets: Vec<Asset> = Vec::new();
        for key in &window {
            let raw = self
                .transport
                .get_json(&format!(
                    "asset/timeBucket?timeBucket={}{}",
                    urlencoding::encode(key),
                    query
                ))
                .await?;
            let bucket_assets = decode_or_empty(raw, decode_bucket_assets, "time bucket");
            debug!(bucket = %key, count = bucket_assets.len(), "Loaded time bucket");
            assets.extend(bucket_assets.into_iter().map(Asset::from));
        }

        let mut years = years_from_assets(&assets);
        if years.is_empty() {
            years = fallback_years(self.clock.current_year(), self.year_fallback_span);
        }

        debug!(
            page,
            buckets = window.len(),
            assets = assets.len(),
            has_more,
            "Built timeline page"
        );

        Ok(TimelinePage {
            assets,
            page,
            has_more,
            total,
            years,
        })
    }
}

/// Run a shape decoder, logging and substituting an empty list on mismatch
fn decode_or_empty<T>(
    raw: Value,
    decoder: fn(Value) -> Result<Vec<T>>,
    what: &str,
) -> Vec<T> {
    decoder(raw).unwrap_or_else(|e| {
        warn!(error = %e, "Treating unexpected {} response as empty", what);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImmichError;
    use crate::transport::tests::{json_response, transport, MockHttpClient};
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use chrono::{DateTime, TimeZone, Utc};

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
        }
    }

    const BASE: &str = "https://photos.example.com/api/";

    fn endpoint(req: &HttpRequest) -> &str {
        req.url.strip_prefix(BASE).unwrap_or_default()
    }

    /// Serve `keys` as the bucket list and one dated asset per bucket, named after it
    fn respond(keys: &[&str], req: &HttpRequest) -> HttpResponse {
        let endpoint = endpoint(req);

        if endpoint.starts_with("asset/timeBuckets?") {
            let entries: Vec<String> = keys
                .iter()
                .map(|k| format!(r#"{{"timeBucket":"{}","count":1}}"#, k))
                .collect();
            return json_response(200, &format!("[{}]", entries.join(",")));
        }

        let key = endpoint
            .strip_prefix("asset/timeBucket?timeBucket=")
            .and_then(|rest| rest.split('&').next())
            .unwrap_or_default();
        json_response(
            200,
            &format!(
                r#"[{{"id":"{}","fileCreatedAt":"{}-01T00:00:00Z"}}]"#,
                key, key
            ),
        )
    }

    fn ids(page: &TimelinePage) -> Vec<&str> {
        page.assets.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_bucket_order_is_preserved() {
        const KEYS: &[&str] = &["2024-03", "2024-02", "2024-01"];
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(4)
            .returning(|req| Ok(respond(KEYS, &req)));

        let transport = transport(client);
        let page = TimelineAggregator::new(&transport, &FixedClock, 6, 20)
            .fetch_page(&TimelineFilters::default(), 1)
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["2024-03", "2024-02", "2024-01"]);
        assert_eq!(page.page, 1);
        assert!(!page.has_more);
        assert_eq!(page.total, 3);
        assert_eq!(page.years, vec![2024]);
    }

    #[tokio::test]
    async fn test_never_visits_more_than_cap() {
        const KEYS: &[&str] = &[
            "2024-08", "2024-07", "2024-06", "2024-05", "2024-04", "2024-03", "2024-02", "2024-01",
        ];
        let mut client = MockHttpClient::new();
        // Bucket list plus six detail calls
        client
            .expect_execute()
            .times(7)
            .returning(|req| Ok(respond(KEYS, &req)));

        let transport = transport(client);
        let page = TimelineAggregator::new(&transport, &FixedClock, 6, 20)
            .fetch_page(&TimelineFilters::default(), 1)
            .await
            .unwrap();

        assert_eq!(page.assets.len(), 6);
        assert_eq!(ids(&page).first(), Some(&"2024-08"));
        assert_eq!(ids(&page).last(), Some(&"2024-03"));
        assert!(page.has_more);
        assert_eq!(page.total, 8);
    }

    #[tokio::test]
    async fn test_second_page_continues_after_first_window() {
        const KEYS: &[&str] = &[
            "2024-08", "2024-07", "2024-06", "2024-05", "2024-04", "2024-03", "2024-02", "2024-01",
        ];
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(3)
            .returning(|req| Ok(respond(KEYS, &req)));

        let transport = transport(client);
        let page = TimelineAggregator::new(&transport, &FixedClock, 6, 20)
            .fetch_page(&TimelineFilters::default(), 2)
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["2024-02", "2024-01"]);
        assert_eq!(page.page, 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_filters_are_forwarded_to_both_calls() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|req| req.url.ends_with("&isFavorite=true&year=2023&rating=4"))
            .times(2)
            .returning(|req| Ok(respond(&["2023-05"], &req)));

        let filters = TimelineFilters {
            is_favorite: true,
            year: Some(2023),
            rating: Some(4),
        };
        let transport = transport(client);
        let page = TimelineAggregator::new(&transport, &FixedClock, 6, 20)
            .fetch_page(&filters, 1)
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["2023-05"]);
    }

    #[tokio::test]
    async fn test_keyless_buckets_are_skipped_and_single_objects_kept() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|req| endpoint(req).starts_with("asset/timeBuckets?"))
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"[{"count":5},{"timeBucket":"2024-02-01T00:00:00.000Z","count":1},{"timeBucket":"","count":9}]"#,
                ))
            });
        client
            .expect_execute()
            .withf(|req| {
                endpoint(req)
                    == "asset/timeBucket?timeBucket=2024-02-01T00%3A00%3A00.000Z"
            })
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"id":"solo","type":"VIDEO"}"#)));

        let transport = transport(client);
        let page = TimelineAggregator::new(&transport, &FixedClock, 6, 20)
            .fetch_page(&TimelineFilters::default(), 1)
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["solo"]);
        assert_eq!(page.total, 1);
        // No dated assets: twenty years ending at the clock's year
        assert_eq!(page.years.len(), 20);
        assert_eq!(page.years.first(), Some(&2026));
        assert_eq!(page.years.last(), Some(&2007));
    }

    #[tokio::test]
    async fn test_unexpected_bucket_list_shape_is_empty_page() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"message":"unexpected"}"#)));

        let transport = transport(client);
        let page = TimelineAggregator::new(&transport, &FixedClock, 6, 20)
            .fetch_page(&TimelineFilters::default(), 1)
            .await
            .unwrap();

        assert!(page.assets.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_bucket_detail_failure_propagates() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|req| endpoint(req).starts_with("asset/timeBuckets?"))
            .returning(|_| Ok(json_response(200, r#"[{"timeBucket":"2024-01","count":2}]"#)));
        client
            .expect_execute()
            .withf(|req| endpoint(req).starts_with("asset/timeBucket?"))
            .returning(|_| Ok(json_response(500, "boom")));

        let transport = transport(client);
        let err = TimelineAggregator::new(&transport, &FixedClock, 6, 20)
            .fetch_page(&TimelineFilters::default(), 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImmichError::UpstreamConnection {
                status: Some(500),
                ..
            }
        ));
    }
}
