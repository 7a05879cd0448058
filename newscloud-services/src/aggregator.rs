//! Feed Aggregator
//!
//! Fans out one fetch per feed URL, then merges the results into a single
//! balanced item set: age-filtered, deduplicated by (title, link), capped per
//! source and shuffled.
//!
//! Each stage is a plain function so it can be exercised on its own; the
//! async [`FeedAggregator::aggregate`] only adds the concurrent fetch and the
//! wall clock.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument};

use newscloud_core::{AggregatedSet, CoreError, CoreResult, FeedItem};
use newscloud_feeds::FeedClient;

/// Items requested from each feed before post-filtering
pub const DEFAULT_FETCH_PER_FEED: usize = 50;

/// Largest accepted age window: ten years
pub const MAX_AGE_HOURS_LIMIT: u32 = 24 * 365 * 10;

/// Configuration for [`FeedAggregator`]
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Most items any single source may contribute to the final set
    pub max_per_source: usize,
    /// Items older than this are dropped
    pub max_age_hours: u32,
    /// Per-feed fetch cap; headroom above `max_per_source` for filtering
    pub fetch_per_feed: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::new(24, 48)
    }
}

impl AggregatorConfig {
    pub fn new(max_per_source: usize, max_age_hours: u32) -> Self {
        Self {
            max_per_source,
            max_age_hours,
            fetch_per_feed: DEFAULT_FETCH_PER_FEED.max(max_per_source.saturating_mul(2)),
        }
    }

    /// Reject values that indicate misconfiguration
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_per_source == 0 {
            return Err(CoreError::invalid_value("max_per_source", "must be at least 1"));
        }
        if self.max_age_hours == 0 || self.max_age_hours > MAX_AGE_HOURS_LIMIT {
            return Err(CoreError::invalid_value(
                "max_age_hours",
                format!("{} is outside 1..={}", self.max_age_hours, MAX_AGE_HOURS_LIMIT),
            ));
        }
        if self.fetch_per_feed <= self.max_per_source {
            return Err(CoreError::invalid_value(
                "fetch_per_feed",
                format!(
                    "{} leaves no headroom above max_per_source ({})",
                    self.fetch_per_feed, self.max_per_source
                ),
            ));
        }
        Ok(())
    }

    /// Oldest publish time still accepted at `now`.
    ///
    /// Saturates at the earliest representable time instead of overflowing.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_hours(i64::from(self.max_age_hours))
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Counts from one aggregation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSummary {
    pub feeds_requested: usize,
    pub items_fetched: usize,
    pub items_kept: usize,
}

/// Keep items published at or after `cutoff`
pub fn filter_by_age(mut items: Vec<FeedItem>, cutoff: DateTime<Utc>) -> Vec<FeedItem> {
    items.retain(|item| item.published_at >= cutoff);
    items
}

/// Drop repeated (trimmed title, link) pairs, keeping the first one seen
pub fn deduplicate(items: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let (title, link) = item.identity();
            seen.insert((title.to_string(), link.to_string()))
        })
        .collect()
}

/// Stable sort by publish time, newest first
pub fn sort_newest_first(items: &mut [FeedItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Keep at most `cap` items per source, preserving the incoming order
pub fn cap_per_source(items: Vec<FeedItem>, cap: usize) -> Vec<FeedItem> {
    let mut taken: HashMap<String, usize> = HashMap::new();
    items
        .into_iter()
        .filter(|item| {
            let count = taken.entry(item.source.clone()).or_insert(0);
            *count += 1;
            *count <= cap
        })
        .collect()
}

/// Run every post-fetch stage in order and shuffle the result
pub fn aggregate_items<R: Rng + ?Sized>(
    items: Vec<FeedItem>,
    config: &AggregatorConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<FeedItem> {
    let fresh = filter_by_age(items, config.cutoff(now));
    let mut unique = deduplicate(fresh);
    sort_newest_first(&mut unique);

    let mut balanced = cap_per_source(unique, config.max_per_source);
    balanced.shuffle(rng);
    balanced
}

/// Fetches many feeds concurrently and merges them into one set
#[derive(Debug, Clone)]
pub struct FeedAggregator {
    client: FeedClient,
    config: AggregatorConfig,
}

impl FeedAggregator {
    /// Create an aggregator, failing fast on invalid configuration
    pub fn new(client: FeedClient, config: AggregatorConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Fetch every feed and build a fresh [`AggregatedSet`].
    ///
    /// Waits for all fetches to finish or time out. Failed feeds contribute
    /// nothing; an empty feed list yields an empty set.
    #[instrument(skip(self, feeds), fields(feed_count = feeds.len()))]
    pub async fn aggregate(&self, feeds: &[String]) -> (AggregatedSet, AggregationSummary) {
        info!(
            "Loading {} feeds, max {} items per source",
            feeds.len(),
            self.config.max_per_source
        );

        let fetch_futures: Vec<_> = feeds
            .iter()
            .map(|url| self.client.fetch_items(url, self.config.fetch_per_feed))
            .collect();

        let all: Vec<FeedItem> = futures::future::join_all(fetch_futures)
            .await
            .into_iter()
            .flatten()
            .collect();
        let items_fetched = all.len();
        info!("Retrieved {} total items from all feeds", items_fetched);

        let now = Utc::now();
        let items = {
            let mut rng = rand::rng();
            aggregate_items(all, &self.config, now, &mut rng)
        };

        info!(
            "After age filter ({}h), dedup, and per-source limit ({}): {} items",
            self.config.max_age_hours,
            self.config.max_per_source,
            items.len()
        );

        let summary = AggregationSummary {
            feeds_requested: feeds.len(),
            items_fetched,
            items_kept: items.len(),
        };

        (AggregatedSet::new(items, now), summary)
    }
}
