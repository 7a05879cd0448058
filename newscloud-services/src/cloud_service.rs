//! News Cloud Service
//!
//! Background service that periodically re-aggregates every feed and
//! publishes a complete [`Snapshot`]: the item set, the ranked words and the
//! cloud layout derived from it. Each refresh swaps in a new snapshot as a
//! whole; readers keep whatever generation they already hold.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use newscloud_core::{AggregatedSet, CoreError, CoreResult, Placement, RankedWord};

use crate::aggregator::{AggregationSummary, FeedAggregator};
use crate::layout::{CloudConfig, CloudLayout};
use crate::scheduler::ShuffleBag;
use crate::word_frequency::{self, AnalyzerConfig, StopWords};

/// One immutable refresh generation
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Starts at 0 for the empty startup snapshot
    pub generation: u64,
    pub items: AggregatedSet,
    pub words: Vec<RankedWord>,
    pub placements: Vec<Placement>,
    pub summary: AggregationSummary,
}

impl Snapshot {
    pub fn built_at(&self) -> DateTime<Utc> {
        self.items.built_at()
    }

    /// A fresh shuffle bag over this generation's items
    pub fn scheduler(&self) -> ShuffleBag {
        ShuffleBag::new(self.items.clone())
    }
}

/// Turns an aggregated item set into a full [`Snapshot`]
#[derive(Debug)]
pub struct SnapshotBuilder {
    stop_words: StopWords,
    analyzer: AnalyzerConfig,
    layout: CloudLayout,
}

impl SnapshotBuilder {
    pub fn new(
        stop_words: StopWords,
        analyzer: AnalyzerConfig,
        cloud: CloudConfig,
    ) -> CoreResult<Self> {
        analyzer.validate()?;
        let layout = CloudLayout::new(cloud)?;
        Ok(Self {
            stop_words,
            analyzer,
            layout,
        })
    }

    pub fn layout(&self) -> &CloudLayout {
        &self.layout
    }

    /// Word analysis and layout over `items`. CPU-bound; run off the runtime.
    pub fn build(
        &self,
        generation: u64,
        items: AggregatedSet,
        summary: AggregationSummary,
    ) -> Snapshot {
        let entries = word_frequency::analyze(items.items(), &self.stop_words, &self.analyzer);
        let words = word_frequency::assign_font_sizes(&entries, &self.analyzer);
        let placements = self.layout.place(&words);

        info!(
            "Built generation {}: {} items, {} ranked words, {} placed",
            generation,
            items.len(),
            words.len(),
            placements.len()
        );

        Snapshot {
            generation,
            items,
            words,
            placements,
            summary,
        }
    }
}

/// Configuration for [`NewsCloudService`]
#[derive(Debug, Clone)]
pub struct NewsCloudServiceConfig {
    pub feeds: Vec<String>,
    /// Time between the start of consecutive refreshes
    pub refresh_interval: Duration,
    pub stop_words: StopWords,
    pub analyzer: AnalyzerConfig,
    pub cloud: CloudConfig,
}

impl Default for NewsCloudServiceConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            refresh_interval: Duration::from_secs(15 * 60),
            stop_words: StopWords::baseline(),
            analyzer: AnalyzerConfig::default(),
            cloud: CloudConfig::default(),
        }
    }
}

/// Refreshes and publishes the current news cloud
pub struct NewsCloudService {
    aggregator: FeedAggregator,
    feeds: Vec<String>,
    refresh_interval: Duration,
    builder: Arc<SnapshotBuilder>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    /// Held for the whole of a refresh so cycles never overlap
    refresh_lock: Mutex<()>,
}

impl NewsCloudService {
    /// Create the service with an empty generation-0 snapshot
    pub fn new(aggregator: FeedAggregator, config: NewsCloudServiceConfig) -> CoreResult<Self> {
        if config.refresh_interval.is_zero() {
            return Err(CoreError::invalid_value("refresh_interval", "must be non-zero"));
        }

        let builder = SnapshotBuilder::new(config.stop_words, config.analyzer, config.cloud)?;
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::default()));

        info!(
            "Initializing NewsCloudService with {} feeds, refresh every {:?}",
            config.feeds.len(),
            config.refresh_interval
        );

        Ok(Self {
            aggregator,
            feeds: config.feeds,
            refresh_interval: config.refresh_interval,
            builder: Arc::new(builder),
            snapshot_tx,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    pub fn cloud_config(&self) -> &CloudConfig {
        self.builder.layout().config()
    }

    /// The most recently published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot_tx.borrow())
    }

    /// Receiver notified on every snapshot swap
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Aggregate every feed once and publish the result.
    ///
    /// Concurrent callers queue behind the one in flight. Every completed
    /// cycle replaces the published generation, including one that fetched
    /// nothing.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let _guard = self.refresh_lock.lock().await;

        let (items, summary) = self.aggregator.aggregate(&self.feeds).await;
        let current = self.current();

        if items.is_empty() && summary.feeds_requested > 0 {
            warn!(
                "Refresh returned no items from {} feeds, publishing an empty generation",
                summary.feeds_requested
            );
        }

        let generation = current.generation + 1;
        let builder = Arc::clone(&self.builder);
        let built =
            tokio::task::spawn_blocking(move || builder.build(generation, items, summary)).await;

        match built {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot_tx.send_replace(Arc::clone(&snapshot));
                snapshot
            }
            Err(e) => {
                error!("Failed to build generation {}: {}", generation, e);
                current
            }
        }
    }

    /// Refresh immediately, then on every interval tick
    pub fn spawn_refresh_loop(self: Arc<Self>) -> JoinHandle<()> {
        info!("Starting refresh loop, interval {:?}", self.refresh_interval);

        tokio::spawn(async move {
            let mut ticker = interval(self.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let snapshot = self.refresh().await;
                debug!(
                    "Refresh tick done, serving generation {} ({} items)",
                    snapshot.generation,
                    snapshot.items.len()
                );
            }
        })
    }
}
