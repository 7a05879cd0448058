//! Business logic services for the News Cloud aggregator
//!
//! This crate turns many feeds into one balanced item set and derives the
//! word cloud and presentation order from it.

pub mod aggregator;
pub mod cloud_service;
pub mod layout;
pub mod scheduler;
pub mod word_frequency;

pub use aggregator::{AggregationSummary, AggregatorConfig, FeedAggregator, MAX_AGE_HOURS_LIMIT};
pub use cloud_service::{NewsCloudService, NewsCloudServiceConfig, Snapshot, SnapshotBuilder};
pub use layout::{ApproxTextMeasurer, CloudConfig, CloudLayout, TextMeasurer};
pub use scheduler::ShuffleBag;
pub use word_frequency::{AnalyzerConfig, StopWords};
