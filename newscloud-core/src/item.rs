//! Feed item data structures and the aggregated snapshot

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a plain-text summary
pub const SUMMARY_MAX_CHARS: usize = 220;

/// Marker appended to summaries that were truncated
pub const SUMMARY_ELLIPSIS: char = '…';

/// A normalized article taken from a remote feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Article title
    pub title: String,
    /// Plain-text summary (tags stripped, at most 220 chars plus an ellipsis)
    pub summary: String,
    /// Article URL
    pub link: String,
    /// Publication date, or acquisition time when the feed omitted it
    pub published_at: DateTime<Utc>,
    /// Article thumbnail/image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Feed title, or the feed host when the feed has no title
    pub source: String,
}

impl FeedItem {
    /// Deduplication identity: trimmed title plus link.
    ///
    /// Summary, image and timestamp are not part of it.
    pub fn identity(&self) -> (&str, &str) {
        (self.title.trim(), self.link.as_str())
    }
}

/// One generation of aggregated items.
///
/// The item list is shared behind an `Arc` and never mutated; a refresh
/// builds a new `AggregatedSet` instead of editing this one, so clones held
/// by consumers stay valid for as long as they are needed.
#[derive(Debug, Clone)]
pub struct AggregatedSet {
    items: Arc<[FeedItem]>,
    built_at: DateTime<Utc>,
}

impl AggregatedSet {
    pub fn new(items: Vec<FeedItem>, built_at: DateTime<Utc>) -> Self {
        Self {
            items: items.into(),
            built_at,
        }
    }

    /// An empty generation, used before the first refresh completes
    pub fn empty() -> Self {
        Self::new(Vec::new(), Utc::now())
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&FeedItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeedItem> {
        self.items.iter()
    }

    /// When this generation was assembled
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of distinct sources contributing to this generation
    pub fn source_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.source.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Whether two handles point at the same generation
    pub fn same_generation(&self, other: &AggregatedSet) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl Default for AggregatedSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a AggregatedSet {
    type Item = &'a FeedItem;
    type IntoIter = std::slice::Iter<'a, FeedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
