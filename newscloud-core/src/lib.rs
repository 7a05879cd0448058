//! Core types for the News Cloud aggregator
//!
//! This crate defines the shared data structures used across the workspace:
//! normalized feed items, the immutable aggregated snapshot, and the derived
//! word-cloud entries and placements.

pub mod cloud;
pub mod error;
pub mod item;

pub use cloud::{Placement, RankedWord, Rect, WordFrequencyEntry};
pub use error::{CoreError, CoreResult};
pub use item::{AggregatedSet, FeedItem};
