//! Feed acquisition for the news cloud
//!
//! This crate fetches a single RSS or Atom document and normalizes its
//! entries into [`FeedItem`](newscloud_core::FeedItem)s:
//! - `feed_client`: HTTP retrieval with a bounded timeout, RSS/Atom parsing
//! - `html`: summary sanitising and image URL extraction

pub mod error;
pub mod feed_client;
pub mod html;

pub use error::FeedError;
pub use feed_client::{FeedClient, FeedClientConfig};
