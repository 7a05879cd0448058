//! Error types for the feeds module

use thiserror::Error;

/// Errors that can occur while acquiring a single feed.
///
/// These never escape [`FeedClient::fetch_items`](crate::FeedClient::fetch_items);
/// they are logged there and the feed contributes no items.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed (DNS, connect, timeout, body read)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Server answered with a non-success status
    #[error("HTTP error (status {status}) for {url}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Feed URL
        url: String,
    },

    /// Document is neither valid RSS nor valid Atom
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Feed URL could not be parsed
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),
}
