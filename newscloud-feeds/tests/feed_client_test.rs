//! HTTP-level tests for the feed client
//!
//! Run with: cargo test -p newscloud-feeds --test feed_client_test

use std::time::Duration;

use newscloud_feeds::{FeedClient, FeedClientConfig, FeedError};

const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title></title>
    <link>https://example.com</link>
    <description>Example</description>
    <item>
      <title>First</title>
      <link>https://example.com/1</link>
      <pubDate>Sun, 05 Oct 2025 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>https://example.com/2</link>
      <pubDate>Mon, 06 Oct 2025 09:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Third</title>
      <link>https://example.com/3</link>
      <pubDate>Tue, 07 Oct 2025 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

fn client() -> FeedClient {
    FeedClient::with_config(FeedClientConfig {
        timeout: Duration::from_secs(2),
        ..FeedClientConfig::default()
    })
}

#[tokio::test]
async fn test_fetch_items_newest_first_and_capped() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/rss")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(RSS_BODY)
        .create_async()
        .await;

    let url = format!("{}/rss", server.url());
    let items = client().fetch_items(&url, 2).await;

    mock.assert_async().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Third");
    assert_eq!(items[1].title, "Second");

    // Channel title is blank, so the host is used as the source label
    assert!(items.iter().all(|i| i.source == "127.0.0.1"));
}

#[tokio::test]
async fn test_http_error_yields_empty() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/broken")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let url = format!("{}/broken", server.url());
    assert!(client().fetch_items(&url, 10).await.is_empty());

    let err = client().try_fetch_items(&url, 10).await.unwrap_err();
    assert!(matches!(err, FeedError::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_malformed_xml_yields_empty() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/garbage")
        .with_status(200)
        .with_body("<rss><channel><item><title>unterminated")
        .create_async()
        .await;

    let url = format!("{}/garbage", server.url());
    assert!(client().fetch_items(&url, 10).await.is_empty());

    let err = client().try_fetch_items(&url, 10).await.unwrap_err();
    assert!(matches!(err, FeedError::ParseError(_)));
}

#[tokio::test]
async fn test_invalid_url_yields_empty() {
    assert!(client().fetch_items("not a url", 10).await.is_empty());

    let err = client().try_fetch_items("not a url", 10).await.unwrap_err();
    assert!(matches!(err, FeedError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_unreachable_host_yields_empty() {
    // Port 9 (discard) on localhost is not expected to be listening
    let items = client().fetch_items("http://127.0.0.1:9/feed", 10).await;
    assert!(items.is_empty());
}
