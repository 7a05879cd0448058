//! RSS/Atom feed client
//!
//! Fetches a single feed document and normalizes its entries into
//! [`FeedItem`]s. Failures are isolated: [`FeedClient::fetch_items`] logs the
//! cause and yields an empty list instead of an error.
//!
//! Both parsers are built on quick-xml, which never resolves external
//! entities or fetches referenced DTDs, so a hostile document cannot trigger
//! sub-requests.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use newscloud_core::FeedItem;

use crate::error::FeedError;
use crate::html::{extract_image_from_html, sanitize_summary};

/// Source label used when the feed has no title and its URL has no host
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Media extension elements checked for an image, in order of preference
const MEDIA_ELEMENTS: [&str; 2] = ["thumbnail", "content"];

/// Configuration for [`FeedClient`]
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Budget for the whole request, connect through body
    pub timeout: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: "NewsCloud/1.0".to_string(),
        }
    }
}

/// RSS/Atom feed client
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Create a client with the default 10 second timeout
    pub fn new() -> Self {
        Self::with_config(FeedClientConfig::default())
    }

    /// Create with a custom configuration
    pub fn with_config(config: FeedClientConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .user_agent(config.user_agent)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Fetch a feed and return at most `max_items` entries, newest first.
    ///
    /// Never fails: network errors, timeouts, bad statuses and parse errors
    /// are logged and produce an empty list.
    pub async fn fetch_items(&self, url: &str, max_items: usize) -> Vec<FeedItem> {
        debug!("Loading feed: {}", url);

        match self.try_fetch_items(url, max_items).await {
            Ok(items) => {
                debug!("Loaded {} items from {}", items.len(), url);
                items
            }
            Err(e) => {
                warn!("Failed to load feed {}: {}", url, e);
                Vec::new()
            }
        }
    }

    /// Fetch a feed, surfacing the failure cause
    pub async fn try_fetch_items(
        &self,
        url: &str,
        max_items: usize,
    ) -> Result<Vec<FeedItem>, FeedError> {
        url::Url::parse(url).map_err(|e| FeedError::InvalidUrl(format!("{}: {}", url, e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| FeedError::RequestFailed(e.to_string()))?;

        let items = parse_feed(&content, url, Utc::now())?;
        Ok(select_newest(items, max_items))
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a feed document into items, trying RSS first and then Atom.
///
/// Entries with a blank title are dropped. Missing or zero timestamps fall
/// back to `fetched_at`. The result is in document order.
pub fn parse_feed(
    content: &[u8],
    feed_url: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<FeedItem>, FeedError> {
    if let Ok(channel) = rss::Channel::read_from(content) {
        return Ok(parse_rss_channel(&channel, feed_url, fetched_at));
    }

    if let Ok(atom_feed) = atom_syndication::Feed::read_from(content) {
        return Ok(parse_atom_feed(&atom_feed, feed_url, fetched_at));
    }

    Err(FeedError::ParseError(format!(
        "Document is neither RSS nor Atom: {}",
        feed_url
    )))
}

/// Sort newest first and keep the first `max_items`
pub fn select_newest(mut items: Vec<FeedItem>, max_items: usize) -> Vec<FeedItem> {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items.truncate(max_items);
    items
}

fn parse_rss_channel(
    channel: &rss::Channel,
    feed_url: &str,
    fetched_at: DateTime<Utc>,
) -> Vec<FeedItem> {
    let source = source_label(Some(channel.title()), feed_url);

    channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title().unwrap_or_default();
            if title.trim().is_empty() {
                return None;
            }

            let link = item
                .link()
                .map(str::to_string)
                .or_else(|| {
                    item.guid()
                        .filter(|g| g.is_permalink())
                        .map(|g| g.value().to_string())
                })
                .unwrap_or_default();

            let published_at = item
                .pub_date()
                .and_then(parse_date)
                .or_else(|| {
                    item.dublin_core_ext()
                        .and_then(|dc| dc.dates().first())
                        .and_then(|d| parse_date(d))
                });

            let description_html = item.description().unwrap_or_default();
            let content_html = item.content().unwrap_or_default();

            // 1. media:thumbnail / media:content
            // 2. Enclosure with image mime type
            // 3. <img> in the content body, then in the description
            let image_url = rss_media_image(item.extensions())
                .or_else(|| {
                    item.enclosure()
                        .filter(|e| is_image_mime(e.mime_type()))
                        .map(|e| e.url().to_string())
                })
                .or_else(|| extract_image_from_html(content_html))
                .or_else(|| extract_image_from_html(description_html));

            Some(FeedItem {
                title: title.to_string(),
                summary: sanitize_summary(description_html),
                link,
                published_at: usable_timestamp(published_at, fetched_at),
                image_url,
                source: source.clone(),
            })
        })
        .collect()
}

fn parse_atom_feed(
    atom_feed: &atom_syndication::Feed,
    feed_url: &str,
    fetched_at: DateTime<Utc>,
) -> Vec<FeedItem> {
    let source = source_label(Some(atom_feed.title().as_str()), feed_url);

    atom_feed
        .entries()
        .iter()
        .filter_map(|entry| {
            let title = entry.title().as_str();
            if title.trim().is_empty() {
                return None;
            }

            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string())
                .unwrap_or_default();

            let published_at = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .with_timezone(&Utc);

            let summary_html = entry.summary().map(|s| s.as_str()).unwrap_or_default();
            let content_html = entry.content().and_then(|c| c.value()).unwrap_or_default();

            let summary = if !summary_html.is_empty() {
                sanitize_summary(summary_html)
            } else {
                sanitize_summary(content_html)
            };

            let image_url = atom_media_image(entry.extensions())
                .or_else(|| {
                    entry
                        .links()
                        .iter()
                        .find(|l| {
                            l.rel() == "enclosure" && l.mime_type().is_some_and(is_image_mime)
                        })
                        .map(|l| l.href().to_string())
                })
                .or_else(|| extract_image_from_html(content_html))
                .or_else(|| extract_image_from_html(summary_html));

            Some(FeedItem {
                title: title.to_string(),
                summary,
                link,
                published_at: usable_timestamp(Some(published_at), fetched_at),
                image_url,
                source: source.clone(),
            })
        })
        .collect()
}

/// Image URL from `media:thumbnail` or `media:content` in an RSS item
fn rss_media_image(extensions: &rss::extension::ExtensionMap) -> Option<String> {
    MEDIA_ELEMENTS.iter().find_map(|element| {
        extensions
            .values()
            .filter_map(|by_name| by_name.get(*element))
            .flatten()
            .find_map(|ext| url_attr(ext.attrs()))
    })
}

/// Image URL from `media:thumbnail` or `media:content` in an Atom entry
fn atom_media_image(extensions: &atom_syndication::extension::ExtensionMap) -> Option<String> {
    MEDIA_ELEMENTS.iter().find_map(|element| {
        extensions
            .values()
            .filter_map(|by_name| by_name.get(*element))
            .flatten()
            .find_map(|ext| url_attr(ext.attrs()))
    })
}

fn url_attr(attrs: &BTreeMap<String, String>) -> Option<String> {
    attrs
        .get("url")
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

fn is_image_mime(mime: &str) -> bool {
    mime.get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Parse an RFC 2822 (RSS) or RFC 3339 (Dublin Core) date
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Replace absent or zero-valued timestamps with the acquisition time
fn usable_timestamp(published: Option<DateTime<Utc>>, fetched_at: DateTime<Utc>) -> DateTime<Utc> {
    published
        .filter(|ts| ts.timestamp() > 0)
        .unwrap_or(fetched_at)
}

/// The feed's declared title, else its host without a leading `www.`
pub fn source_label(feed_title: Option<&str>, feed_url: &str) -> String {
    if let Some(title) = feed_title.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let parsed = url::Url::parse(feed_url).ok();
    match parsed.as_ref().and_then(|u| u.host_str()) {
        Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
        None => UNKNOWN_SOURCE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Example Wire</title>
    <link>https://example.com</link>
    <description>Example</description>
    <item>
      <title>Older story</title>
      <link>https://example.com/older</link>
      <description>&lt;p&gt;Older &lt;b&gt;body&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>Sun, 05 Oct 2025 09:00:00 GMT</pubDate>
      <enclosure url="https://cdn.example.com/older.png" length="10" type="IMAGE/png"/>
    </item>
    <item>
      <title>Newest story</title>
      <link>https://example.com/newest</link>
      <description>Plain summary</description>
      <pubDate>Tue, 07 Oct 2025 09:00:00 GMT</pubDate>
      <media:thumbnail url="https://cdn.example.com/thumb.jpg"/>
      <enclosure url="https://cdn.example.com/newest.png" length="10" type="image/png"/>
    </item>
    <item>
      <title>   </title>
      <link>https://example.com/blank</link>
    </item>
    <item>
      <title>Undated story</title>
      <link>https://example.com/undated</link>
      <description>&lt;img src="https://cdn.example.com/inline.jpg"&gt; Text</description>
      <enclosure url="https://cdn.example.com/audio.mp3" length="10" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Daily</title>
  <id>urn:example:feed</id>
  <updated>2025-10-06T12:00:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:example:1</id>
    <link rel="related" href="https://atom.example.com/related"/>
    <link rel="alternate" href="https://atom.example.com/entry"/>
    <updated>2025-10-06T12:00:00Z</updated>
    <published>2025-10-06T10:00:00Z</published>
    <content type="html">
      &lt;p&gt;Body &lt;img src="https://cdn.example.com/body.jpg"&gt;&lt;/p&gt;
    </content>
  </entry>
  <entry>
    <title>Enclosure entry</title>
    <id>urn:example:2</id>
    <link href="https://atom.example.com/second"/>
    <link rel="enclosure" type="image/jpeg" href="https://cdn.example.com/enclosure.jpg"/>
    <updated>2025-10-05T12:00:00Z</updated>
    <summary>Short summary</summary>
  </entry>
</feed>"#;

    const RSS_CONTENT_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Body Wire</title>
    <link>https://example.com</link>
    <description>Example</description>
    <item>
      <title>Two inline images</title>
      <link>https://example.com/inline</link>
      <description>&lt;img src="https://cdn.example.com/teaser.jpg"&gt; Teaser</description>
      <content:encoded>
        <![CDATA[<p><img src='https://cdn.example.com/body.jpg'> Full body</p>]]>
      </content:encoded>
      <pubDate>Mon, 06 Oct 2025 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM_MEDIA_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
  <title>Atom Media</title>
  <id>urn:example:media</id>
  <updated>2025-10-06T12:00:00Z</updated>
  <entry>
    <title>Media content entry</title>
    <id>urn:example:m1</id>
    <link href="https://atom.example.com/m1"/>
    <updated>2025-10-06T12:00:00Z</updated>
    <media:content url="https://cdn.example.com/media-content.jpg" medium="image"/>
    <content type="html">&lt;img src="https://cdn.example.com/inline.jpg"&gt;</content>
  </entry>
  <entry>
    <title>Thumbnail entry</title>
    <id>urn:example:m2</id>
    <link href="https://atom.example.com/m2"/>
    <updated>2025-10-05T12:00:00Z</updated>
    <media:content url="https://cdn.example.com/large.jpg" medium="image"/>
    <media:thumbnail url="https://cdn.example.com/thumb.jpg"/>
  </entry>
</feed>"#;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 8, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_rss_items() {
        let items =
            parse_feed(RSS_FEED.as_bytes(), "https://www.example.com/rss", fetched_at()).unwrap();

        // Blank title dropped
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.source == "Example Wire"));

        let older = &items[0];
        assert_eq!(older.title, "Older story");
        assert_eq!(older.summary, "Older body");
        assert_eq!(older.image_url.as_deref(), Some("https://cdn.example.com/older.png"));

        // Media thumbnail wins over the enclosure
        let newest = &items[1];
        assert_eq!(newest.image_url.as_deref(), Some("https://cdn.example.com/thumb.jpg"));
        assert_eq!(newest.published_at, Utc.with_ymd_and_hms(2025, 10, 7, 9, 0, 0).unwrap());

        // Non-image enclosure ignored, falls through to the description <img>
        let undated = &items[2];
        assert_eq!(undated.image_url.as_deref(), Some("https://cdn.example.com/inline.jpg"));
        assert_eq!(undated.published_at, fetched_at());
        assert_eq!(undated.summary, "Text");
    }

    #[test]
    fn test_select_newest_sorts_and_truncates() {
        let items =
            parse_feed(RSS_FEED.as_bytes(), "https://example.com/rss", fetched_at()).unwrap();
        let newest = select_newest(items, 2);

        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].title, "Undated story");
        assert_eq!(newest[1].title, "Newest story");
    }

    #[test]
    fn test_parse_atom_entries() {
        let items =
            parse_feed(ATOM_FEED.as_bytes(), "https://atom.example.com/feed", fetched_at())
                .unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.source, "Atom Daily");
        assert_eq!(first.link, "https://atom.example.com/entry");
        assert_eq!(first.summary, "Body");
        assert_eq!(first.image_url.as_deref(), Some("https://cdn.example.com/body.jpg"));
        assert_eq!(first.published_at, Utc.with_ymd_and_hms(2025, 10, 6, 10, 0, 0).unwrap());

        let second = &items[1];
        assert_eq!(second.link, "https://atom.example.com/second");
        assert_eq!(second.summary, "Short summary");
        assert_eq!(second.image_url.as_deref(), Some("https://cdn.example.com/enclosure.jpg"));
        // No <published>, falls back to <updated>
        assert_eq!(second.published_at, Utc.with_ymd_and_hms(2025, 10, 5, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_rss_content_image_wins_over_description() {
        let items =
            parse_feed(RSS_CONTENT_FEED.as_bytes(), "https://example.com/rss", fetched_at())
                .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].image_url.as_deref(),
            Some("https://cdn.example.com/body.jpg")
        );
        // Summary still comes from the description
        assert_eq!(items[0].summary, "Teaser");
    }

    #[test]
    fn test_atom_media_extension_images() {
        let items =
            parse_feed(ATOM_MEDIA_FEED.as_bytes(), "https://atom.example.com/feed", fetched_at())
                .unwrap();
        assert_eq!(items.len(), 2);

        // media:content wins over an inline <img>
        assert_eq!(
            items[0].image_url.as_deref(),
            Some("https://cdn.example.com/media-content.jpg")
        );
        // media:thumbnail is preferred over media:content
        assert_eq!(items[1].image_url.as_deref(), Some("https://cdn.example.com/thumb.jpg"));
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let result = parse_feed(b"<html><body>not a feed", "https://example.com", fetched_at());
        assert!(matches!(result, Err(FeedError::ParseError(_))));
    }

    #[test]
    fn test_source_label_fallbacks() {
        assert_eq!(
            source_label(Some("  BBC News "), "https://feeds.bbci.co.uk/news/rss.xml"),
            "BBC News"
        );
        assert_eq!(source_label(Some(""), "https://www.npr.org/rss.xml"), "npr.org");
        assert_eq!(source_label(None, "https://feeds.npr.org/1001/rss.xml"), "feeds.npr.org");
        assert_eq!(source_label(None, "not a url"), UNKNOWN_SOURCE);
    }

    #[test]
    fn test_zero_timestamp_uses_fetch_time() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(usable_timestamp(Some(epoch), fetched_at()), fetched_at());
        assert_eq!(usable_timestamp(None, fetched_at()), fetched_at());
    }

    #[test]
    fn test_image_mime_case_insensitive() {
        assert!(is_image_mime("image/jpeg"));
        assert!(is_image_mime("Image/PNG"));
        assert!(!is_image_mime("audio/mpeg"));
        assert!(!is_image_mime("img"));
    }
}
