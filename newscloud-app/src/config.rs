//! Host configuration
//!
//! Defaults, then an optional JSON file named by `NEWSCLOUD_CONFIG`, then
//! individual `NEWSCLOUD_*` environment overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use newscloud_services::{AggregatorConfig, NewsCloudServiceConfig, StopWords, MAX_AGE_HOURS_LIMIT};

/// Feeds polled when none are configured
pub const DEFAULT_FEEDS: &[&str] = &[
    "https://apnews.com/apf-topnews?format=xml",
    "https://feeds.bbci.co.uk/news/rss.xml",
    "https://feeds.washingtonpost.com/rss/world",
    "https://feeds.npr.org/1001/rss.xml",
    "https://www.espn.com/espn/rss/news",
    "https://www.cbssports.com/rss/headlines/",
];

/// Longest accepted refresh interval: one week
pub const MAX_REFRESH_MINUTES: u64 = 7 * 24 * 60;

/// Longest accepted time on one article: one hour
pub const MAX_DISPLAY_SECONDS: u64 = 60 * 60;

/// Operator stop words shipped on top of the baseline list
pub const DEFAULT_CUSTOM_STOP_WORDS: &[&str] = &[
    "football", "college", "best", "state", "rankings", "predictions", "basketball", "bets",
    "real", "odds", "picks", "week", "city", "team",
];

/// Top-level host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feeds: Vec<String>,
    /// Per-source cap on the aggregated set
    pub max_items_per_feed: usize,
    pub refresh_minutes: u64,
    pub article_display_seconds: u64,
    pub max_article_age_hours: u32,
    pub custom_stop_words: Vec<String>,
    /// Scene JSON written after every refresh when set
    pub scene_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            max_items_per_feed: 24,
            refresh_minutes: 15,
            article_display_seconds: 12,
            max_article_age_hours: 48,
            custom_stop_words: DEFAULT_CUSTOM_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
            scene_path: None,
        }
    }
}

impl AppConfig {
    /// Load from the process environment
    ///
    /// Reads:
    /// - NEWSCLOUD_CONFIG: path to a JSON config file (optional)
    /// - NEWSCLOUD_FEEDS, NEWSCLOUD_STOP_WORDS: comma separated lists
    /// - NEWSCLOUD_MAX_PER_SOURCE, NEWSCLOUD_REFRESH_MINUTES, NEWSCLOUD_MAX_AGE_HOURS
    /// - NEWSCLOUD_SCENE_PATH
    pub fn load() -> Result<Self, ConfigError> {
        // A config path that does not exist yet means defaults
        let mut config = match env::var("NEWSCLOUD_CONFIG") {
            Ok(path) if Path::new(&path).exists() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        serde_json::from_str(&json).map_err(|e| ConfigError::InvalidJson {
            field: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Apply `NEWSCLOUD_*` overrides resolved through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(feeds) = lookup("NEWSCLOUD_FEEDS") {
            self.feeds = split_list(&feeds);
        }
        if let Some(words) = lookup("NEWSCLOUD_STOP_WORDS") {
            self.custom_stop_words = split_list(&words);
        }
        if let Some(value) = lookup("NEWSCLOUD_MAX_PER_SOURCE") {
            self.max_items_per_feed = parse_number("NEWSCLOUD_MAX_PER_SOURCE", &value)?;
        }
        if let Some(value) = lookup("NEWSCLOUD_REFRESH_MINUTES") {
            self.refresh_minutes = parse_number("NEWSCLOUD_REFRESH_MINUTES", &value)?;
        }
        if let Some(value) = lookup("NEWSCLOUD_MAX_AGE_HOURS") {
            self.max_article_age_hours = parse_number("NEWSCLOUD_MAX_AGE_HOURS", &value)?;
        }
        if let Some(path) = lookup("NEWSCLOUD_SCENE_PATH") {
            let path = path.trim();
            self.scene_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounded = [
            ("max_items_per_feed", self.max_items_per_feed as u64, u64::MAX),
            ("refresh_minutes", self.refresh_minutes, MAX_REFRESH_MINUTES),
            ("article_display_seconds", self.article_display_seconds, MAX_DISPLAY_SECONDS),
            (
                "max_article_age_hours",
                u64::from(self.max_article_age_hours),
                u64::from(MAX_AGE_HOURS_LIMIT),
            ),
        ];

        for (field, value, max) in bounded {
            if value == 0 {
                return Err(ConfigError::MustBePositive(field.to_string()));
            }
            if value > max {
                return Err(ConfigError::OutOfRange {
                    field: field.to_string(),
                    value,
                    max,
                });
            }
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes.saturating_mul(60))
    }

    pub fn display_interval(&self) -> Duration {
        Duration::from_secs(self.article_display_seconds)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig::new(self.max_items_per_feed, self.max_article_age_hours)
    }

    pub fn service_config(&self) -> NewsCloudServiceConfig {
        NewsCloudServiceConfig {
            feeds: self.feeds.clone(),
            refresh_interval: self.refresh_interval(),
            stop_words: StopWords::with_custom(&self.custom_stop_words),
            ..NewsCloudServiceConfig::default()
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Invalid JSON in {field}: {error}")]
    InvalidJson { field: String, error: String },

    #[error("{var} is not a valid number: {value:?}")]
    InvalidNumber { var: String, value: String },

    #[error("{0} must be greater than zero")]
    MustBePositive(String),

    #[error("{field} is {value}, above the maximum of {max}")]
    OutOfRange { field: String, value: u64, max: u64 },
}
