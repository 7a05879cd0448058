//! News Cloud
//!
//! Headless host: keeps the aggregated news set and its word cloud fresh,
//! cycles through articles one at a time, and exports the scene as JSON.

mod config;
mod scene;

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newscloud_feeds::FeedClient;
use newscloud_services::{FeedAggregator, NewsCloudService, Snapshot};

use crate::config::AppConfig;
use crate::scene::{write_scene, ScenePayload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,newscloud_app=debug")),
        )
        .init();

    info!("Starting News Cloud");

    let config = AppConfig::load()?;
    info!(
        "Loaded config: {} feeds, max {} per source, refresh every {} min, {}h max age",
        config.feeds.len(),
        config.max_items_per_feed,
        config.refresh_minutes,
        config.max_article_age_hours
    );
    if config.feeds.is_empty() {
        warn!("No feeds configured; the cloud will stay empty");
    }

    let aggregator = FeedAggregator::new(FeedClient::new(), config.aggregator_config())?;
    let service = Arc::new(NewsCloudService::new(aggregator, config.service_config())?);

    // First tick refreshes immediately
    let refresh_handle = Arc::clone(&service).spawn_refresh_loop();

    tokio::select! {
        _ = present(Arc::clone(&service), &config) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown requested");
        }
    }

    refresh_handle.abort();
    Ok(())
}

/// Show one article per display interval, restarting the rotation whenever
/// a new generation is published
async fn present(service: Arc<NewsCloudService>, config: &AppConfig) {
    let mut snapshots = service.subscribe();
    let mut current = service.current();
    let mut bag = current.scheduler();

    let mut ticker = interval(config.display_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    debug!("Snapshot channel closed, stopping presentation");
                    return;
                }
                current = Arc::clone(&snapshots.borrow_and_update());
                bag.reset(current.items.clone());
                info!(
                    "Generation {}: {} items from {} sources, {} words in cloud",
                    current.generation,
                    current.items.len(),
                    current.items.source_count(),
                    current.placements.len()
                );

                if let Some(path) = &config.scene_path {
                    export_scene(&service, &current, path);
                }
            }
            _ = ticker.tick() => {
                match bag.draw() {
                    Some(item) => info!(
                        source = %item.source,
                        published = %item.published_at.format("%Y-%m-%d %H:%M UTC"),
                        "{}",
                        item.title
                    ),
                    None => debug!("No articles to show yet"),
                }
            }
        }
    }
}

fn export_scene(service: &NewsCloudService, snapshot: &Snapshot, path: &std::path::Path) {
    let payload = ScenePayload::new(snapshot, service.cloud_config());
    match write_scene(path, &payload) {
        Ok(()) => debug!(
            "Wrote scene for generation {} to {}",
            snapshot.generation,
            path.display()
        ),
        Err(e) => error!("Failed to export scene: {:#}", e),
    }
}
