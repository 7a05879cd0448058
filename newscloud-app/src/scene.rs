//! Scene export
//!
//! JSON handed to whatever front end draws the cloud and the article cards.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use newscloud_core::{FeedItem, Placement, RankedWord};
use newscloud_services::{AggregationSummary, CloudConfig, Snapshot};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

/// Everything a renderer needs for one generation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePayload<'a> {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub canvas: Canvas,
    pub summary: AggregationSummary,
    pub items: &'a [FeedItem],
    pub words: &'a [RankedWord],
    pub placements: &'a [Placement],
}

impl<'a> ScenePayload<'a> {
    pub fn new(snapshot: &'a Snapshot, cloud: &CloudConfig) -> Self {
        Self {
            generation: snapshot.generation,
            built_at: snapshot.built_at(),
            canvas: Canvas {
                width: cloud.width,
                height: cloud.height,
            },
            summary: snapshot.summary,
            items: snapshot.items.items(),
            words: &snapshot.words,
            placements: &snapshot.placements,
        }
    }
}

/// Write the scene next to `path` and rename it into place
pub fn write_scene(path: &Path, payload: &ScenePayload<'_>) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(payload).context("Failed to serialize scene")?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move scene to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use newscloud_core::AggregatedSet;

    fn snapshot() -> Snapshot {
        let item = FeedItem {
            title: "Markets rally on earnings".to_string(),
            summary: "Stocks climbed".to_string(),
            link: "https://a.example/1".to_string(),
            published_at: Utc::now(),
            image_url: Some("https://a.example/1.jpg".to_string()),
            source: "Feed A".to_string(),
        };
        Snapshot {
            generation: 4,
            items: AggregatedSet::new(vec![item], Utc::now()),
            words: vec![RankedWord {
                word: "rally".to_string(),
                count: 1,
                font_size: 14.0,
            }],
            placements: vec![Placement {
                word: "rally".to_string(),
                font_size: 14.0,
                x: 300.0,
                y: 225.0,
                width: 38.5,
                height: 16.8,
            }],
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_payload_is_camel_case() {
        let snapshot = snapshot();
        let payload = ScenePayload::new(&snapshot, &CloudConfig::default());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["generation"], 4);
        assert_eq!(json["canvas"]["width"], 600.0);
        assert_eq!(json["items"][0]["imageUrl"], "https://a.example/1.jpg");
        assert!(json["items"][0]["publishedAt"].is_string());
        assert_eq!(json["words"][0]["fontSize"], 14.0);
        assert_eq!(json["placements"][0]["x"], 300.0);
        assert_eq!(json["summary"]["itemsKept"], 0);
        assert!(json["builtAt"].is_string());
    }

    #[test]
    fn test_write_scene_replaces_file() {
        let snapshot = snapshot();
        let payload = ScenePayload::new(&snapshot, &CloudConfig::default());
        let path =
            std::env::temp_dir().join(format!("newscloud-scene-{}.json", std::process::id()));

        write_scene(&path, &payload).unwrap();
        write_scene(&path, &payload).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written["placements"][0]["word"], "rally");
        assert!(!path.with_extension("json.tmp").exists());
    }
}
