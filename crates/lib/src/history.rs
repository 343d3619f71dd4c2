//! Watch progress records and their merge from the backend.
//!
//! Progress is kept locally under one key per content item
//! (`vidking_progress_<content_id>`) in the player's camelCase format. The
//! backend speaks snake_case; [`merge_server_history`] converts between them.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Result,
    constants::PROGRESS_KEY_PREFIX,
    remote::string_or_number,
    storage::{self, KvStore},
};

/// One watch-history row as returned by `GET /watch-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerHistoryItem {
    #[serde(deserialize_with = "string_or_number")]
    pub content_id: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub progress: f64,
    pub media_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub tmdb_id: String,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Timestamp string as sent by the backend, normally RFC3339.
    pub last_watched: String,
}

/// Body of `POST /watch-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpload {
    pub content_id: String,
    pub tmdb_id: String,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    pub timestamp: f64,
    pub duration: f64,
    pub progress: f64,
}

/// Locally stored progress of one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProgress {
    pub timestamp: f64,
    pub duration: f64,
    pub progress: f64,
    pub media_type: String,
    pub id: String,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Milliseconds since Unix epoch; `None` when the source time was unreadable.
    #[serde(default)]
    pub last_watched: Option<i64>,
}

impl From<&ServerHistoryItem> for WatchProgress {
    fn from(item: &ServerHistoryItem) -> Self {
        let last_watched = DateTime::parse_from_rfc3339(&item.last_watched)
            .map(|dt| dt.timestamp_millis())
            .map_err(|e| {
                warn!(content_id = %item.content_id, value = %item.last_watched, error = %e,
                    "Unreadable last_watched timestamp");
            })
            .ok();

        Self {
            timestamp: item.timestamp,
            duration: item.duration,
            progress: item.progress,
            media_type: item.media_type.clone(),
            id: item.tmdb_id.clone(),
            season: item.season,
            episode: item.episode,
            last_watched,
        }
    }
}

/// Store key for the progress of `content_id`.
pub fn progress_key(content_id: &str) -> String {
    format!("{PROGRESS_KEY_PREFIX}{content_id}")
}

/// Write every server item into the store, overwriting local progress for
/// the same content. Returns the number of items written.
pub fn merge_server_history(store: &dyn KvStore, items: &[ServerHistoryItem]) -> Result<usize> {
    for item in items {
        storage::write_json(
            store,
            &progress_key(&item.content_id),
            &WatchProgress::from(item),
        )?;
    }
    debug!(count = items.len(), "Merged server watch history");
    Ok(items.len())
}

/// Stored progress of `content_id`, if any.
pub fn load_progress(store: &dyn KvStore, content_id: &str) -> Result<Option<WatchProgress>> {
    storage::read_json(store, &progress_key(content_id))
}

/// All stored progress as `(content_id, progress)`, most recently watched first.
///
/// This is the data behind the "continue watching" row.
pub fn continue_watching(store: &dyn KvStore) -> Result<Vec<(String, WatchProgress)>> {
    let mut entries = Vec::new();
    for key in store.keys()? {
        let Some(content_id) = key.strip_prefix(PROGRESS_KEY_PREFIX) else {
            continue;
        };
        if let Some(progress) = storage::read_json::<WatchProgress>(store, &key)? {
            entries.push((content_id.to_string(), progress));
        }
    }
    entries.sort_by(|a, b| b.1.last_watched.cmp(&a.1.last_watched));
    Ok(entries)
}
