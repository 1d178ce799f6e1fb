//! File-based snapshot store with TTL.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot with the time it was written
#[derive(Serialize, Deserialize)]
struct Snapshot<T> {
    data: T,
    saved_at: DateTime<Utc>,
}

/// JSON snapshots of scrape results, one file per key
pub struct SnapshotStore {
    base_dir: PathBuf,
    ttl: Duration,
}

impl SnapshotStore {
    pub fn new(base_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            base_dir: base_dir.into(),
            ttl,
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        // Keys come from URL segments; keep them to a safe file name
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{}.json", file))
    }

    /// Stored data if present and younger than the TTL.
    ///
    /// Expired snapshots are removed; unreadable ones are treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let content = std::fs::read_to_string(&path).ok()?;
        let snapshot: Snapshot<T> = serde_json::from_str(&content).ok()?;

        if Utc::now() - snapshot.saved_at > self.ttl {
            let _ = std::fs::remove_file(&path);
            return None;
        }

        Some(snapshot.data)
    }

    /// Write a snapshot, replacing any existing one.
    pub fn put<T: Serialize>(&self, key: &str, data: &T) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("Failed to create {}", self.base_dir.display()))?;

        let snapshot = Snapshot {
            data,
            saved_at: Utc::now(),
        };
        let path = self.path(key);
        std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}
