//! Activity log of what the agent collected and where it sent it.
//!
//! Only counters are kept; no collected values end up in this log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cumulative activity counters.
#[derive(Debug)]
pub struct ActivityLog {
    collections: AtomicU64,
    collections_denied: AtomicU64,
    photos_collected: AtomicU64,
    bundles_saved: AtomicU64,
    bundles_shared: AtomicU64,
    uploads_attempted: AtomicU64,
    uploads_succeeded: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            collections: AtomicU64::new(0),
            collections_denied: AtomicU64::new(0),
            photos_collected: AtomicU64::new(0),
            bundles_saved: AtomicU64::new(0),
            bundles_shared: AtomicU64::new(0),
            uploads_attempted: AtomicU64::new(0),
            uploads_succeeded: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an activity log that persists to `path`, resuming earlier counts.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous activity stats: {e}");
        }

        log
    }

    /// Record a finished photo collection.
    pub fn record_collection(&self, photos: usize, denied: bool) {
        self.collections.fetch_add(1, Ordering::Relaxed);
        if denied {
            self.collections_denied.fetch_add(1, Ordering::Relaxed);
        }
        self.photos_collected
            .fetch_add(photos as u64, Ordering::Relaxed);
    }

    pub fn record_bundle_saved(&self) {
        self.bundles_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bundle_shared(&self) {
        self.bundles_shared.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upload attempt and whether the endpoint accepted it.
    pub fn record_upload(&self, succeeded: bool) {
        self.uploads_attempted.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            self.uploads_succeeded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            collections: self.collections.load(Ordering::Relaxed),
            collections_denied: self.collections_denied.load(Ordering::Relaxed),
            photos_collected: self.photos_collected.load(Ordering::Relaxed),
            bundles_saved: self.bundles_saved.load(Ordering::Relaxed),
            bundles_shared: self.bundles_shared.load(Ordering::Relaxed),
            uploads_attempted: self.uploads_attempted.load(Ordering::Relaxed),
            uploads_succeeded: self.uploads_succeeded.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Activity:\n\
             - Photo collections: {} ({} refused)\n\
             - Photo records collected: {}\n\
             - Bundles saved: {}\n\
             - Bundles shared: {}\n\
             - Uploads: {} attempted, {} accepted",
            stats.collections,
            stats.collections_denied,
            stats.photos_collected,
            stats.bundles_saved,
            stats.bundles_shared,
            stats.uploads_attempted,
            stats.uploads_succeeded
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let persisted = PersistedStats {
                stats: self.stats(),
                last_updated: Utc::now(),
            };
            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;
                let stats = persisted.stats;

                self.collections.store(stats.collections, Ordering::Relaxed);
                self.collections_denied
                    .store(stats.collections_denied, Ordering::Relaxed);
                self.photos_collected
                    .store(stats.photos_collected, Ordering::Relaxed);
                self.bundles_saved.store(stats.bundles_saved, Ordering::Relaxed);
                self.bundles_shared
                    .store(stats.bundles_shared, Ordering::Relaxed);
                self.uploads_attempted
                    .store(stats.uploads_attempted, Ordering::Relaxed);
                self.uploads_succeeded
                    .store(stats.uploads_succeeded, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub collections: u64,
    pub collections_denied: u64,
    pub photos_collected: u64,
    pub bundles_saved: u64,
    pub bundles_shared: u64,
    pub uploads_attempted: u64,
    pub uploads_succeeded: u64,
    pub session_start: DateTime<Utc>,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    #[serde(flatten)]
    stats: ActivityStats,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log.
pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

/// Create a new shared activity log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedActivityLog {
    Arc::new(ActivityLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_counting() {
        let log = ActivityLog::new();

        log.record_collection(12, false);
        log.record_collection(0, true);
        log.record_upload(true);
        log.record_upload(false);

        let stats = log.stats();
        assert_eq!(stats.collections, 2);
        assert_eq!(stats.collections_denied, 1);
        assert_eq!(stats.photos_collected, 12);
        assert_eq!(stats.uploads_attempted, 2);
        assert_eq!(stats.uploads_succeeded, 1);
    }

    #[test]
    fn test_persistence_resumes_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("activity.json");

        let log = ActivityLog::with_persistence(path.clone());
        log.record_bundle_saved();
        log.record_bundle_shared();
        log.save().unwrap();

        let resumed = ActivityLog::with_persistence(path);
        let stats = resumed.stats();
        assert_eq!(stats.bundles_saved, 1);
        assert_eq!(stats.bundles_shared, 1);
        assert_eq!(stats.collections, 0);
    }

    #[test]
    fn test_summary_format() {
        let summary = ActivityLog::new().summary();
        assert!(summary.contains("Photo collections"));
        assert!(summary.contains("Bundles saved"));
        assert!(summary.contains("Uploads"));
    }
}
