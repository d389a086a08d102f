//! Advisory result cache. Modeled on the teacher's file-based TTL
//! cache in `utils/cache.rs` (`is_cache_valid`/`write_cache`/
//! `cleanup_old_cache`), held in memory here since the cached value is
//! a small computed report body rather than a fetched HTTP payload.
//!
//! The spec's per-store cache key is `(store_id, now_utc rounded to
//! the second)`; this implementation coarsens that to whole-report
//! granularity — `(chunk_size, now_utc rounded to the second)` — since
//! the engine computes all of a run's rows in one
//! `build_report_chunked` call and has no I/O of its own to intercept
//! per store. A miss never alters the computed output, only whether
//! that computation is skipped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const CACHE_TTL: Duration = Duration::from_secs(3600);

struct Entry {
    csv_body: String,
    inserted_at: Instant,
}

#[derive(Clone)]
pub struct ReportCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn key(chunk_size: usize, now_utc: chrono::DateTime<chrono::Utc>) -> String {
        format!("{chunk_size}:{}", now_utc.format("%Y-%m-%dT%H:%M:%S"))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut guard = self.entries.lock().await;
        match guard.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < CACHE_TTL => Some(entry.csv_body.clone()),
            Some(_) => {
                guard.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, csv_body: String) {
        let mut guard = self.entries.lock().await;
        guard.insert(
            key,
            Entry {
                csv_body,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop entries past their TTL. Run periodically by the queue
    /// worker, mirroring `cleanup_old_cache`'s sweep.
    pub async fn cleanup_expired(&self) {
        let mut guard = self.entries.lock().await;
        let before = guard.len();
        guard.retain(|_, entry| entry.inserted_at.elapsed() < CACHE_TTL);
        let removed = before - guard.len();
        if removed > 0 {
            tracing::debug!(removed, "cleaned up expired report cache entries");
        }
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_then_hit_after_insert() {
        let cache = ReportCache::new();
        let key = ReportCache::key(50, chrono::Utc::now());
        assert!(cache.get(&key).await.is_none());
        cache.insert(key.clone(), "store_id,...".to_string()).await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("store_id,..."));
    }

    #[test]
    fn key_is_stable_within_the_same_second() {
        let now = chrono::Utc::now();
        assert_eq!(ReportCache::key(10, now), ReportCache::key(10, now));
    }
}
