//! In-memory work queue dispatching report-generation jobs to a
//! background worker, standing in for the durable task queue the spec
//! places out of scope. Implements the retry/backoff policy (3
//! retries, 10s/20s/40s) for the run's one recognized transient
//! failure mode: the shared snapshot being mid-reload and momentarily
//! reporting no observations for any store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use storepulse_core::error::ReportError;
use storepulse_core::orchestrator::{build_report_chunked, Snapshot};
use tokio::sync::mpsc;

use crate::cache::ReportCache;
use crate::store::{self, SharedReportStore};

pub struct Job {
    pub report_id: String,
    pub chunk_size: usize,
    pub now: DateTime<Utc>,
}

const BACKOFF_DELAYS: [Duration; 3] = [Duration::from_secs(10), Duration::from_secs(20), Duration::from_secs(40)];

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

pub fn spawn(snapshot: Arc<Snapshot>, store: SharedReportStore, cache: ReportCache) -> mpsc::Sender<Job> {
    let (tx, mut rx) = mpsc::channel::<Job>(64);

    let sweep_cache = cache.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(CACHE_SWEEP_INTERVAL).await;
            sweep_cache.cleanup_expired().await;
        }
    });

    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let snapshot = snapshot.clone();
            let store = store.clone();
            let cache = cache.clone();
            tokio::spawn(async move {
                run_job(job, snapshot, store, cache).await;
            });
        }
    });

    tx
}

async fn run_job(job: Job, snapshot: Arc<Snapshot>, store: SharedReportStore, cache: ReportCache) {
    let cache_key = ReportCache::key(job.chunk_size, job.now);
    if let Some(csv_body) = cache.get(&cache_key).await {
        tracing::info!(report_id = job.report_id, "serving report from cache");
        store::mark_complete(&store, &job.report_id, csv_body).await;
        return;
    }

    match run_with_retry(&snapshot, job.now, job.chunk_size).await {
        Ok(csv_body) => {
            cache.insert(cache_key, csv_body.clone()).await;
            store::mark_complete(&store, &job.report_id, csv_body).await;
        }
        Err(e) => {
            tracing::error!(report_id = job.report_id, error = %e, "report generation failed");
            store::mark_failed(&store, &job.report_id, e.to_string()).await;
        }
    }
}

async fn run_with_retry(snapshot: &Arc<Snapshot>, now: DateTime<Utc>, chunk_size: usize) -> Result<String, ReportError> {
    let mut attempt = 0usize;
    loop {
        let snapshot = snapshot.clone();
        let result = tokio::task::spawn_blocking(move || build_report_chunked(&snapshot, now, chunk_size))
            .await
            .expect("report computation task panicked without being caught internally");

        match result {
            Ok(csv_body) => return Ok(csv_body),
            Err(ReportError::EmptyObservations) if attempt < BACKOFF_DELAYS.len() => {
                let delay = BACKOFF_DELAYS[attempt];
                tracing::warn!(attempt, delay_secs = delay.as_secs(), "snapshot momentarily empty, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
