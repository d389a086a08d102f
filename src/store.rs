//! In-memory report registry, standing in for the persistent store the
//! spec places out of scope. Mirrors the teacher's
//! `Arc<Mutex<...>>`-guarded shared state pattern (`SharedData` et al.
//! in `data_structures.rs`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

#[derive(Clone, Debug)]
pub enum ReportStatus {
    Running,
    Complete,
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct ReportRecord {
    pub status: ReportStatus,
    pub csv_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub type SharedReportStore = Arc<Mutex<HashMap<String, ReportRecord>>>;

pub fn new_store() -> SharedReportStore {
    Arc::new(Mutex::new(HashMap::new()))
}

pub async fn insert_running(store: &SharedReportStore, report_id: String, now: DateTime<Utc>) {
    let mut guard = store.lock().await;
    guard.insert(
        report_id,
        ReportRecord {
            status: ReportStatus::Running,
            csv_body: None,
            created_at: now,
        },
    );
}

pub async fn mark_complete(store: &SharedReportStore, report_id: &str, csv_body: String) {
    let mut guard = store.lock().await;
    if let Some(record) = guard.get_mut(report_id) {
        record.status = ReportStatus::Complete;
        record.csv_body = Some(csv_body);
    }
}

pub async fn mark_failed(store: &SharedReportStore, report_id: &str, reason: String) {
    let mut guard = store.lock().await;
    if let Some(record) = guard.get_mut(report_id) {
        record.status = ReportStatus::Failed(reason);
    }
}

pub async fn get(store: &SharedReportStore, report_id: &str) -> Option<ReportRecord> {
    store.lock().await.get(report_id).cloned()
}
