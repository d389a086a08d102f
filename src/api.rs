use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use storepulse_core::clock::Clock;
use storepulse_core::error::ReportError;
use storepulse_core::orchestrator::Snapshot;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::cache::ReportCache;
use crate::config::AppConfig;
use crate::queue::Job;
use crate::store::{self, ReportStatus, SharedReportStore};

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<Snapshot>,
    pub store: SharedReportStore,
    pub jobs: mpsc::Sender<Job>,
    pub clock: Arc<dyn Clock>,
    pub cache: ReportCache,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerParams {
    chunk_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TriggerResponse {
    report_id: String,
}

/// `POST /reports?chunk_size=N`. Mirrors
/// `views.trigger_report_parallel` in the source implementation.
pub async fn trigger_report_handler(State(state): State<AppState>, Query(params): Query<TriggerParams>) -> impl IntoResponse {
    let chunk_size = params.chunk_size.unwrap_or(state.config.chunk_size).max(1);
    let report_id = Uuid::new_v4().to_string();
    let now = state.clock.now();

    store::insert_running(&state.store, report_id.clone(), now).await;

    info!(report_id, chunk_size, "triggered report generation");

    let job = Job {
        report_id: report_id.clone(),
        chunk_size,
        now,
    };
    if state.jobs.send(job).await.is_err() {
        store::mark_failed(&state.store, &report_id, "worker queue is not accepting jobs".to_string()).await;
    }

    (StatusCode::ACCEPTED, Json(TriggerResponse { report_id }))
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum ReportStatusResponse {
    Running,
    Complete { report_csv: String },
    Failed { error: String },
}

/// `GET /reports/:report_id`. Mirrors `views.get_report`.
pub async fn get_report_handler(State(state): State<AppState>, Path(report_id): Path<String>) -> Response {
    match store::get(&state.store, &report_id).await {
        None => (StatusCode::NOT_FOUND, ReportError::ReportNotFound(report_id).to_string()).into_response(),
        Some(record) => {
            let body = match record.status {
                ReportStatus::Running => ReportStatusResponse::Running,
                ReportStatus::Complete => ReportStatusResponse::Complete {
                    report_csv: record.csv_body.unwrap_or_default(),
                },
                ReportStatus::Failed(reason) => ReportStatusResponse::Failed { error: reason },
            };
            (StatusCode::OK, Json(body)).into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    environment: String,
    node_name: String,
    store_count: usize,
    current_system_time: String,
}

/// `GET /health`. Mirrors `api::health_handler`'s liveness/config echo.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        environment: state.config.environment.clone(),
        node_name: state.config.node_name.clone(),
        store_count: state.snapshot.store_ids().len(),
        current_system_time: state.clock.now().to_rfc3339(),
    };
    (StatusCode::OK, Json(response))
}
