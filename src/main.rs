pub mod api;
pub mod cache;
pub mod config;
pub mod queue;
pub mod snapshot;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use storepulse_core::clock::{self, Clock};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::api::AppState;

#[tokio::main]
async fn main() {
    let app_config = config::AppConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    let num_threads = app_config.rayon_threads.unwrap_or_else(|| num_cpus::get().saturating_sub(2).max(1));
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|index| format!("rayon-{index}"))
        .build_global()
        .expect("failed to initialize rayon thread pool");

    tracing::info!("Starting storepulse");
    tracing::info!(environment = %app_config.environment, port = app_config.port, rayon_threads = num_threads, "loaded configuration");

    let snapshot = Arc::new(
        snapshot::load(&app_config).unwrap_or_else(|e| panic!("failed to load report snapshot: {e}")),
    );
    tracing::info!(store_count = snapshot.store_ids().len(), "loaded snapshot");

    let clock: Arc<dyn Clock> = clock::resolve(app_config.current_timestamp_override.as_deref()).into();
    let report_store = store::new_store();
    let cache = cache::ReportCache::new();
    let jobs = queue::spawn(snapshot.clone(), report_store.clone(), cache.clone());

    let state = AppState {
        snapshot,
        store: report_store,
        jobs,
        clock,
        cache,
        config: Arc::new(app_config.clone()),
    };

    let governor_conf = Arc::new(GovernorConfigBuilder::default().per_second(2).burst_size(5).finish().unwrap());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/reports", post(api::trigger_report_handler).layer(GovernorLayer::new(governor_conf)))
        .route("/reports/{report_id}", get(api::get_report_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "binding server");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    tracing::info!(%addr, "serving");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .unwrap();
}
