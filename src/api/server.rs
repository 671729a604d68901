use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::{services, state::AppState};
use crate::config::Config;
use crate::observability::Metrics;
use crate::sites::SiteRegistry;
use crate::tasks::{HttpConfig, PageDownloader, TaskBroker, TaskStore, WorkerContext, spawn_workers};
use crate::storage::ArtifactStore;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the gateway router. Shared by `run` and the integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/{site}/comic/{comicid}", get(services::get_comic_info))
        .route(
            "/api/{site}/comic/{comicid}/{chapter_number}",
            get(services::get_chapter_info),
        )
        .route("/api/{site}/search", get(services::search))
        .route("/api/{site}/tags", get(services::tags))
        .route("/api/{site}/list", get(services::tag_list))
        .route("/api/{site}/latest", get(services::latest))
        .route("/aggregate/search", get(services::aggregate_search))
        .route(
            "/manage/cookies/{site}",
            get(services::get_cookies).post(services::update_cookies),
        )
        .route("/manage/task/add", get(services::add_task))
        .route("/manage/task/list", get(services::list_tasks))
        .route("/health", get(services::health))
        .with_state(state)
        // Automatically decompress gzip/deflate request bodies
        .layer(RequestDecompressionLayer::new())
}

pub async fn run(address: SocketAddr) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    if config.server.manage_secret.is_none() {
        info!("No manage secret configured, /manage endpoints are open");
    }

    info!(path = %config.server.data_path.display(), "Opening task store");
    let store = Arc::new(
        TaskStore::open(&config.server.data_path)
            .map_err(|e| format!("Failed to open task store: {}", e))?,
    );

    let artifacts = Arc::new(
        ArtifactStore::from_config(&config.storage)
            .map_err(|e| format!("Failed to open artifact store: {}", e))?,
    );

    let sites = Arc::new(SiteRegistry::with_defaults(&config));
    info!(sites = ?sites.site_names(), "Site registry initialized");

    let (broker, worker_receivers) = TaskBroker::new(
        store.clone(),
        config.tasks.num_workers,
        config.tasks.channel_size,
    );
    let broker = Arc::new(broker);

    let downloader = Arc::new(
        PageDownloader::new(HttpConfig::default())
            .map_err(|e| format!("Failed to build downloader: {}", e))?,
    );

    let metrics = Arc::new(Metrics::new());

    let worker_ctx = WorkerContext {
        store: store.clone(),
        sites: sites.clone(),
        artifacts,
        downloader,
        // PDF rendering and mail transport are external backends; none are
        // wired in by default, the worker logs and skips those steps.
        pdf: None,
        mailer: None,
        metrics: metrics.clone(),
    };
    let _worker_handles = spawn_workers(worker_ctx, worker_receivers);

    let state = AppState::new(config, sites, store, broker, metrics);
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "comicbox API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
