//! TouchGuard entrypoint: load config and model, open the session store, and
//! serve the detection API until ctrl-c.

use std::sync::Arc;
use touchguard::api::{build_router, AppState};
use touchguard::config::ServerConfig;
use touchguard::detection::DetectionEngine;
use touchguard::logging::StructuredLogger;
use touchguard::model::{Classifier, OnnxClassifier};
use touchguard::store::SessionStore;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("TOUCHGUARD_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = ServerConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(data_dir = ?config.data_dir, "TouchGuard starting");

    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = config.data_dir.join("touchguard.db");
    let store = Arc::new(SessionStore::open(
        &db_path,
        chrono::Duration::seconds(config.detection.inactivity_secs),
    )?);

    let classifier: Arc<dyn Classifier> = Arc::new(OnnxClassifier::load(&config.model_path));
    let engine = DetectionEngine::new(
        classifier.clone(),
        store.clone(),
        config.detection.min_coordinates,
    );

    let state = Arc::new(AppState {
        engine,
        classifier,
        store,
        recent_limit: config.detection.recent_limit,
    });
    let app = build_router(state)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    info!("TouchGuard stopped");
    Ok(())
}
