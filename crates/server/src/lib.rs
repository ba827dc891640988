// Library crate: upload boundary, build orchestration and the reference
// compilation tool. `main.rs` serves the router, `bin/bundle_tool.rs` runs the tool.

pub mod build;
pub mod config;
pub mod fixtures;
pub mod routes;
pub mod tool;
pub mod upload;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use build::BuildOrchestrator;
use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BuildOrchestrator>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            orchestrator: Arc::new(BuildOrchestrator::new(config.build.clone())),
        }
    }
}

pub fn app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/upload", post(routes::upload))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
