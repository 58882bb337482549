use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use sqlx::PgPool;

pub mod ai;
pub mod auth;
pub mod billing;
pub mod config;
pub mod error;
pub mod extractor;
pub mod invocations;
pub mod routes;
pub mod settings;

use ai::AiGateway;
use settings::AuthSettingsStore;

pub async fn root() -> &'static str {
    "Dashboard API"
}

/// Application router with its shared state attached.
pub fn build_app(
    pool: PgPool,
    auth_settings: Arc<AuthSettingsStore>,
    gateway: AiGateway,
) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(routes::api_routes())
        .layer(Extension(pool))
        .layer(Extension(auth_settings))
        .layer(Extension(gateway))
}
