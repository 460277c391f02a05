pub mod browse;
pub mod library;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::state::{AppState, HealthResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/browse", get(browse::browse))
        .route("/media", get(browse::media))
        .route("/library/reload", post(library::reload))
        .route("/library/status", get(library::status))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
