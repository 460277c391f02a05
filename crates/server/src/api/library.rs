use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::scan::start_reload;
use crate::state::{AppState, LibraryStatus, LibraryStatusResponse, ReloadResponse};

pub async fn reload(State(state): State<AppState>) -> (StatusCode, Json<ReloadResponse>) {
    let started = start_reload(state);
    (
        StatusCode::ACCEPTED,
        Json(ReloadResponse {
            started,
            queued: !started,
        }),
    )
}

pub async fn status(State(state): State<AppState>) -> Json<LibraryStatusResponse> {
    let current = state.status.read().clone();
    let stats = state.library.snapshot().ok().map(|library| library.stats());
    let message = match &current {
        LibraryStatus::Idle => Some("library not loaded yet".to_string()),
        LibraryStatus::Loading { started } => Some(format!(
            "library indexing in progress ({}s)",
            started.elapsed().map(|d| d.as_secs()).unwrap_or(0)
        )),
        LibraryStatus::Ready(_) => None,
        LibraryStatus::Error(message) => Some(format!("library error: {}", message)),
    };
    Json(LibraryStatusResponse {
        status: current.label().to_string(),
        message,
        files: stats.as_ref().map(|s| s.files),
        artists: stats.as_ref().map(|s| s.artists),
        genres: stats.as_ref().map(|s| s.genres),
        years: stats.as_ref().map(|s| s.years),
    })
}
