use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::SystemTime;

use axum::http::StatusCode;
use axum::Json;
use common::BrowseItem;
use library::{LibraryStats, ReloadableLibrary};
use notify::RecommendedWatcher;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub library: Arc<ReloadableLibrary>,
    pub status: Arc<RwLock<LibraryStatus>>,
    /// Set when a reload is requested while one is running.
    pub reload_pending: Arc<AtomicBool>,
    pub config: Arc<ServerConfig>,
    pub watcher: Arc<RwLock<Option<RecommendedWatcher>>>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        library: ReloadableLibrary,
        config: ServerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            library: Arc::new(library),
            status: Arc::new(RwLock::new(LibraryStatus::Idle)),
            reload_pending: Arc::new(AtomicBool::new(false)),
            config: Arc::new(config),
            watcher: Arc::new(RwLock::new(None)),
            shutdown,
        }
    }
}

#[derive(Clone, Debug)]
pub enum LibraryStatus {
    Idle,
    Loading { started: SystemTime },
    Ready(LibraryStats),
    Error(String),
}

impl LibraryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LibraryStatus::Idle => "idle",
            LibraryStatus::Loading { .. } => "loading",
            LibraryStatus::Ready(_) => "ready",
            LibraryStatus::Error(_) => "error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub started: bool,
    pub queued: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub key: Option<String>,
    pub search: Option<String>,
    pub browse_type: Option<String>,
    pub reverse: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub items: Vec<BrowseItem>,
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub keys: Vec<String>,
}

#[derive(Serialize)]
pub struct LibraryStatusResponse {
    pub status: String,
    pub message: Option<String>,
    pub files: Option<usize>,
    pub artists: Option<usize>,
    pub genres: Option<usize>,
    pub years: Option<usize>,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
