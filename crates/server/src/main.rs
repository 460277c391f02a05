mod api;
mod config;
mod scan;
mod state;
mod utils;
mod watch;

use axum::Router;
use api::api_router;
use config::{apply_env_overrides, config_path_from_env, load_or_create_config, resolve_root_paths};
use library::ReloadableLibrary;
use scan::start_reload;
use state::AppState;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use watch::configure_watcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (mut config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }
    apply_env_overrides(&mut config);

    let root_paths = resolve_root_paths(&config_path, &config);
    for root in &root_paths {
        if !root.exists() {
            warn!("Music root not found: {}", root.display());
        }
    }
    info!("Indexing roots: {:?}", root_paths);

    let bind_addr = config.listen_addr.clone();
    let shutdown = CancellationToken::new();
    let state = AppState::new(
        ReloadableLibrary::new(root_paths),
        config,
        shutdown.clone(),
    );

    start_reload(state.clone());
    configure_watcher(&state);

    let app = Router::new()
        .nest("/api/v1", api_router(state.clone()))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    *state.watcher.write() = None;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for ctrl-c: {}", err);
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
    shutdown.cancel();
}
