use std::sync::atomic::Ordering;
use std::time::SystemTime;

use tracing::{info, warn};

use crate::state::{AppState, LibraryStatus};

/// Starts a background reload. When one is already running, another pass is
/// queued to run right after it and `false` is returned.
pub fn start_reload(state: AppState) -> bool {
    if !begin_reload(&state) {
        info!("Library reload already in progress; queued another pass");
        return false;
    }
    tokio::spawn(async move {
        finish_reload(state).await;
    });
    true
}

fn begin_reload(state: &AppState) -> bool {
    let mut status = state.status.write();
    if matches!(*status, LibraryStatus::Loading { .. }) {
        state.reload_pending.store(true, Ordering::SeqCst);
        return false;
    }
    *status = LibraryStatus::Loading {
        started: SystemTime::now(),
    };
    true
}

/// Runs reload passes until no further request arrived during the last one.
async fn finish_reload(state: AppState) -> LibraryStatus {
    loop {
        let status = reload_once(&state).await;

        let rerun = {
            let mut current = state.status.write();
            if state.reload_pending.swap(false, Ordering::SeqCst) {
                *current = LibraryStatus::Loading {
                    started: SystemTime::now(),
                };
                true
            } else {
                *current = status.clone();
                false
            }
        };
        if !rerun {
            return status;
        }
        info!("Changes arrived during reload; running another pass");
    }
}

async fn reload_once(state: &AppState) -> LibraryStatus {
    let library = state.library.clone();
    let cancel = state.shutdown.child_token();
    let result = tokio::task::spawn_blocking(move || library.load(&cancel)).await;

    match result {
        Ok(Ok(stats)) => {
            info!(
                "Library ready: {} files, {} artists, {} genres, {} years",
                stats.files, stats.artists, stats.genres, stats.years
            );
            LibraryStatus::Ready(stats)
        }
        Ok(Err(err)) => {
            let message = err.to_string();
            if state.library.is_loaded() {
                warn!("Library reload failed, keeping previous index: {}", message);
            } else {
                warn!("Library load failed: {}", message);
            }
            LibraryStatus::Error(message)
        }
        Err(err) => {
            let message = err.to_string();
            warn!("Library reload join error: {}", message);
            LibraryStatus::Error(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    use library::ReloadableLibrary;
    use tokio_util::sync::CancellationToken;

    use super::{begin_reload, finish_reload};
    use crate::config::ServerConfig;
    use crate::state::{AppState, LibraryStatus};

    fn state_for(roots: Vec<PathBuf>) -> AppState {
        AppState::new(
            ReloadableLibrary::new(roots),
            ServerConfig::default(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn reload_reports_ready_stats() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("01.mp3"), b"noise").unwrap();
        let state = state_for(vec![dir.path().to_path_buf()]);

        assert!(begin_reload(&state));
        match finish_reload(state.clone()).await {
            LibraryStatus::Ready(stats) => assert_eq!(stats.files, 1),
            other => panic!("unexpected status {:?}", other),
        }
        assert!(matches!(*state.status.read(), LibraryStatus::Ready(_)));
        assert!(state.library.is_loaded());
        assert_eq!(state.library.generation(), 1);
        assert!(begin_reload(&state));
    }

    #[tokio::test]
    async fn request_during_reload_runs_another_pass() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("01.mp3"), b"noise").unwrap();
        let state = state_for(vec![dir.path().to_path_buf()]);

        assert!(begin_reload(&state));
        assert!(!begin_reload(&state));
        assert!(state.reload_pending.load(Ordering::SeqCst));

        match finish_reload(state.clone()).await {
            LibraryStatus::Ready(stats) => assert_eq!(stats.files, 1),
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(state.library.generation(), 2);
        assert!(!state.reload_pending.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn missing_root_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(vec![dir.path().join("absent")]);

        assert!(begin_reload(&state));
        let status = finish_reload(state.clone()).await;
        assert!(matches!(status, LibraryStatus::Error(_)));
        assert!(!state.library.is_loaded());
    }
}
