use std::path::PathBuf;
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::scan::start_reload;
use crate::state::AppState;

pub fn configure_watcher(state: &AppState) {
    if !state.config.watch_music {
        info!("Watcher disabled (watch_music=false)");
        *state.watcher.write() = None;
        return;
    }

    let watch_debounce_secs = if state.config.watch_debounce_secs == 0 {
        2
    } else {
        state.config.watch_debounce_secs
    };
    let watch_debounce = Duration::from_secs(watch_debounce_secs);
    let roots = state.library.root_paths().to_vec();

    match setup_watcher(state.clone(), &roots, watch_debounce) {
        Ok(watcher) => {
            info!(
                "Watching {} root(s) for changes (debounce {}s)",
                roots.len(),
                watch_debounce.as_secs()
            );
            *state.watcher.write() = Some(watcher);
        }
        Err(err) => {
            warn!("Failed to start watcher: {}", err);
            *state.watcher.write() = None;
        }
    }
}

fn setup_watcher(
    state: AppState,
    roots: &[PathBuf],
    debounce: Duration,
) -> Result<RecommendedWatcher, Box<dyn std::error::Error>> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )?;

    let mut watched = 0usize;
    for root in roots {
        match watcher.watch(root, RecursiveMode::Recursive) {
            Ok(()) => watched += 1,
            Err(err) => warn!("Cannot watch {}: {}", root.display(), err),
        }
    }
    if watched == 0 {
        return Err("no watchable root paths".into());
    }

    tokio::spawn(async move {
        watch_loop(state, rx, debounce).await;
    });

    Ok(watcher)
}

async fn watch_loop(state: AppState, mut rx: UnboundedReceiver<Event>, debounce: Duration) {
    while next_change(&mut rx, debounce, &state.shutdown).await {
        info!("Library change detected, reloading");
        start_reload(state.clone());
    }
}

/// Waits for a content change, then until `debounce` passes without another
/// one. Returns `false` once the channel closes or shutdown starts.
async fn next_change(
    rx: &mut UnboundedReceiver<Event>,
    debounce: Duration,
    shutdown: &CancellationToken,
) -> bool {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => return false,
            event = rx.recv() => match event {
                Some(event) => event,
                None => return false,
            },
        };
        if is_relevant_event(&event) {
            break;
        }
    }

    let quiet = tokio::time::sleep(debounce);
    tokio::pin!(quiet);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return false,
            _ = &mut quiet => return true,
            event = rx.recv() => match event {
                Some(event) if is_relevant_event(&event) => {
                    quiet.as_mut().reset(Instant::now() + debounce);
                }
                Some(_) => {}
                None => return false,
            },
        }
    }
}

fn is_relevant_event(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notify::event::{AccessKind, CreateKind, RemoveKind};
    use notify::{Event, EventKind};
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use super::{is_relevant_event, next_change};

    #[test]
    fn only_content_changes_trigger_reload() {
        assert!(is_relevant_event(&Event::new(EventKind::Create(CreateKind::File))));
        assert!(is_relevant_event(&Event::new(EventKind::Remove(RemoveKind::Folder))));
        assert!(!is_relevant_event(&Event::new(EventKind::Access(AccessKind::Read))));
    }

    #[tokio::test]
    async fn access_events_do_not_extend_the_debounce() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        tx.send(Event::new(EventKind::Create(CreateKind::File))).unwrap();

        let noise = tokio::spawn(async move {
            for _ in 0..40 {
                if tx.send(Event::new(EventKind::Access(AccessKind::Read))).is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        });

        let started = Instant::now();
        assert!(next_change(&mut rx, Duration::from_millis(60), &shutdown).await);
        assert!(started.elapsed() < Duration::from_millis(500));
        noise.abort();
    }

    #[tokio::test]
    async fn closed_channel_or_shutdown_stops_waiting() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
        let shutdown = CancellationToken::new();
        drop(tx);
        assert!(!next_change(&mut rx, Duration::from_millis(10), &shutdown).await);

        let (_tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Event>();
        shutdown.cancel();
        assert!(!next_change(&mut rx, Duration::from_millis(10), &shutdown).await);
    }
}
