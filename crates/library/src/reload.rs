use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use common::{BrowseItem, BrowseOptions};
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::query::Library;
use crate::{LibraryError, LibraryStats};

/// Holds the active library snapshot and swaps it wholesale on reload.
/// Loads are serialized, so snapshots are committed in the order their
/// builds started.
pub struct ReloadableLibrary {
    root_paths: Vec<PathBuf>,
    latest: RwLock<Option<Arc<Library>>>,
    building: Mutex<()>,
    generation: AtomicU64,
}

impl ReloadableLibrary {
    pub fn new(root_paths: Vec<PathBuf>) -> Self {
        Self {
            root_paths,
            latest: RwLock::new(None),
            building: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn root_paths(&self) -> &[PathBuf] {
        &self.root_paths
    }

    /// Builds a fresh snapshot and makes it current. On failure the previous
    /// snapshot stays active.
    pub fn load(&self, cancel: &CancellationToken) -> Result<LibraryStats, LibraryError> {
        let _building = self.building.lock();
        let started = Instant::now();
        let library = Library::build(&self.root_paths, cancel)?;
        let stats = library.stats();
        *self.latest.write() = Some(Arc::new(library));
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!(
            "Library loaded in {} ms: {} files, {} artists, {} genres, {} years",
            started.elapsed().as_millis(),
            stats.files,
            stats.artists,
            stats.genres,
            stats.years
        );
        Ok(stats)
    }

    /// Number of snapshots committed so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.latest.read().is_some()
    }

    /// Current snapshot. Queries run against it without holding the lock.
    pub fn snapshot(&self) -> Result<Arc<Library>, LibraryError> {
        self.latest.read().clone().ok_or(LibraryError::NotLoaded)
    }

    pub fn browse(&self, key: &str, opts: &BrowseOptions) -> Result<Vec<BrowseItem>, LibraryError> {
        Ok(self.snapshot()?.browse(key, opts))
    }

    pub fn media(&self, key: &str, opts: &BrowseOptions) -> Result<Vec<String>, LibraryError> {
        self.snapshot()?.media(key, opts)
    }
}
