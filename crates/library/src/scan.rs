use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use metadata::{read_tags, TagInfo};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::LibraryError;

const AUDIO_EXTS: &[&str] = &["mp3", "m4a", "flac", "ogg", "wav"];
const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif"];
const COVER_STEMS: &[&str] = &["cover", "folder", "front", "album"];

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_GENRE: &str = "Unknown Genre";

/// Immutable result of scanning the configured roots.
#[derive(Debug, Clone, Default)]
pub struct ScanTree {
    pub roots: Vec<ScanDir>,
}

impl ScanTree {
    /// Visits every file depth-first, in listing order, together with the
    /// directory that holds it.
    pub fn walk_files<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&ScanDir, &ScanFile) -> Result<(), E>,
    {
        for root in &self.roots {
            root.walk_files(&mut f)?;
        }
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.roots.iter().map(ScanDir::file_count).sum()
    }
}

#[derive(Debug, Clone)]
pub enum ScanEntry {
    Dir(ScanDir),
    File(ScanFile),
}

#[derive(Debug, Clone)]
pub struct ScanDir {
    pub name: String,
    pub path: PathBuf,
    pub image_path: Option<PathBuf>,
    pub entries: Vec<ScanEntry>,
}

impl ScanDir {
    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                ScanEntry::Dir(dir) => dir.file_count(),
                ScanEntry::File(_) => 1,
            })
            .sum()
    }

    fn walk_files<E, F>(&self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&ScanDir, &ScanFile) -> Result<(), E>,
    {
        for entry in &self.entries {
            match entry {
                ScanEntry::Dir(dir) => dir.walk_files(f)?,
                ScanEntry::File(file) => f(self, file)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScanFile {
    pub name: String,
    pub path: PathBuf,
    /// `None` when no tag could be extracted from the file.
    pub metadata: Option<TrackMetadata>,
}

/// Tag values of one track with the fallbacks the facets rely on.
#[derive(Debug, Clone)]
pub struct TrackMetadata {
    pub tags: TagInfo,
    pub file_stem: String,
    pub modified: SystemTime,
}

impl TrackMetadata {
    pub fn artist(&self) -> &str {
        self.tags
            .artist
            .as_deref()
            .or(self.tags.album_artist.as_deref())
            .unwrap_or(UNKNOWN_ARTIST)
    }

    pub fn album_artist(&self) -> &str {
        self.tags
            .album_artist
            .as_deref()
            .or(self.tags.artist.as_deref())
            .unwrap_or(UNKNOWN_ARTIST)
    }

    pub fn album(&self) -> &str {
        self.tags.album.as_deref().unwrap_or(UNKNOWN_ALBUM)
    }

    pub fn title(&self) -> &str {
        self.tags.title.as_deref().unwrap_or(&self.file_stem)
    }

    pub fn genre(&self) -> &str {
        self.tags.genre.as_deref().unwrap_or(UNKNOWN_GENRE)
    }

    /// Recording year, `0` when unknown.
    pub fn year(&self) -> i32 {
        self.tags.year.unwrap_or(0)
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }
}

pub fn scan_roots(roots: &[PathBuf], cancel: &CancellationToken) -> Result<ScanTree, LibraryError> {
    let mut tree = ScanTree::default();
    for root in roots {
        let meta = fs::metadata(root)?;
        if !meta.is_dir() {
            return Err(LibraryError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a directory: {}", root.display()),
            )));
        }
        let name = root
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| root.to_string_lossy().to_string());
        if let Some(dir) = scan_dir(name, root, cancel)? {
            tree.roots.push(dir);
        }
    }
    Ok(tree)
}

fn scan_dir(
    name: String,
    dir: &Path,
    cancel: &CancellationToken,
) -> Result<Option<ScanDir>, LibraryError> {
    if cancel.is_cancelled() {
        return Err(LibraryError::Cancelled);
    }

    let mut scanned = ScanDir {
        name,
        path: dir.to_path_buf(),
        image_path: None,
        entries: Vec::new(),
    };
    let mut images = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if let Some(child) = scan_dir(file_name, path, cancel)? {
                scanned.entries.push(ScanEntry::Dir(child));
            }
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        if has_extension(path, IMAGE_EXTS) {
            images.push(path.to_path_buf());
        } else if has_extension(path, AUDIO_EXTS) {
            scanned.entries.push(ScanEntry::File(read_file(file_name, path)));
        }
    }

    if scanned.entries.is_empty() {
        return Ok(None);
    }
    scanned.image_path = pick_cover(&images);
    Ok(Some(scanned))
}

fn read_file(name: String, path: &Path) -> ScanFile {
    let tags = match read_tags(path) {
        Ok(Some(tags)) => Some(tags),
        Ok(None) => {
            debug!("No tags for {:?}", path);
            None
        }
        Err(err) => {
            warn!("Failed to read tags for {:?}: {}", path, err);
            None
        }
    };

    let metadata = tags.map(|tags| TrackMetadata {
        tags,
        file_stem: file_stem(path),
        modified: modified_time(path),
    });

    ScanFile {
        name,
        path: path.to_path_buf(),
        metadata,
    }
}

fn modified_time(path: &Path) -> SystemTime {
    match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(err) => {
            warn!("Failed to stat {:?}: {}", path, err);
            UNIX_EPOCH
        }
    }
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            allowed.contains(&ext.as_str())
        }
        None => false,
    }
}

fn pick_cover(images: &[PathBuf]) -> Option<PathBuf> {
    let named = images.iter().find(|path| {
        path.file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .map(|stem| COVER_STEMS.contains(&stem.as_str()))
            .unwrap_or(false)
    });
    named.or_else(|| images.first()).cloned()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown Track".to_string())
}
