//! In-memory scan trees for facet and query tests.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use metadata::TagInfo;

use crate::scan::{ScanDir, ScanEntry, ScanFile, TrackMetadata};

#[derive(Clone, Debug)]
pub struct TrackSpec {
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub modified: SystemTime,
}

impl TrackSpec {
    pub fn new(album_artist: &str, album: &str, title: &str) -> Self {
        Self {
            artist: None,
            album_artist: Some(album_artist.to_string()),
            album: Some(album.to_string()),
            title: Some(title.to_string()),
            genre: Some("Pop".to_string()),
            year: Some(2001),
            modified: UNIX_EPOCH,
        }
    }

    pub fn artist(mut self, artist: &str) -> Self {
        self.artist = Some(artist.to_string());
        self
    }

    pub fn genre(mut self, genre: &str) -> Self {
        self.genre = Some(genre.to_string());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn modified(mut self, modified: SystemTime) -> Self {
        self.modified = modified;
        self
    }
}

pub fn album_dir(path: &str, entries: Vec<ScanEntry>) -> ScanDir {
    let path = PathBuf::from(path);
    ScanDir {
        name: file_name(&path),
        path,
        image_path: None,
        entries,
    }
}

pub fn track(path: &str, spec: TrackSpec) -> ScanEntry {
    let path = PathBuf::from(path);
    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    ScanEntry::File(ScanFile {
        name: file_name(&path),
        metadata: Some(TrackMetadata {
            tags: TagInfo {
                artist: spec.artist,
                album_artist: spec.album_artist,
                album: spec.album,
                title: spec.title,
                genre: spec.genre,
                year: spec.year,
            },
            file_stem,
            modified: spec.modified,
        }),
        path,
    })
}

pub fn untagged(path: &str) -> ScanEntry {
    let path = PathBuf::from(path);
    ScanEntry::File(ScanFile {
        name: file_name(&path),
        path,
        metadata: None,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
