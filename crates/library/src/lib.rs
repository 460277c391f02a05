mod facet;
mod node;
mod query;
mod reload;
mod scan;

#[cfg(test)]
mod fixtures;

use std::fmt;

use common::ParseBrowseTypeError;
use serde::{Deserialize, Serialize};

pub use common::{BrowseItem, BrowseOptions, BrowseType};
pub use facet::{build_file_facet, track_name, Built, Dimension, FacetBuilder, UNKNOWN_YEAR};
pub use node::{Ancestors, FacetIndex, Node, NodeId};
pub use query::Library;
pub use reload::ReloadableLibrary;
pub use scan::{
    scan_roots, ScanDir, ScanEntry, ScanFile, ScanTree, TrackMetadata, UNKNOWN_ALBUM,
    UNKNOWN_ARTIST, UNKNOWN_GENRE,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub files: usize,
    pub artists: usize,
    pub genres: usize,
    pub years: usize,
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Walk(walkdir::Error),
    Cancelled,
    NotLoaded,
    EmptyKey,
    UnsupportedBrowseType(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Walk(err) => write!(f, "scan error: {}", err),
            LibraryError::Cancelled => write!(f, "library build cancelled"),
            LibraryError::NotLoaded => write!(f, "library not loaded"),
            LibraryError::EmptyKey => write!(f, "must specify a key"),
            LibraryError::UnsupportedBrowseType(value) => {
                write!(f, "unsupported browse type: {}", value)
            }
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<walkdir::Error> for LibraryError {
    fn from(err: walkdir::Error) -> Self {
        LibraryError::Walk(err)
    }
}

impl From<ParseBrowseTypeError> for LibraryError {
    fn from(err: ParseBrowseTypeError) -> Self {
        LibraryError::UnsupportedBrowseType(err.0)
    }
}

/// Parses a facet selector coming from outside the process.
pub fn parse_browse_type(value: &str) -> Result<BrowseType, LibraryError> {
    Ok(value.parse::<BrowseType>()?)
}
