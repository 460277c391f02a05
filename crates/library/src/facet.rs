use std::time::UNIX_EPOCH;

use common::{encode_custom_key, encode_file_key};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::node::{FacetIndex, Node, NodeId};
use crate::scan::{ScanDir, ScanEntry, ScanFile, ScanTree, TrackMetadata};
use crate::LibraryError;

pub const UNKNOWN_YEAR: &str = "Unknown year";

/// Outcome of one dimension step: a node already present in the lookup, or
/// a new one for the engine to register.
#[derive(Debug)]
pub enum Built {
    Existing(NodeId),
    Created(Node),
}

/// One level of a metadata facet. Interior levels append their value to the
/// key segments; `Track` ends the chain with a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Genre,
    AlbumArtist { scheme: &'static str },
    Album { scheme: &'static str },
    Year,
    ModifiedYear,
    ModifiedMonth,
    Track,
}

impl Dimension {
    pub fn build(
        &self,
        index: &FacetIndex,
        dir: &ScanDir,
        file: &ScanFile,
        meta: &TrackMetadata,
        segments: &mut Vec<String>,
    ) -> Built {
        let (scheme, value) = match self {
            Dimension::Track => {
                let node = Node::new(track_name(meta), encode_file_key(&file.path));
                return Built::Created(node);
            }
            Dimension::Genre => ("genre", meta.genre().to_string()),
            Dimension::AlbumArtist { scheme } => (*scheme, meta.album_artist().to_string()),
            Dimension::Album { scheme } => (*scheme, meta.album().to_string()),
            Dimension::Year => ("year", year_name(meta.year())),
            Dimension::ModifiedYear => ("modyear", modified_at(meta).year().to_string()),
            Dimension::ModifiedMonth => {
                ("modmonth", format!("{:02}", u8::from(modified_at(meta).month())))
            }
        };

        segments.push(value);
        let key = encode_custom_key(scheme, segments.as_slice());
        if let Some(existing) = index.find(&key) {
            return Built::Existing(existing);
        }

        let name = segments.last().cloned().unwrap_or_default();
        let mut node = Node::new(name, key);
        if let Dimension::Album { .. } = self {
            let image = dir.image_path.as_deref().map(encode_file_key);
            node = node.with_image(image);
        }
        Built::Created(node)
    }
}

/// Builds one metadata facet from an ordered dimension chain.
#[derive(Clone, Debug)]
pub struct FacetBuilder {
    name: &'static str,
    dimensions: Vec<Dimension>,
}

impl FacetBuilder {
    pub fn new(name: &'static str, dimensions: Vec<Dimension>) -> Self {
        Self { name, dimensions }
    }

    pub fn artist_album() -> Self {
        Self::new(
            "artist/album",
            vec![
                Dimension::AlbumArtist { scheme: "artist" },
                Dimension::Album { scheme: "artistalbum" },
                Dimension::Track,
            ],
        )
    }

    pub fn genre() -> Self {
        Self::new(
            "genre",
            vec![
                Dimension::Genre,
                Dimension::AlbumArtist {
                    scheme: "genreartist",
                },
                Dimension::Album {
                    scheme: "genrealbum",
                },
                Dimension::Track,
            ],
        )
    }

    pub fn year() -> Self {
        Self::new(
            "year",
            vec![
                Dimension::Year,
                Dimension::AlbumArtist {
                    scheme: "yearartist",
                },
                Dimension::Album { scheme: "yearalbum" },
                Dimension::Track,
            ],
        )
    }

    pub fn modified() -> Self {
        Self::new(
            "modified",
            vec![
                Dimension::ModifiedYear,
                Dimension::ModifiedMonth,
                Dimension::AlbumArtist { scheme: "modartist" },
                Dimension::Album { scheme: "modalbum" },
                Dimension::Track,
            ],
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn build(
        &self,
        tree: &ScanTree,
        cancel: &CancellationToken,
    ) -> Result<FacetIndex, LibraryError> {
        let mut index = FacetIndex::new();

        tree.walk_files(|dir, file| {
            if cancel.is_cancelled() {
                return Err(LibraryError::Cancelled);
            }
            let meta = match &file.metadata {
                Some(meta) => meta,
                None => {
                    debug!("No metadata for {:?}; skipped in {} facet", file.path, self.name);
                    return Ok(());
                }
            };

            let mut segments = Vec::with_capacity(self.dimensions.len());
            let mut parent: Option<NodeId> = None;
            for dimension in &self.dimensions {
                let id = match dimension.build(&index, dir, file, meta, &mut segments) {
                    Built::Existing(id) => id,
                    Built::Created(node) => index.insert(node, parent),
                };
                parent = Some(id);
            }
            Ok(())
        })?;

        index.sort();
        Ok(index)
    }
}

/// Mirrors the scanned directory tree one node per entry.
pub fn build_file_facet(
    tree: &ScanTree,
    cancel: &CancellationToken,
) -> Result<FacetIndex, LibraryError> {
    let mut index = FacetIndex::new();
    for root in &tree.roots {
        add_dir(&mut index, None, root, cancel)?;
    }
    index.sort();
    Ok(index)
}

fn add_dir(
    index: &mut FacetIndex,
    parent: Option<NodeId>,
    dir: &ScanDir,
    cancel: &CancellationToken,
) -> Result<(), LibraryError> {
    if cancel.is_cancelled() {
        return Err(LibraryError::Cancelled);
    }
    let id = index.insert(Node::new(dir.name.clone(), encode_file_key(&dir.path)), parent);
    for entry in &dir.entries {
        match entry {
            ScanEntry::Dir(child) => add_dir(index, Some(id), child, cancel)?,
            ScanEntry::File(file) => {
                index.insert(
                    Node::new(file.name.clone(), encode_file_key(&file.path)),
                    Some(id),
                );
            }
        }
    }
    Ok(())
}

/// Leaf label: the title, prefixed with the track artist when it differs
/// from the album artist.
pub fn track_name(meta: &TrackMetadata) -> String {
    let artist = meta.artist();
    if artist != meta.album_artist() {
        format!("{} - {}", artist, meta.title())
    } else {
        meta.title().to_string()
    }
}

fn year_name(year: i32) -> String {
    if year == 0 {
        UNKNOWN_YEAR.to_string()
    } else {
        year.to_string()
    }
}

/// Modification time in UTC. Times outside the representable calendar range
/// fall back to the Unix epoch.
fn modified_at(meta: &TrackMetadata) -> OffsetDateTime {
    let modified = meta.modified();
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).ok(),
        Err(err) => i64::try_from(err.duration().as_secs()).ok().map(|secs| -secs),
    };
    match secs.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok()) {
        Some(at) => at,
        None => {
            warn!("Modification time {:?} out of range; using the epoch", modified);
            OffsetDateTime::UNIX_EPOCH
        }
    }
}
