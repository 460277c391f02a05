use std::path::PathBuf;
use std::time::Instant;

use common::{BrowseItem, BrowseOptions, BrowseType};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::facet::{build_file_facet, FacetBuilder};
use crate::node::{FacetIndex, NodeId};
use crate::scan::{scan_roots, ScanTree};
use crate::{LibraryError, LibraryStats};

/// One immutable snapshot of every facet over the scanned collection.
#[derive(Debug)]
pub struct Library {
    root_paths: Vec<PathBuf>,
    files: FacetIndex,
    album_artists: FacetIndex,
    genres: FacetIndex,
    years: FacetIndex,
    modify_dates: FacetIndex,
}

impl Library {
    /// Scans `root_paths` and indexes the result.
    pub fn build(root_paths: &[PathBuf], cancel: &CancellationToken) -> Result<Self, LibraryError> {
        let started = Instant::now();
        let tree = scan_roots(root_paths, cancel)?;
        info!(
            "Scanned {} root paths: {} files in {} ms",
            root_paths.len(),
            tree.file_count(),
            started.elapsed().as_millis()
        );
        let mut library = Self::from_scan(&tree, cancel)?;
        library.root_paths = root_paths.to_vec();
        Ok(library)
    }

    pub fn from_scan(tree: &ScanTree, cancel: &CancellationToken) -> Result<Self, LibraryError> {
        let album_artists = build_facet(FacetBuilder::artist_album(), tree, cancel)?;
        let files = build_file_facet(tree, cancel)?;
        info!("Indexed file paths");
        let genres = build_facet(FacetBuilder::genre(), tree, cancel)?;
        let years = build_facet(FacetBuilder::year(), tree, cancel)?;
        let modify_dates = build_facet(FacetBuilder::modified(), tree, cancel)?;

        Ok(Self {
            root_paths: Vec::new(),
            files,
            album_artists,
            genres,
            years,
            modify_dates,
        })
    }

    pub fn root_paths(&self) -> &[PathBuf] {
        &self.root_paths
    }

    pub fn index(&self, browse_type: BrowseType) -> &FacetIndex {
        match browse_type {
            BrowseType::File => &self.files,
            BrowseType::AlbumArtist => &self.album_artists,
            BrowseType::Genre => &self.genres,
            BrowseType::Year => &self.years,
            BrowseType::Modified => &self.modify_dates,
        }
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            files: self.files.leaf_count(),
            artists: self.album_artists.roots().len(),
            genres: self.genres.roots().len(),
            years: self.years.roots().len(),
        }
    }

    /// Lists the children of `key` (or the facet roots for an empty key)
    /// that survive the text filter. Unknown keys yield an empty list.
    pub fn browse(&self, key: &str, opts: &BrowseOptions) -> Vec<BrowseItem> {
        let index = self.index(opts.browse_type);
        let filter = normalize_filter(&opts.text_filter);

        if key.is_empty() {
            return filter_items(index, None, index.roots(), &filter);
        }

        match index.find(key) {
            Some(id) => filter_items(index, Some(id), index.node(id).children(), &filter),
            None => Vec::new(),
        }
    }

    /// Resolves `key` to the playable locators beneath it, depth first.
    pub fn media(&self, key: &str, opts: &BrowseOptions) -> Result<Vec<String>, LibraryError> {
        let index = self.index(opts.browse_type);
        if key.is_empty() {
            return Err(LibraryError::EmptyKey);
        }
        let filter = normalize_filter(&opts.text_filter);

        let id = match index.find(key) {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };

        if parent_match(index, index.node(id).parent(), &filter) {
            return Ok(index.leaf_keys(id));
        }

        let mut keys = Vec::new();
        filter_leaves(index, id, &filter, &mut keys);
        Ok(keys)
    }
}

fn build_facet(
    builder: FacetBuilder,
    tree: &ScanTree,
    cancel: &CancellationToken,
) -> Result<FacetIndex, LibraryError> {
    let index = builder.build(tree, cancel)?;
    info!(
        "Indexed {}: {} nodes, {} tracks",
        builder.name(),
        index.len(),
        index.leaf_count()
    );
    Ok(index)
}

fn normalize_filter(filter: &str) -> String {
    filter.trim().to_lowercase()
}

fn filter_items(
    index: &FacetIndex,
    parent: Option<NodeId>,
    candidates: &[NodeId],
    filter: &str,
) -> Vec<BrowseItem> {
    let parent_matches = parent_match(index, parent, filter);
    candidates
        .iter()
        .filter(|id| parent_matches || node_or_descendant_match(index, **id, filter))
        .map(|id| index.node(*id).to_browse_item())
        .collect()
}

fn parent_match(index: &FacetIndex, parent: Option<NodeId>, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    match parent {
        Some(parent) => index
            .ancestors(parent)
            .any(|node| node.lower_name().contains(filter)),
        None => false,
    }
}

fn node_or_descendant_match(index: &FacetIndex, id: NodeId, filter: &str) -> bool {
    if node_match(index, id, filter) {
        return true;
    }
    index
        .node(id)
        .children()
        .iter()
        .any(|child| node_or_descendant_match(index, *child, filter))
}

fn node_match(index: &FacetIndex, id: NodeId, filter: &str) -> bool {
    filter.is_empty() || index.node(id).lower_name().contains(filter)
}

/// Emits every leaf of a matching subtree; non-matching subtrees are
/// searched child by child.
fn filter_leaves(index: &FacetIndex, id: NodeId, filter: &str, out: &mut Vec<String>) {
    if node_match(index, id, filter) {
        index.walk_leaves(id, &mut |leaf| out.push(leaf.key().to_string()));
        return;
    }
    for child in index.node(id).children() {
        filter_leaves(index, *child, filter, out);
    }
}
