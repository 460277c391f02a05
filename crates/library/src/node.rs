use std::collections::HashMap;

use common::BrowseItem;

/// Position of a node inside its facet's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One entry of a facet tree: either a grouping folder or a track leaf.
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    lower_name: String,
    key: String,
    image_uri: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower_name: String::new(),
            key: key.into(),
            image_uri: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_image(mut self, image_uri: Option<String>) -> Self {
        self.image_uri = image_uri.filter(|uri| !uri.is_empty());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower_name(&self) -> &str {
        &self.lower_name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn image_uri(&self) -> Option<&str> {
        self.image_uri.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_folder(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn to_browse_item(&self) -> BrowseItem {
        BrowseItem {
            name: self.name.clone(),
            key: self.key.clone(),
            image_uri: self.image_uri.clone(),
            folder: self.is_folder(),
        }
    }
}

/// Arena-backed tree for one facet plus a key lookup covering every node
/// ever registered in it.
#[derive(Clone, Debug, Default)]
pub struct FacetIndex {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    lookup: HashMap<String, NodeId>,
}

impl FacetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.lookup.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.find(key).map(|id| self.node(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.is_folder()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    /// Walks from `id` up to its facet root, starting with `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            index: self,
            next: Some(id),
        }
    }

    /// Calls `f` for every leaf below `id` in depth-first order; a leaf
    /// yields itself.
    pub fn walk_leaves<F>(&self, id: NodeId, f: &mut F)
    where
        F: FnMut(&Node),
    {
        let node = self.node(id);
        if !node.is_folder() {
            f(node);
            return;
        }
        for child in &node.children {
            self.walk_leaves(*child, f);
        }
    }

    pub fn leaf_keys(&self, id: NodeId) -> Vec<String> {
        let mut keys = Vec::new();
        self.walk_leaves(id, &mut |leaf| keys.push(leaf.key.clone()));
        keys
    }

    /// Registers a freshly built node, attaching it under `parent` or as a
    /// new root.
    pub(crate) fn insert(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.lower_name = node.name.to_lowercase();
        node.parent = parent;
        node.children.clear();
        self.lookup.insert(node.key.clone(), id);
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Orders roots, then every child list whose first entry is a folder.
    /// Leaf siblings keep their insertion order.
    pub(crate) fn sort(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        self.sort_by_name(&mut roots);
        for root in &roots {
            self.sort_children(*root);
        }
        self.roots = roots;
    }

    fn sort_children(&mut self, id: NodeId) {
        let first = match self.nodes[id.0].children.first() {
            Some(first) => *first,
            None => return,
        };
        if !self.node(first).is_folder() {
            return;
        }
        let mut children = std::mem::take(&mut self.nodes[id.0].children);
        self.sort_by_name(&mut children);
        for child in &children {
            self.sort_children(*child);
        }
        self.nodes[id.0].children = children;
    }

    fn sort_by_name(&self, ids: &mut [NodeId]) {
        ids.sort_by(|a, b| self.node(*a).lower_name.cmp(&self.node(*b).lower_name));
    }
}

pub struct Ancestors<'a> {
    index: &'a FacetIndex,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.index.node(id);
        self.next = node.parent;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::{FacetIndex, Node};

    #[test]
    fn insert_links_parent_and_child() {
        let mut index = FacetIndex::new();
        let root = index.insert(Node::new("Alice", "artist:///Alice"), None);
        let album = index.insert(Node::new("Red", "artistalbum:///Alice/Red"), Some(root));

        assert_eq!(index.roots(), &[root]);
        assert_eq!(index.node(root).children(), &[album]);
        assert_eq!(index.node(album).parent(), Some(root));
        assert_eq!(index.find("artistalbum:///Alice/Red"), Some(album));
        assert_eq!(index.node(root).lower_name(), "alice");
        assert!(index.node(root).is_folder());
        assert!(!index.node(album).is_folder());
    }

    #[test]
    fn ancestors_include_start_node() {
        let mut index = FacetIndex::new();
        let a = index.insert(Node::new("A", "x:///a"), None);
        let b = index.insert(Node::new("B", "x:///a/b"), Some(a));
        let c = index.insert(Node::new("C", "file:///c"), Some(b));

        let names: Vec<&str> = index.ancestors(c).map(|n| n.name()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn sort_orders_folders_but_not_leaves() {
        let mut index = FacetIndex::new();
        let zed = index.insert(Node::new("zed", "x:///zed"), None);
        let alpha = index.insert(Node::new("Alpha", "x:///alpha"), None);
        let beta = index.insert(Node::new("beta", "x:///alpha/beta"), Some(alpha));
        let able = index.insert(Node::new("Able", "x:///alpha/able"), Some(alpha));
        let leaf_z = index.insert(Node::new("Zulu", "file:///z"), Some(beta));
        let leaf_a = index.insert(Node::new("Apple", "file:///a"), Some(beta));
        index.insert(Node::new("only", "file:///o"), Some(able));
        index.insert(Node::new("leaf", "file:///l"), Some(zed));

        index.sort();

        assert_eq!(index.roots(), &[alpha, zed]);
        assert_eq!(index.node(alpha).children(), &[able, beta]);
        assert_eq!(index.node(beta).children(), &[leaf_z, leaf_a]);
    }

    #[test]
    fn walk_leaves_is_depth_first() {
        let mut index = FacetIndex::new();
        let root = index.insert(Node::new("root", "x:///r"), None);
        let left = index.insert(Node::new("left", "x:///r/l"), Some(root));
        index.insert(Node::new("1", "file:///1"), Some(left));
        index.insert(Node::new("2", "file:///2"), Some(left));
        index.insert(Node::new("3", "file:///3"), Some(root));

        assert_eq!(index.leaf_keys(root), vec!["file:///1", "file:///2", "file:///3"]);
        assert_eq!(index.leaf_count(), 3);
    }
}
