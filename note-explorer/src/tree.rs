use indexmap::IndexMap;

use crate::logging::explorer_trace;

/// One file or directory entry of a backend listing.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Node {
    /// Full path; unique across the tree.
    pub path: String,
    /// Base name (no parent path)
    pub name: String,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Ordered children (directories only).
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
    /// File size in bytes (files only, when available).
    #[cfg_attr(feature = "serde", serde(default))]
    pub size: Option<u64>,
    /// Last modified time in seconds since the Unix epoch (when available).
    #[cfg_attr(feature = "serde", serde(default))]
    pub modified_at: Option<u64>,
}

impl Node {
    /// Creates a file node; the name is derived from the path.
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_string(),
            path,
            is_directory: false,
            children: Vec::new(),
            size: None,
            modified_at: None,
        }
    }

    /// Creates a directory node; the name is derived from the path.
    pub fn directory(path: impl Into<String>, children: Vec<Node>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_string(),
            path,
            is_directory: true,
            children,
            size: None,
            modified_at: None,
        }
    }
}

/// Full backend listing: the ordered root-level nodes.
///
/// A tree is never patched in place; every refresh replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tree {
    /// Root-level nodes in display order.
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Wraps root-level nodes.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Returns whether the listing has no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Flattened, path-keyed view of one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    /// Full path.
    pub path: String,
    /// Base name.
    pub name: String,
    /// Whether this entry is a directory.
    pub is_directory: bool,
    /// Parent directory path; `None` for root-level nodes.
    pub parent: Option<String>,
    /// Nesting depth (root-level nodes are 0).
    pub depth: usize,
    /// File size in bytes.
    pub size: Option<u64>,
    /// Last modified time in seconds since the Unix epoch.
    pub modified_at: Option<u64>,
}

/// Path index rebuilt alongside every tree replacement.
///
/// Lookups are O(1) instead of a recursive walk per interaction. Iteration
/// order of the index is the depth-first display order of the tree.
#[derive(Clone, Debug, Default)]
pub struct TreeIndex {
    tree: Tree,
    by_path: IndexMap<String, NodeInfo>,
    directories: Vec<String>,
}

impl TreeIndex {
    /// Builds an index over `tree`.
    ///
    /// When the backend reports the same path twice the first occurrence wins.
    pub fn new(tree: Tree) -> Self {
        let mut by_path = IndexMap::new();
        let mut directories = Vec::new();
        for node in &tree.nodes {
            index_node(node, None, 0, &mut by_path, &mut directories);
        }
        Self {
            tree,
            by_path,
            directories,
        }
    }

    /// Returns the underlying tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Looks up a node by path.
    pub fn lookup(&self, path: &str) -> Option<&NodeInfo> {
        self.by_path.get(path)
    }

    /// Returns whether `path` exists in the current tree.
    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Returns whether `path` is a known directory.
    pub fn is_directory(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|n| n.is_directory)
    }

    /// Every directory path of the tree, in display order.
    pub fn all_directory_paths(&self) -> &[String] {
        &self.directories
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Returns whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Iterates nodes in display order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeInfo> {
        self.by_path.values()
    }
}

fn index_node(
    node: &Node,
    parent: Option<&str>,
    depth: usize,
    by_path: &mut IndexMap<String, NodeInfo>,
    directories: &mut Vec<String>,
) {
    if by_path.contains_key(&node.path) {
        explorer_trace!(
            event = "tree.duplicate_path",
            path = %node.path,
            "duplicate path in listing ignored"
        );
        return;
    }
    by_path.insert(
        node.path.clone(),
        NodeInfo {
            path: node.path.clone(),
            name: node.name.clone(),
            is_directory: node.is_directory,
            parent: parent.map(str::to_string),
            depth,
            size: node.size,
            modified_at: node.modified_at,
        },
    );
    if node.is_directory {
        directories.push(node.path.clone());
        for child in &node.children {
            index_node(child, Some(&node.path), depth + 1, by_path, directories);
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Joins a directory path and a child name with `/`.
///
/// An empty parent yields the bare name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        return name.to_string();
    }
    if parent.ends_with(is_separator) {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Returns the parent directory of `path`, or `None` for a bare name.
pub fn parent_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches(is_separator);
    let idx = trimmed.rfind(is_separator)?;
    if idx == 0 {
        return Some(&trimmed[..1]);
    }
    Some(&trimmed[..idx])
}

/// Returns the last path segment.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    match trimmed.rfind(is_separator) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Returns whether `ancestor` is a strict ancestor directory of `path`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    let ancestor = ancestor.trim_end_matches(is_separator);
    if ancestor.is_empty() || path.len() <= ancestor.len() {
        return false;
    }
    path.starts_with(ancestor) && path[ancestor.len()..].starts_with(is_separator)
}
