//! Core data structures for taxonomy rows and trees.
//!
//! - [`Row`]: a node as returned by the children, root and search endpoints.
//! - [`FlatRow`]: a node as produced by ingestion, carrying its parent and depth.
//! - [`TreeNode`]: an assembled nested node.
//!
//! Response envelopes for each endpoint live alongside so the HTTP client and
//! the CLI share one set of serde types. Field names follow the wire format
//! (camelCase) via `#[serde(rename_all)]`.

use serde::{Deserialize, Serialize};

use crate::path;

/// A single taxonomy node as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Full path, unique across the taxonomy.
    pub path: String,
    /// Last path segment.
    pub name: String,
    /// Number of descendant nodes.
    pub size: u64,
    /// Whether the node has children; absent in search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_children: Option<bool>,
}

impl Row {
    /// Create a row, deriving the name from the path.
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let name = path::name(&path).to_string();
        Self {
            path,
            name,
            size,
            has_children: None,
        }
    }

    /// Set the has-children flag.
    #[must_use]
    pub fn with_children(mut self, has_children: bool) -> Self {
        self.has_children = Some(has_children);
        self
    }

    /// Depth of this row's path.
    pub fn depth(&self) -> usize {
        path::depth(&self.path)
    }

    /// Whether the row can be expanded.
    ///
    /// Rows without an explicit flag are assumed expandable, except when
    /// their size says they have no descendants.
    pub fn is_expandable(&self) -> bool {
        self.has_children.unwrap_or(self.size > 0)
    }
}

/// A node as produced by ingestion, before assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    /// Full path.
    pub path: String,
    /// Last path segment.
    pub name: String,
    /// Parent path; `None` only for the root.
    #[serde(default)]
    pub parent_path: Option<String>,
    /// Number of path segments minus one.
    pub depth: usize,
    /// Number of descendant nodes.
    pub size: u64,
}

impl FlatRow {
    /// Build a flat row from a path, deriving name, parent and depth.
    pub fn from_path(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        Self {
            name: path::name(&path).to_string(),
            parent_path: path::parent(&path).map(str::to_string),
            depth: path::depth(&path),
            size,
            path,
        }
    }
}

impl From<&FlatRow> for Row {
    fn from(row: &FlatRow) -> Self {
        Self {
            path: row.path.clone(),
            name: row.name.clone(),
            size: row.size,
            has_children: None,
        }
    }
}

/// An assembled tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Node name.
    pub name: String,
    /// Number of descendant nodes.
    pub size: u64,
    /// Children in input order.
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a leaf node.
    pub fn leaf(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            children: Vec::new(),
        }
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Response of `GET /nodes/root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    /// The root row.
    pub node: Row,
    /// Depth-1 children, sorted by name.
    pub children: Vec<Row>,
}

/// Response of `GET /nodes/children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildrenResponse {
    /// One page of children, sorted by name.
    pub children: Vec<Row>,
    /// Total number of children of the node.
    pub total: usize,
}

/// Response of `GET /nodes/subtree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeResponse {
    /// Assembled subtree rooted at the requested path.
    pub tree: TreeNode,
}

/// Response of `GET /search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching rows, largest first.
    pub results: Vec<Row>,
    /// Total number of matches.
    pub total: usize,
    /// Trimmed query the server used.
    pub query: String,
    /// Effective page size.
    pub limit: usize,
    /// Effective offset.
    pub offset: usize,
}

impl SearchResponse {
    /// Whether another page follows this one.
    pub fn has_next_page(&self) -> bool {
        self.offset + self.results.len() < self.total
    }

    /// Whether a page precedes this one.
    pub fn has_previous_page(&self) -> bool {
        self.offset > 0
    }
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error message.
    pub error: String,
}
