//! Child-list merging for lazily fetched nodes.
//!
//! A node's visible children are its fetched rows plus a stand-in for every
//! expanded immediate child that the fetched pages do not (yet) contain. This
//! is what lets navigation reveal a deep node before the pages holding its
//! ancestors have been loaded.
//!
//! Placeholders are recomputed on every render and never stored. When a real
//! row with the same path arrives it simply replaces the stand-in.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::expansion::ExpansionState;
use crate::model::Row;
use crate::path;

/// Where a [`ChildView`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChildOrigin {
    /// A row returned by the remote store.
    Fetched,
    /// A stand-in for an expanded child not present in the fetched rows.
    Placeholder {
        /// Every page of the parent has loaded and the path was not in them.
        unresolved: bool,
    },
}

/// One entry of a node's rendered child list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildView {
    /// Full path.
    pub path: String,
    /// Display name.
    pub name: String,
    /// Number of descendants; `None` when unknown.
    pub size: Option<u64>,
    /// Whether the entry can be expanded.
    pub has_children: bool,
    /// Fetched row or placeholder.
    pub origin: ChildOrigin,
}

impl ChildView {
    /// Build a view from a fetched row.
    pub fn fetched(row: &Row) -> Self {
        Self {
            path: row.path.clone(),
            name: row.name.clone(),
            size: Some(row.size),
            has_children: row.is_expandable(),
            origin: ChildOrigin::Fetched,
        }
    }

    /// Build a placeholder for an expanded path.
    ///
    /// The selected node is assumed to be the navigation target and therefore
    /// a leaf until its real row says otherwise.
    pub fn placeholder(node_path: &str, selected: Option<&str>, unresolved: bool) -> Self {
        Self {
            path: node_path.to_string(),
            name: path::name(node_path).to_string(),
            size: None,
            has_children: selected != Some(node_path),
            origin: ChildOrigin::Placeholder { unresolved },
        }
    }

    /// Whether this entry is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, ChildOrigin::Placeholder { .. })
    }

    /// Whether this entry is a placeholder known to be missing upstream.
    pub fn is_unresolved(&self) -> bool {
        matches!(self.origin, ChildOrigin::Placeholder { unresolved: true })
    }
}

/// Sibling ordering: case-insensitive by name, ties broken by raw bytes.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Compute the rendered children of `node_path`.
///
/// Equivalent to [`render_with_completeness`] with `fetched_complete = false`.
pub fn render(
    node_path: &str,
    fetched: &[Row],
    expansion: &ExpansionState,
    selected: Option<&str>,
) -> Vec<ChildView> {
    render_with_completeness(node_path, fetched, expansion, selected, false)
}

/// Compute the rendered children of `node_path`, marking placeholders as
/// unresolved when `fetched_complete` says every page has been loaded.
///
/// A suppressed node ignores `fetched` entirely: only placeholders for its
/// expanded children are shown until suppression is released.
pub fn render_with_completeness(
    node_path: &str,
    fetched: &[Row],
    expansion: &ExpansionState,
    selected: Option<&str>,
    fetched_complete: bool,
) -> Vec<ChildView> {
    let suppressed = expansion.is_suppressed(node_path);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut children: Vec<ChildView> = Vec::new();
    if !suppressed {
        children.reserve(fetched.len());
        for row in fetched {
            if seen.insert(row.path.as_str()) {
                children.push(ChildView::fetched(row));
            } else {
                tracing::debug!(path = %row.path, "dropping duplicate fetched row");
            }
        }
    }

    let unresolved = fetched_complete && !suppressed;
    for child_path in expansion.expanded_children_of(node_path) {
        if seen.contains(child_path) {
            continue;
        }
        let placeholder = ChildView::placeholder(child_path, selected, unresolved);
        let at = children.partition_point(|existing| {
            compare_names(&existing.name, &placeholder.name) != Ordering::Greater
        });
        children.insert(at, placeholder);
    }

    children
}
