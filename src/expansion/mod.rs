//! Expansion and selection state for the tree view.
//!
//! [`ExpansionState`] is an immutable value: every transition returns a new
//! state and leaves the receiver untouched. The front-end applies
//! transitions by dispatching [`Action`]s through [`ExpansionState::apply`].
//!
//! Each non-root path is in one of three [`NodeState`]s. Two invariants hold
//! after every transition:
//!
//! - every proper ancestor of an expanded path (except the root) is expanded;
//! - every suppressed path is expanded.
//!
//! The root (a single-segment path) is always visible and never tracked.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::path;

/// Display state of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Not expanded.
    Collapsed,
    /// Expanded, and its real children should be fetched.
    ExpandedFetched,
    /// Expanded for navigation only; children are placeholders until released.
    ExpandedSuppressed,
}

impl NodeState {
    /// Whether the node is expanded in either form.
    pub fn is_expanded(self) -> bool {
        !matches!(self, Self::Collapsed)
    }
}

/// A user-triggered transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum Action {
    /// Collapse an expanded path or expand a collapsed one.
    Toggle(String),
    /// Reveal a path by expanding it and its ancestors without fetching.
    ExpandToNode(String),
    /// Allow a suppressed path to fetch its real children.
    ReleaseSuppression(String),
    /// Collapse everything.
    CollapseAll,
}

/// Which paths are expanded and which of those have fetching suppressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
    suppressed: BTreeSet<String>,
}

impl ExpansionState {
    /// Empty state: everything collapsed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an action, returning the resulting state.
    #[must_use]
    pub fn apply(&self, action: &Action) -> Self {
        tracing::debug!(?action, "expansion transition");
        match action {
            Action::Toggle(path) => self.toggle(path),
            Action::ExpandToNode(path) => self.expand_to_node(path),
            Action::ReleaseSuppression(path) => self.release_suppression(path),
            Action::CollapseAll => self.collapse_all(),
        }
    }

    /// Collapse an expanded path, or expand a collapsed one for fetching.
    ///
    /// Collapsing drops the path's whole subtree from both sets, so
    /// re-expanding it starts from a collapsed subtree. Expanding a path whose
    /// ancestors are not expanded marks those ancestors suppressed.
    #[must_use]
    pub fn toggle(&self, node_path: &str) -> Self {
        if path::is_root(node_path) {
            return self.clone();
        }

        let mut next = self.clone();
        if self.expanded.contains(node_path) {
            remove_subtree(&mut next.expanded, node_path);
            remove_subtree(&mut next.suppressed, node_path);
        } else {
            for ancestor in path::ancestors(node_path).filter(|a| !path::is_root(a)) {
                next.reveal(ancestor);
            }
            next.expanded.insert(node_path.to_string());
            next.suppressed.remove(node_path);
        }
        next
    }

    /// Expand `target` and every non-root ancestor without triggering fetches.
    ///
    /// Paths already expanded keep their current state. Calling this twice
    /// with the same target is the same as calling it once.
    #[must_use]
    pub fn expand_to_node(&self, target: &str) -> Self {
        if path::is_root(target) {
            return self.clone();
        }

        let mut next = self.clone();
        for ancestor in path::ancestors(target).filter(|a| !path::is_root(a)) {
            next.reveal(ancestor);
        }
        next.reveal(target);
        next
    }

    /// Let a suppressed path fetch its real children. No-op otherwise.
    #[must_use]
    pub fn release_suppression(&self, node_path: &str) -> Self {
        if !self.suppressed.contains(node_path) {
            return self.clone();
        }
        let mut next = self.clone();
        next.suppressed.remove(node_path);
        next
    }

    /// Collapse everything.
    #[must_use]
    pub fn collapse_all(&self) -> Self {
        Self::default()
    }

    /// Mark a collapsed path expanded-suppressed; leave expanded paths alone.
    fn reveal(&mut self, node_path: &str) {
        if self.expanded.insert(node_path.to_string()) {
            self.suppressed.insert(node_path.to_string());
        }
    }

    /// Current state of a path. The root always reports expanded-fetched.
    pub fn state_of(&self, node_path: &str) -> NodeState {
        if path::is_root(node_path) {
            NodeState::ExpandedFetched
        } else if self.suppressed.contains(node_path) {
            NodeState::ExpandedSuppressed
        } else if self.expanded.contains(node_path) {
            NodeState::ExpandedFetched
        } else {
            NodeState::Collapsed
        }
    }

    /// Whether a path is expanded (in either form).
    pub fn is_expanded(&self, node_path: &str) -> bool {
        self.state_of(node_path).is_expanded()
    }

    /// Whether a path has fetching suppressed.
    pub fn is_suppressed(&self, node_path: &str) -> bool {
        self.suppressed.contains(node_path)
    }

    /// All expanded paths, in lexicographic order.
    pub fn expanded_paths(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }

    /// All suppressed paths, in lexicographic order.
    pub fn suppressed_paths(&self) -> impl Iterator<Item = &str> {
        self.suppressed.iter().map(String::as_str)
    }

    /// Expanded paths whose real children should be fetched.
    pub fn fetch_candidates(&self) -> impl Iterator<Item = &str> {
        self.expanded
            .iter()
            .filter(|p| !self.suppressed.contains(*p))
            .map(String::as_str)
    }

    /// Expanded paths that are immediate children of `parent_path`.
    pub fn expanded_children_of<'a>(
        &'a self,
        parent_path: &'a str,
    ) -> impl Iterator<Item = &'a str> {
        let prefix = format!("{parent_path}{}", path::DELIMITER);
        self.expanded
            .range(prefix.clone()..)
            .take_while(move |p| p.starts_with(&prefix))
            .map(String::as_str)
            .filter(move |p| path::is_child_of(parent_path, p))
    }

    /// Whether nothing is expanded.
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// Remove a path and all of its descendants from a sorted set.
///
/// Descendants share the `path > ` prefix, so they form one contiguous range.
fn remove_subtree(set: &mut BTreeSet<String>, node_path: &str) {
    set.remove(node_path);
    let prefix = format!("{node_path}{}", path::DELIMITER);
    let doomed: Vec<String> = set
        .range(prefix.clone()..)
        .take_while(|p| p.starts_with(&prefix))
        .cloned()
        .collect();
    for p in doomed {
        set.remove(&p);
    }
}

/// Which node is selected and which row the view should scroll to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Currently selected path.
    pub selected_path: Option<String>,
    /// Path the view should bring into view on its next render.
    pub scroll_target: Option<String>,
}

impl SelectionState {
    /// Select a path without scrolling.
    #[must_use]
    pub fn select(&self, node_path: &str) -> Self {
        Self {
            selected_path: Some(node_path.to_string()),
            scroll_target: self.scroll_target.clone(),
        }
    }

    /// Select a path and request that it be scrolled into view.
    #[must_use]
    pub fn select_and_scroll(&self, node_path: &str) -> Self {
        Self {
            selected_path: Some(node_path.to_string()),
            scroll_target: Some(node_path.to_string()),
        }
    }

    /// Drop the pending scroll request once the view reached it.
    #[must_use]
    pub fn clear_scroll_target(&self) -> Self {
        Self {
            selected_path: self.selected_path.clone(),
            scroll_target: None,
        }
    }

    /// Selected path, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected_path.as_deref()
    }
}
