//! Session state that ties the engine together.
//!
//! [`Explorer`] owns the expansion and selection state plus the child page
//! cache. Every user transition goes through it and returns the fetches the
//! caller should start; finished fetches come back through
//! [`Explorer::apply_fetch`]. [`Explorer::visible_rows`] flattens the current
//! tree for display.
//!
//! All methods run on the caller's thread. Nothing here blocks or spawns.

use serde::Serialize;

use crate::cache::{ChildPage, ChildPageCache, Completion, FetchOutcome, FetchRequest, PageStatus};
use crate::expansion::{Action, ExpansionState, NodeState, SelectionState};
use crate::merge::{self, ChildView};
use crate::model::{RootResponse, Row};
use crate::path;
use crate::util;

/// A single line of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleRow {
    /// Path depth of the line (the root's children are at depth 1).
    pub depth: usize,
    /// What the line shows.
    pub kind: RowKind,
}

/// Content of a [`VisibleRow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowKind {
    /// A node, fetched or placeholder.
    Node {
        /// The node.
        view: ChildView,
        /// Display state of the node.
        #[serde(skip)]
        state: NodeState,
    },
    /// The first page of `parent` is loading.
    Loading {
        /// Node whose children are loading.
        parent: String,
    },
    /// Fetching `parent`'s children failed.
    Failed {
        /// Node whose fetch failed.
        parent: String,
        /// Failure message.
        message: String,
    },
    /// `parent` is suppressed; activating this loads its real children.
    Load {
        /// Suppressed node.
        parent: String,
    },
    /// More pages of `parent` exist.
    LoadMore {
        /// Node with further pages.
        parent: String,
        /// A next page is already in flight.
        loading: bool,
    },
}

impl VisibleRow {
    /// Path this row acts on: the node itself, or the parent of an
    /// affordance row.
    pub fn target_path(&self) -> &str {
        match &self.kind {
            RowKind::Node { view, .. } => &view.path,
            RowKind::Loading { parent }
            | RowKind::Failed { parent, .. }
            | RowKind::Load { parent }
            | RowKind::LoadMore { parent, .. } => parent,
        }
    }

    /// The node shown on this row, if it is a node row.
    pub fn node(&self) -> Option<&ChildView> {
        match &self.kind {
            RowKind::Node { view, .. } => Some(view),
            _ => None,
        }
    }
}

/// Facts about a node for the detail pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDetail {
    /// Full path.
    pub path: String,
    /// Display name.
    pub name: String,
    /// Path segments, root first.
    pub breadcrumbs: Vec<String>,
    /// Number of descendants, when known.
    pub size: Option<u64>,
    /// Path depth.
    pub depth: usize,
    /// Share of the root's size, when both sizes are known.
    pub percent_of_root: Option<f64>,
}

/// The explorer session.
#[derive(Debug)]
pub struct Explorer {
    root: Option<Row>,
    expansion: ExpansionState,
    selection: SelectionState,
    cache: ChildPageCache,
}

impl Explorer {
    /// Create an explorer with an empty tree.
    pub fn new(cache: ChildPageCache) -> Self {
        Self {
            root: None,
            expansion: ExpansionState::new(),
            selection: SelectionState::default(),
            cache,
        }
    }

    /// Install the root row and its immediate children.
    ///
    /// Returns fetches for any nodes expanded before the root arrived.
    pub fn set_root(&mut self, response: RootResponse) -> Vec<FetchRequest> {
        let RootResponse { node, children } = response;
        tracing::debug!(root = %node.path, children = children.len(), "root loaded");
        let total = children.len();
        self.cache.seed(&node.path, ChildPage { children, total });
        self.root = Some(node);
        self.plan_fetches()
    }

    /// The root row, once loaded.
    pub fn root(&self) -> Option<&Row> {
        self.root.as_ref()
    }

    /// Current expansion state.
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    /// Current selection state.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The child page cache.
    pub fn cache(&self) -> &ChildPageCache {
        &self.cache
    }

    /// Apply a transition and return the fetches it makes necessary.
    pub fn dispatch(&mut self, action: &Action) -> Vec<FetchRequest> {
        self.expansion = self.expansion.apply(action);
        self.plan_fetches()
    }

    /// Collect first-page requests for expanded-fetched nodes without data.
    ///
    /// The cache refuses paths with an outstanding request, so calling this
    /// repeatedly never duplicates a fetch.
    pub fn plan_fetches(&mut self) -> Vec<FetchRequest> {
        let candidates: Vec<String> = self
            .expansion
            .fetch_candidates()
            .map(str::to_string)
            .collect();
        let requests: Vec<FetchRequest> = candidates
            .iter()
            .filter_map(|candidate| self.cache.request_first_page(candidate))
            .collect();
        if !requests.is_empty() {
            tracing::debug!(count = requests.len(), "planned fetches");
        }
        requests
    }

    /// Toggle a node.
    pub fn toggle(&mut self, node_path: &str) -> Vec<FetchRequest> {
        self.dispatch(&Action::Toggle(node_path.to_string()))
    }

    /// Select a node and, when it can have children, toggle it.
    pub fn activate(&mut self, view: &ChildView) -> Vec<FetchRequest> {
        self.selection = self.selection.select(&view.path);
        if view.has_children {
            self.toggle(&view.path)
        } else {
            Vec::new()
        }
    }

    /// Select a node without changing expansion.
    pub fn select(&mut self, node_path: &str) {
        self.selection = self.selection.select(node_path);
    }

    /// Reveal `target` in place: expand its ancestors without fetching,
    /// select it and ask the view to scroll to it.
    pub fn navigate_to(&mut self, target: &str) -> Vec<FetchRequest> {
        tracing::debug!(target, "navigating");
        self.selection = self.selection.select_and_scroll(target);
        self.dispatch(&Action::ExpandToNode(target.to_string()))
    }

    /// Let a suppressed node fetch its real children.
    pub fn release(&mut self, node_path: &str) -> Vec<FetchRequest> {
        self.dispatch(&Action::ReleaseSuppression(node_path.to_string()))
    }

    /// Collapse the whole tree.
    pub fn collapse_all(&mut self) -> Vec<FetchRequest> {
        self.dispatch(&Action::CollapseAll)
    }

    /// Request the next page of a node's children.
    pub fn load_more(&mut self, node_path: &str) -> Option<FetchRequest> {
        self.cache.request_next_page(node_path)
    }

    /// Re-issue a failed fetch.
    pub fn retry(&mut self, node_path: &str) -> Option<FetchRequest> {
        self.cache.retry(node_path)
    }

    /// Mark a node's cached children as recently used.
    pub fn touch(&mut self, node_path: &str) {
        self.cache.touch(node_path);
    }

    /// Drop the pending scroll request once the view reached the target.
    pub fn clear_scroll_target(&mut self) {
        self.selection = self.selection.clear_scroll_target();
    }

    /// Fold a finished fetch into the cache.
    ///
    /// Results for nodes that are no longer expanded-fetched are discarded,
    /// and children of expanded-fetched nodes are never evicted.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome) -> Completion {
        let expansion = &self.expansion;
        self.cache.complete(outcome, |node_path| {
            expansion.state_of(node_path) == NodeState::ExpandedFetched
        })
    }

    /// Look up the best known row for a path.
    pub fn lookup(&self, node_path: &str) -> Option<&Row> {
        if let Some(root) = self.root.as_ref().filter(|root| root.path == node_path) {
            return Some(root);
        }
        let parent = path::parent(node_path)?;
        self.cache
            .children(parent)
            .iter()
            .find(|row| row.path == node_path)
    }

    /// Detail-pane facts for a path.
    pub fn detail(&self, node_path: &str) -> NodeDetail {
        let size = self.lookup(node_path).map(|row| row.size);
        let root_size = self.root.as_ref().map(|root| root.size);
        NodeDetail {
            path: node_path.to_string(),
            name: path::name(node_path).to_string(),
            breadcrumbs: path::segments(node_path).into_iter().map(str::to_string).collect(),
            size,
            depth: path::depth(node_path),
            percent_of_root: size
                .zip(root_size)
                .map(|(size, root_size)| util::percent_of_root(size, root_size)),
        }
    }

    /// Children of a node as they should be displayed.
    pub fn children_of(&self, node_path: &str) -> Vec<ChildView> {
        merge::render_with_completeness(
            node_path,
            self.cache.children(node_path),
            &self.expansion,
            self.selection.selected(),
            self.cache.is_complete(node_path),
        )
    }

    /// Flatten the visible tree below the root, depth first.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        if let Some(root) = &self.root {
            self.push_children(&root.path, &mut rows);
        }
        rows
    }

    fn push_children(&self, node_path: &str, rows: &mut Vec<VisibleRow>) {
        let depth = path::depth(node_path) + 1;
        let state = self.expansion.state_of(node_path);
        let status = self.cache.status(node_path);

        let awaiting_first_page = state == NodeState::ExpandedFetched
            && self.cache.children(node_path).is_empty()
            && matches!(status, PageStatus::Idle | PageStatus::Loading);
        if awaiting_first_page {
            rows.push(VisibleRow {
                depth,
                kind: RowKind::Loading {
                    parent: node_path.to_string(),
                },
            });
        }

        for view in self.children_of(node_path) {
            let child_state = self.expansion.state_of(&view.path);
            let child_path = view.path.clone();
            rows.push(VisibleRow {
                depth,
                kind: RowKind::Node {
                    view,
                    state: child_state,
                },
            });
            if child_state.is_expanded() {
                self.push_children(&child_path, rows);
            }
        }

        if state == NodeState::ExpandedSuppressed {
            rows.push(VisibleRow {
                depth,
                kind: RowKind::Load {
                    parent: node_path.to_string(),
                },
            });
            return;
        }

        match status {
            PageStatus::Failed(message) => rows.push(VisibleRow {
                depth,
                kind: RowKind::Failed {
                    parent: node_path.to_string(),
                    message,
                },
            }),
            PageStatus::Loaded { has_more: true } => rows.push(VisibleRow {
                depth,
                kind: RowKind::LoadMore {
                    parent: node_path.to_string(),
                    loading: false,
                },
            }),
            PageStatus::Loading if !awaiting_first_page => rows.push(VisibleRow {
                depth,
                kind: RowKind::LoadMore {
                    parent: node_path.to_string(),
                    loading: true,
                },
            }),
            _ => {}
        }
    }

    /// Index of the row showing `node_path`, if visible.
    pub fn row_index_of(rows: &[VisibleRow], node_path: &str) -> Option<usize> {
        rows.iter()
            .position(|row| row.node().is_some_and(|view| view.path == node_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_response() -> RootResponse {
        RootResponse {
            node: Row::new("r", 100),
            children: vec![
                Row::new("r > a", 40).with_children(true),
                Row::new("r > m", 60).with_children(true),
            ],
        }
    }

    fn explorer() -> Explorer {
        let mut explorer = Explorer::new(ChildPageCache::new(2, 64));
        assert!(explorer.set_root(root_response()).is_empty());
        explorer
    }

    fn page(request: FetchRequest, names: &[&str], total: usize) -> FetchOutcome {
        let children = names
            .iter()
            .map(|name| Row::new(path::join(&request.path, name), 1).with_children(true))
            .collect();
        FetchOutcome {
            request,
            result: Ok(ChildPage { children, total }),
        }
    }

    fn labels(rows: &[VisibleRow]) -> Vec<String> {
        rows.iter()
            .map(|row| {
                let indent = "  ".repeat(row.depth - 1);
                match &row.kind {
                    RowKind::Node { view, .. } if view.is_placeholder() => {
                        format!("{indent}{}*", view.name)
                    }
                    RowKind::Node { view, .. } => format!("{indent}{}", view.name),
                    RowKind::Loading { .. } => format!("{indent}<loading>"),
                    RowKind::Failed { .. } => format!("{indent}<failed>"),
                    RowKind::Load { .. } => format!("{indent}<load>"),
                    RowKind::LoadMore { loading, .. } => format!("{indent}<more {loading}>"),
                }
            })
            .collect()
    }

    #[test]
    fn test_root_children_visible_without_fetch() {
        let explorer = explorer();
        assert_eq!(labels(&explorer.visible_rows()), vec!["a", "m"]);
    }

    #[test]
    fn test_expand_fetch_and_load_more() {
        let mut explorer = explorer();
        let view = explorer.children_of("r")[0].clone();
        let requests = explorer.activate(&view);
        assert_eq!(requests.len(), 1);
        assert_eq!(explorer.selection().selected(), Some("r > a"));
        assert_eq!(labels(&explorer.visible_rows()), vec!["a", "  <loading>", "m"]);

        let request = requests.into_iter().next().unwrap();
        assert_eq!(explorer.apply_fetch(page(request, &["x", "y"], 3)), Completion::Applied);
        assert_eq!(
            labels(&explorer.visible_rows()),
            vec!["a", "  x", "  y", "  <more false>", "m"]
        );

        let next = explorer.load_more("r > a").unwrap();
        assert_eq!(next.offset, 2);
        assert_eq!(
            labels(&explorer.visible_rows()),
            vec!["a", "  x", "  y", "  <more true>", "m"]
        );
        explorer.apply_fetch(page(next, &["z"], 3));
        assert_eq!(labels(&explorer.visible_rows()), vec!["a", "  x", "  y", "  z", "m"]);
    }

    #[test]
    fn test_navigate_reveals_placeholder_chain() {
        let mut explorer = explorer();
        let requests = explorer.navigate_to("r > a > q > target");
        assert!(requests.is_empty());
        assert_eq!(explorer.selection().scroll_target.as_deref(), Some("r > a > q > target"));
        assert_eq!(
            labels(&explorer.visible_rows()),
            vec!["a", "  q*", "    target*", "      <load>", "    <load>", "  <load>", "m"]
        );

        let target = explorer
            .visible_rows()
            .into_iter()
            .find_map(|row| row.node().filter(|v| v.name == "target").cloned())
            .unwrap();
        assert!(!target.has_children);
    }

    #[test]
    fn test_release_fetches_and_supersedes_placeholder() {
        let mut explorer = explorer();
        explorer.navigate_to("r > a > q");
        let requests = explorer.release("r > a");
        assert_eq!(requests.len(), 1);

        let request = requests.into_iter().next().unwrap();
        explorer.apply_fetch(page(request, &["b", "q"], 2));
        let rows = explorer.visible_rows();
        assert_eq!(labels(&rows), vec!["a", "  b", "  q", "    <load>", "m"]);
    }

    #[test]
    fn test_fetch_after_collapse_is_discarded() {
        let mut explorer = explorer();
        let request = explorer.toggle("r > a").into_iter().next().unwrap();
        explorer.toggle("r > a");
        assert_eq!(
            explorer.apply_fetch(page(request, &["x"], 1)),
            Completion::DiscardedStale
        );
        assert!(explorer.cache().children("r > a").is_empty());

        // Re-expanding issues a fresh request.
        assert_eq!(explorer.toggle("r > a").len(), 1);
    }

    #[test]
    fn test_no_duplicate_fetch_while_outstanding() {
        let mut explorer = explorer();
        assert_eq!(explorer.toggle("r > a").len(), 1);
        assert!(explorer.plan_fetches().is_empty());
        explorer.toggle("r > a");
        assert!(explorer.toggle("r > a").is_empty());
    }

    #[test]
    fn test_failed_fetch_then_retry() {
        let mut explorer = explorer();
        let request = explorer.toggle("r > m").into_iter().next().unwrap();
        explorer.apply_fetch(FetchOutcome {
            request,
            result: Err("503".to_string()),
        });
        assert_eq!(labels(&explorer.visible_rows()), vec!["a", "m", "  <failed>"]);

        let retry = explorer.retry("r > m").unwrap();
        assert_eq!(retry.offset, 0);
        assert_eq!(labels(&explorer.visible_rows()), vec!["a", "m", "  <loading>"]);
    }

    #[test]
    fn test_unresolved_target_after_pages_exhausted() {
        let mut explorer = explorer();
        explorer.navigate_to("r > a > ghost");
        let request = explorer.release("r > a").into_iter().next().unwrap();
        explorer.apply_fetch(page(request, &["real"], 1));

        let ghost = explorer
            .children_of("r > a")
            .into_iter()
            .find(|view| view.name == "ghost")
            .unwrap();
        assert!(ghost.is_unresolved());
    }

    #[test]
    fn test_detail() {
        let mut explorer = explorer();
        explorer.select("r > m");
        let detail = explorer.detail("r > m");
        assert_eq!(detail.breadcrumbs, vec!["r", "m"]);
        assert_eq!(detail.size, Some(60));
        assert_eq!(detail.depth, 1);
        assert_eq!(detail.percent_of_root, Some(60.0));

        let unknown = explorer.detail("r > zzz");
        assert_eq!(unknown.size, None);
        assert_eq!(unknown.percent_of_root, None);
    }

    #[test]
    fn test_collapse_all() {
        let mut explorer = explorer();
        explorer.navigate_to("r > a > b");
        explorer.collapse_all();
        assert!(explorer.expansion().is_empty());
        assert_eq!(labels(&explorer.visible_rows()), vec!["a", "m"]);
    }

    #[test]
    fn test_expanded_children_survive_a_small_cache() {
        let mut explorer = Explorer::new(ChildPageCache::new(10, 1));
        explorer.set_root(root_response());

        let mut pending = explorer.toggle("r > a");
        pending.extend(explorer.toggle("r > m"));
        let mut issued = 0;
        while let Some(request) = pending.pop() {
            issued += 1;
            assert!(issued <= 2, "refetching {}", request.path);
            explorer.apply_fetch(page(request, &["x"], 1));
            pending.extend(explorer.plan_fetches());
        }

        assert_eq!(issued, 2);
        assert_eq!(labels(&explorer.visible_rows()), vec!["a", "  x", "m", "  x"]);
        assert_eq!(explorer.cache().stats().entry_count, 2);

        // Once collapsed, "r > a" is the entry that makes room.
        explorer.toggle("r > a");
        let request = explorer.toggle("r > m > x").into_iter().next().unwrap();
        explorer.apply_fetch(page(request, &["y"], 1));
        assert!(explorer.cache().children("r > a").is_empty());
        assert_eq!(explorer.cache().children("r > m").len(), 1);
        assert_eq!(explorer.cache().stats().entry_count, 2);
    }
}
