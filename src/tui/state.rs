//! TUI application state.
//!
//! Everything the loop mutates lives in [`AppState`]. Handlers return the
//! [`Effect`]s the loop must start (requests to the API); results come back
//! through the `on_*` methods. Nothing here touches the terminal, so the key
//! handling is tested directly.

use crate::cache::{Completion, FetchOutcome, FetchRequest};
use crate::client::MIN_QUERY_LEN;
use crate::explorer::{Explorer, RowKind, VisibleRow};
use crate::model::{RootResponse, Row, SearchResponse};
use crate::path;

use super::theme::{Glyphs, Theme};

/// Work the loop must start on behalf of the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the root and its children.
    LoadRoot,
    /// Fetch a page of children.
    Fetch(FetchRequest),
    /// Fetch a page of search results.
    Search {
        /// Trimmed query.
        query: String,
        /// Offset of the page.
        offset: usize,
        /// Page size.
        limit: usize,
        /// Generation the response must match to be shown.
        generation: u64,
    },
}

/// Which part of the UI receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// The tree pane.
    #[default]
    Tree,
    /// The search pane.
    Search,
    /// The help overlay.
    Help,
}

/// Search pane state.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Query being typed.
    pub query: String,
    /// Whether keys go to the query input.
    pub editing: bool,
    /// Last page received for the current generation.
    pub response: Option<SearchResponse>,
    /// Highlighted result index.
    pub selected: usize,
    /// A request for the current generation is in flight.
    pub loading: bool,
    /// Failure message of the last request.
    pub error: Option<String>,
    /// Bumped for every submitted query; older responses are dropped.
    generation: u64,
    page_size: usize,
}

impl SearchState {
    /// The highlighted result.
    pub fn selected_result(&self) -> Option<&Row> {
        self.response
            .as_ref()
            .and_then(|response| response.results.get(self.selected))
    }

    /// Human-readable page position, e.g. `21-40 of 95`.
    pub fn page_label(&self) -> Option<String> {
        let response = self.response.as_ref()?;
        if response.results.is_empty() {
            return Some("no matches".to_string());
        }
        Some(format!(
            "{}-{} of {}",
            response.offset + 1,
            response.offset + response.results.len(),
            response.total
        ))
    }
}

/// Application state.
pub struct AppState {
    /// The engine.
    pub explorer: Explorer,
    /// Flattened tree as last computed.
    pub rows: Vec<VisibleRow>,
    /// Cursor index into `rows`.
    pub cursor: usize,
    /// First row shown in the tree pane.
    pub tree_scroll: usize,
    /// Rows that fit in the tree pane.
    pub viewport_height: usize,
    /// Current input mode.
    pub mode: Mode,
    /// Search pane.
    pub search: SearchState,
    /// Current theme.
    pub theme: Theme,
    /// Tree glyphs.
    pub glyphs: Glyphs,
    /// Show sizes next to names.
    pub show_sizes: bool,
    /// Transient message shown in the status bar.
    pub status_message: Option<String>,
    /// Why the root could not be loaded.
    pub root_error: Option<String>,
    /// Set when the user asked to quit.
    pub should_quit: bool,
    /// Path to reveal once the root arrives.
    pending_reveal: Option<String>,
}

impl AppState {
    /// Create the state around an explorer.
    pub fn new(
        explorer: Explorer,
        theme: Theme,
        ascii: bool,
        show_sizes: bool,
        search_page_size: usize,
    ) -> Self {
        Self {
            explorer,
            rows: Vec::new(),
            cursor: 0,
            tree_scroll: 0,
            viewport_height: 20,
            mode: Mode::Tree,
            search: SearchState {
                page_size: search_page_size.max(1),
                ..SearchState::default()
            },
            theme,
            glyphs: Glyphs::for_mode(ascii),
            show_sizes,
            status_message: None,
            root_error: None,
            should_quit: false,
            pending_reveal: None,
        }
    }

    /// Reveal `path` as soon as the root is loaded.
    #[must_use]
    pub fn with_reveal(mut self, reveal: Option<String>) -> Self {
        self.pending_reveal = reveal.filter(|path| !path.trim().is_empty());
        self
    }

    /// Effects to run at startup.
    pub fn start(&self) -> Vec<Effect> {
        vec![Effect::LoadRoot]
    }

    /// The row under the cursor.
    pub fn current_row(&self) -> Option<&VisibleRow> {
        self.rows.get(self.cursor)
    }

    /// Whether the root is still loading.
    pub fn is_loading_root(&self) -> bool {
        self.explorer.root().is_none() && self.root_error.is_none()
    }

    /// Install the root, or record why it failed.
    pub fn on_root_loaded(&mut self, result: Result<RootResponse, String>) -> Vec<Effect> {
        match result {
            Ok(response) => {
                self.root_error = None;
                let mut requests = self.explorer.set_root(response);
                if let Some(target) = self.pending_reveal.take() {
                    requests.extend(self.explorer.navigate_to(&target));
                }
                self.refresh();
                fetches(requests)
            }
            Err(message) => {
                tracing::warn!(error = %message, "failed to load root");
                self.root_error = Some(message);
                Vec::new()
            }
        }
    }

    /// Fold a finished page into the tree.
    pub fn on_fetched(&mut self, outcome: FetchOutcome) -> Vec<Effect> {
        let failure = outcome.result.as_ref().err().cloned();
        let path = outcome.request.path.clone();
        let completion = self.explorer.apply_fetch(outcome);
        if let (Completion::Applied, Some(message)) = (completion, failure) {
            self.status_message = Some(format!("Failed to load {}: {message}", path::name(&path)));
        }
        let requests = self.explorer.plan_fetches();
        self.refresh();
        fetches(requests)
    }

    /// Show a search page if it belongs to the current query.
    pub fn on_search_loaded(&mut self, generation: u64, result: Result<SearchResponse, String>) {
        if generation != self.search.generation {
            tracing::debug!(
                generation,
                current = self.search.generation,
                "dropping stale search page"
            );
            return;
        }
        self.search.loading = false;
        match result {
            Ok(response) => {
                self.search.error = None;
                self.search.selected = 0;
                self.search.response = Some(response);
            }
            Err(message) => self.search.error = Some(message),
        }
    }

    /// Recompute the visible rows, keeping the cursor on the same line and
    /// honouring a pending scroll target.
    pub fn refresh(&mut self) {
        let previous = self.current_row().map(row_key);
        self.rows = self.explorer.visible_rows();

        let target = self.explorer.selection().scroll_target.clone();
        if let Some(index) = target
            .as_deref()
            .and_then(|target| Explorer::row_index_of(&self.rows, target))
        {
            self.cursor = index;
            self.explorer.clear_scroll_target();
        } else if let Some(index) = previous.and_then(|(is_node, key)| {
            self.rows
                .iter()
                .position(|row| row_key(row) == (is_node, key.clone()))
        }) {
            self.cursor = index;
        } else {
            self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
        }
        self.ensure_cursor_visible();
    }

    /// Set the tree pane height.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        if self.cursor < self.tree_scroll {
            self.tree_scroll = self.cursor;
        } else if self.cursor >= self.tree_scroll + self.viewport_height {
            self.tree_scroll = self.cursor + 1 - self.viewport_height;
        }
    }

    fn move_cursor_to(&mut self, index: usize) {
        if self.rows.is_empty() {
            return;
        }
        self.cursor = index.min(self.rows.len() - 1);
        if let Some(view) = self.rows[self.cursor].node() {
            let selected = view.path.clone();
            self.explorer.select(&selected);
            if let Some(parent) = path::parent(&selected) {
                self.explorer.touch(parent);
            }
        }
        self.ensure_cursor_visible();
    }

    /// Move the cursor up one row.
    pub fn previous(&mut self) {
        self.move_cursor_to(self.cursor.saturating_sub(1));
    }

    /// Move the cursor down one row.
    pub fn next(&mut self) {
        self.move_cursor_to(self.cursor + 1);
    }

    /// Move the cursor a page up.
    pub fn page_up(&mut self) {
        self.move_cursor_to(self.cursor.saturating_sub(self.viewport_height));
    }

    /// Move the cursor a page down.
    pub fn page_down(&mut self) {
        self.move_cursor_to(self.cursor + self.viewport_height);
    }

    /// Activate the row under the cursor.
    pub fn activate(&mut self) -> Vec<Effect> {
        let Some(row) = self.current_row().cloned() else {
            return Vec::new();
        };
        let requests = match &row.kind {
            RowKind::Node { view, .. } => self.explorer.activate(view),
            RowKind::Load { parent } => self.explorer.release(parent),
            RowKind::LoadMore { parent, loading: false } => {
                self.explorer.load_more(parent).into_iter().collect()
            }
            RowKind::Failed { parent, .. } => self.explorer.retry(parent).into_iter().collect(),
            RowKind::Loading { .. } | RowKind::LoadMore { loading: true, .. } => Vec::new(),
        };
        self.refresh();
        fetches(requests)
    }

    /// Collapse the node under the cursor, or move to its parent.
    pub fn left(&mut self) -> Vec<Effect> {
        let Some(row) = self.current_row().cloned() else {
            return Vec::new();
        };
        if let RowKind::Node { view, state } = &row.kind {
            if state.is_expanded() {
                let requests = self.explorer.toggle(&view.path);
                self.refresh();
                return fetches(requests);
            }
        }

        let parent = match &row.kind {
            RowKind::Node { view, .. } => path::parent(&view.path).map(str::to_string),
            _ => Some(row.target_path().to_string()),
        };
        if let Some(index) = parent
            .as_deref()
            .and_then(|parent| Explorer::row_index_of(&self.rows, parent))
        {
            self.move_cursor_to(index);
        }
        Vec::new()
    }

    /// Retry the root, or the failed fetch under the cursor.
    pub fn retry(&mut self) -> Vec<Effect> {
        if self.root_error.take().is_some() {
            return vec![Effect::LoadRoot];
        }
        let target = self.current_row().map(|row| row.target_path().to_string());
        let request = target.as_deref().and_then(|path| self.explorer.retry(path));
        if request.is_none() {
            self.status_message = Some("Nothing to retry".to_string());
        }
        self.refresh();
        fetches(request.into_iter().collect())
    }

    /// Collapse every node and return to the top.
    pub fn collapse_all(&mut self) -> Vec<Effect> {
        let requests = self.explorer.collapse_all();
        self.cursor = 0;
        self.tree_scroll = 0;
        self.refresh();
        fetches(requests)
    }

    /// Switch to the next theme.
    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.status_message = Some(format!("Theme: {}", self.theme.name));
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.mode = if self.mode == Mode::Help {
            Mode::Tree
        } else {
            Mode::Help
        };
    }

    /// Open the search pane with the query input focused.
    pub fn enter_search(&mut self) {
        self.mode = Mode::Search;
        self.search.editing = true;
    }

    /// Close the search pane, keeping the last results.
    pub fn exit_search(&mut self) {
        self.mode = Mode::Tree;
        self.search.editing = false;
    }

    /// Append a character to the query.
    pub fn search_input(&mut self, c: char) {
        self.search.editing = true;
        self.search.query.push(c);
    }

    /// Delete the last query character.
    pub fn search_backspace(&mut self) {
        self.search.editing = true;
        self.search.query.pop();
    }

    /// Submit the query, or open the highlighted result when not editing.
    pub fn search_enter(&mut self) -> Vec<Effect> {
        if self.search.editing {
            self.submit_search()
        } else {
            self.open_search_result()
        }
    }

    fn submit_search(&mut self) -> Vec<Effect> {
        let query = self.search.query.trim().to_string();
        if query.chars().count() < MIN_QUERY_LEN {
            self.status_message =
                Some(format!("Type at least {MIN_QUERY_LEN} characters to search"));
            return Vec::new();
        }
        self.search.editing = false;
        self.search.response = None;
        self.search.selected = 0;
        self.request_search_page(query, 0)
    }

    fn request_search_page(&mut self, query: String, offset: usize) -> Vec<Effect> {
        self.search.generation += 1;
        self.search.loading = true;
        self.search.error = None;
        vec![Effect::Search {
            query,
            offset,
            limit: self.search.page_size,
            generation: self.search.generation,
        }]
    }

    /// Request the next page of results.
    pub fn search_next_page(&mut self) -> Vec<Effect> {
        match &self.search.response {
            Some(response) if response.has_next_page() => {
                let offset = response.offset + response.results.len();
                self.request_search_page(response.query.clone(), offset)
            }
            _ => Vec::new(),
        }
    }

    /// Request the previous page of results.
    pub fn search_prev_page(&mut self) -> Vec<Effect> {
        match &self.search.response {
            Some(response) if response.has_previous_page() => {
                let (query, offset) = (
                    response.query.clone(),
                    response.offset.saturating_sub(self.search.page_size),
                );
                self.request_search_page(query, offset)
            }
            _ => Vec::new(),
        }
    }

    /// Highlight the next result.
    pub fn search_down(&mut self) {
        self.search.editing = false;
        let count = self.search.response.as_ref().map_or(0, |r| r.results.len());
        if self.search.selected + 1 < count {
            self.search.selected += 1;
        }
    }

    /// Highlight the previous result.
    pub fn search_up(&mut self) {
        self.search.editing = false;
        self.search.selected = self.search.selected.saturating_sub(1);
    }

    fn open_search_result(&mut self) -> Vec<Effect> {
        let Some(target) = self.search.selected_result().map(|row| row.path.clone()) else {
            return Vec::new();
        };
        let requests = self.explorer.navigate_to(&target);
        self.mode = Mode::Tree;
        self.refresh();
        fetches(requests)
    }
}

fn fetches(requests: Vec<FetchRequest>) -> Vec<Effect> {
    requests.into_iter().map(Effect::Fetch).collect()
}

/// Identity of a row across refreshes: node rows by path, affordance rows
/// by their parent.
fn row_key(row: &VisibleRow) -> (bool, String) {
    (row.node().is_some(), row.target_path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ChildPage, ChildPageCache};

    fn app() -> AppState {
        let explorer = Explorer::new(ChildPageCache::new(2, 64));
        AppState::new(explorer, Theme::dark(), true, true, 20)
    }

    fn root() -> RootResponse {
        RootResponse {
            node: Row::new("r", 100),
            children: vec![
                Row::new("r > a", 40).with_children(true),
                Row::new("r > m", 60).with_children(true),
            ],
        }
    }

    fn page(path: &str, names: &[&str], total: usize) -> Result<ChildPage, String> {
        Ok(ChildPage {
            children: names
                .iter()
                .map(|name| Row::new(path::join(path, name), 1).with_children(true))
                .collect(),
            total,
        })
    }

    fn fetch_requests(effects: &[Effect]) -> Vec<&FetchRequest> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Fetch(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn row_texts(app: &AppState) -> Vec<String> {
        app.rows
            .iter()
            .map(|row| match &row.kind {
                RowKind::Node { view, .. } => view.path.clone(),
                RowKind::Loading { .. } => "<loading>".to_string(),
                RowKind::Failed { .. } => "<failed>".to_string(),
                RowKind::Load { .. } => "<load>".to_string(),
                RowKind::LoadMore { .. } => "<more>".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_start_loads_root() {
        let mut app = app();
        assert_eq!(app.start(), vec![Effect::LoadRoot]);
        assert!(app.is_loading_root());

        let effects = app.on_root_loaded(Ok(root()));
        assert!(effects.is_empty());
        assert_eq!(row_texts(&app), ["r > a", "r > m"]);
    }

    #[test]
    fn test_root_failure_is_recorded() {
        let mut app = app();
        app.on_root_loaded(Err("connection refused".to_string()));
        assert_eq!(app.root_error.as_deref(), Some("connection refused"));
        assert!(!app.is_loading_root());

        assert_eq!(app.retry(), vec![Effect::LoadRoot]);
        assert!(app.is_loading_root());
    }

    #[test]
    fn test_activate_expands_and_load_more_pages() {
        let mut app = app();
        app.on_root_loaded(Ok(root()));

        let effects = app.activate();
        let requests = fetch_requests(&effects);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "r > a");
        assert_eq!(row_texts(&app), ["r > a", "<loading>", "r > m"]);

        let request = requests[0].clone();
        app.on_fetched(FetchOutcome {
            request,
            result: page("r > a", &["x", "y"], 3),
        });
        assert_eq!(row_texts(&app), ["r > a", "r > a > x", "r > a > y", "<more>", "r > m"]);
        assert_eq!(app.cursor, 0, "cursor stays on the activated node");

        app.next();
        app.next();
        app.next();
        let effects = app.activate();
        let requests = fetch_requests(&effects);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].offset, 2);
    }

    #[test]
    fn test_left_collapses_then_moves_to_parent() {
        let mut app = app();
        app.on_root_loaded(Ok(root()));
        let effects = app.activate();
        let request = fetch_requests(&effects)[0].clone();
        app.on_fetched(FetchOutcome {
            request,
            result: page("r > a", &["x"], 1),
        });

        app.next();
        assert_eq!(app.explorer.selection().selected(), Some("r > a > x"));
        app.left();
        assert_eq!(app.cursor, 0, "leaf moves to its parent");

        app.left();
        assert_eq!(row_texts(&app), ["r > a", "r > m"]);
    }

    #[test]
    fn test_fetch_failure_then_retry() {
        let mut app = app();
        app.on_root_loaded(Ok(root()));
        let effects = app.activate();
        let request = fetch_requests(&effects)[0].clone();

        app.on_fetched(FetchOutcome {
            request,
            result: Err("timeout".to_string()),
        });
        assert!(app.status_message.as_deref().is_some_and(|m| m.contains("timeout")));
        assert_eq!(row_texts(&app), ["r > a", "<failed>", "r > m"]);

        let effects = app.retry();
        assert_eq!(fetch_requests(&effects).len(), 1);
        assert_eq!(row_texts(&app), ["r > a", "<loading>", "r > m"]);
    }

    #[test]
    fn test_reveal_on_start_selects_placeholder_chain() {
        let mut app = app().with_reveal(Some("r > m > deep > leaf".to_string()));
        let effects = app.on_root_loaded(Ok(root()));
        assert!(fetch_requests(&effects).is_empty(), "reveal must not fetch");

        assert_eq!(
            row_texts(&app),
            [
                "r > a",
                "r > m",
                "r > m > deep",
                "r > m > deep > leaf",
                "<load>",
                "<load>",
                "<load>"
            ]
        );
        assert_eq!(app.cursor, 3);
        assert_eq!(app.explorer.selection().scroll_target, None);
    }

    #[test]
    fn test_load_row_releases_suppression() {
        let mut app = app().with_reveal(Some("r > m > deep".to_string()));
        app.on_root_loaded(Ok(root()));
        // rows: r > a, r > m, r > m > deep, <load deep>, <load m>
        let load_m = app
            .rows
            .iter()
            .rposition(|row| matches!(row.kind, RowKind::Load { .. }))
            .unwrap();
        app.move_cursor_to(load_m);
        let effects = app.activate();
        let requests = fetch_requests(&effects);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "r > m");
    }

    #[test]
    fn test_search_requires_two_characters() {
        let mut app = app();
        app.enter_search();
        app.search_input('b');
        assert!(app.search_enter().is_empty());
        assert!(app.status_message.is_some());

        app.search_input('i');
        let effects = app.search_enter();
        assert!(matches!(
            effects.as_slice(),
            [Effect::Search { query, offset: 0, limit: 20, .. }] if query == "bi"
        ));
        assert!(app.search.loading);
    }

    #[test]
    fn test_stale_search_pages_are_dropped() {
        let mut app = app();
        app.enter_search();
        app.search.query = "bird".to_string();
        let first = app.search_enter();
        app.search.editing = true;
        let second = app.search_enter();
        let generation_of = |effects: &[Effect]| match effects {
            [Effect::Search { generation, .. }] => *generation,
            _ => panic!("expected one search effect"),
        };

        let response = SearchResponse {
            results: vec![Row::new("r > a > bird", 3)],
            total: 1,
            query: "bird".to_string(),
            limit: 20,
            offset: 0,
        };
        app.on_search_loaded(generation_of(first.as_slice()), Ok(response.clone()));
        assert!(app.search.response.is_none());

        app.on_search_loaded(generation_of(second.as_slice()), Ok(response));
        assert_eq!(app.search.page_label().as_deref(), Some("1-1 of 1"));
    }

    #[test]
    fn test_search_paging_and_navigation() {
        let mut app = app();
        app.on_root_loaded(Ok(root()));
        app.enter_search();
        app.search.query = "bird".to_string();
        let effects = app.search_enter();
        let Effect::Search { generation, .. } = effects[0].clone() else {
            panic!("expected a search effect");
        };
        app.on_search_loaded(
            generation,
            Ok(SearchResponse {
                results: vec![Row::new("r > a > bird", 3), Row::new("r > m > bird", 2)],
                total: 45,
                query: "bird".to_string(),
                limit: 20,
                offset: 0,
            }),
        );

        assert!(app.search_prev_page().is_empty());
        let next = app.search_next_page();
        assert!(matches!(next.as_slice(), [Effect::Search { offset: 2, .. }]));

        app.search_down();
        let effects = app.search_enter();
        assert!(fetch_requests(&effects).is_empty());
        assert_eq!(app.mode, Mode::Tree);
        assert_eq!(app.explorer.selection().selected(), Some("r > m > bird"));
        assert_eq!(
            app.current_row()
                .and_then(|row| row.node())
                .map(|v| v.path.as_str()),
            Some("r > m > bird")
        );
    }

    #[test]
    fn test_collapse_all_resets_cursor() {
        let mut app = app();
        app.on_root_loaded(Ok(root()));
        app.next();
        app.activate();
        app.collapse_all();
        assert_eq!(app.cursor, 0);
        assert!(app.explorer.expansion().is_empty());
    }

    #[test]
    fn test_viewport_follows_cursor() {
        let mut app = app();
        app.on_root_loaded(Ok(root()));
        app.set_viewport_height(1);
        app.next();
        assert_eq!(app.tree_scroll, 1);
        app.previous();
        assert_eq!(app.tree_scroll, 0);
    }
}
