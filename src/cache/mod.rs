//! Paginated child storage for lazily loaded nodes.
//!
//! This module provides:
//! - The [`ChildSource`] seam through which pages of children are fetched
//! - [`ChildPageCache`], which holds loaded pages per node, de-duplicates
//!   in-flight requests and discards stale or out-of-order results
//! - LRU eviction of idle, unpinned entries for nodes no longer on screen
//!   once more than `max_nodes` of them are held
//!
//! The cache performs no I/O itself. It hands out [`FetchRequest`]s, the
//! caller runs them (see [`run_fetch`]) and feeds the resulting
//! [`FetchOutcome`]s back through [`ChildPageCache::complete`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::model::{ChildrenResponse, Row};

/// One page of children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildPage {
    /// Rows in this page, sorted by name.
    pub children: Vec<Row>,
    /// Total number of children of the node.
    pub total: usize,
}

impl From<ChildrenResponse> for ChildPage {
    fn from(response: ChildrenResponse) -> Self {
        Self {
            children: response.children,
            total: response.total,
        }
    }
}

/// Anything that can serve pages of a node's children.
///
/// Implementations must be deterministic per offset, return at most `limit`
/// rows, and produce pages that concatenate in offset order.
pub trait ChildSource: Send + Sync {
    /// Fetch `limit` children of `path` starting at `offset`.
    fn fetch_page<'a>(
        &'a self,
        path: &'a str,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<ChildPage>>;
}

/// A page fetch the caller should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Node whose children are requested.
    pub path: String,
    /// Offset of the first requested row.
    pub offset: usize,
    /// Page size.
    pub limit: usize,
}

/// A finished page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The request that produced this outcome.
    pub request: FetchRequest,
    /// The page, or the failure message.
    pub result: std::result::Result<ChildPage, String>,
}

/// Run a request against a source, capturing failures as messages.
pub async fn run_fetch(source: Arc<dyn ChildSource>, request: FetchRequest) -> FetchOutcome {
    tracing::debug!(path = %request.path, offset = request.offset, "fetching children");
    let result = source
        .fetch_page(&request.path, request.offset, request.limit)
        .await
        .map_err(|e| e.to_string());
    FetchOutcome { request, result }
}

/// Load status of a node's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// Nothing requested yet.
    Idle,
    /// A page is in flight.
    Loading,
    /// At least one page is held.
    Loaded {
        /// More pages remain on the server.
        has_more: bool,
    },
    /// The last fetch failed.
    Failed(String),
}

/// What [`ChildPageCache::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Rows were appended or the failure recorded.
    Applied,
    /// The node is no longer expanded-fetched.
    DiscardedStale,
    /// The page offset does not continue the rows already held.
    DiscardedOutOfOrder,
}

/// Per-node cache entry with access tracking.
#[derive(Debug, Default)]
struct Entry {
    rows: Vec<Row>,
    total: Option<usize>,
    /// Offset of the outstanding request, if any.
    in_flight: Option<usize>,
    error: Option<String>,
    /// Seeded entries cannot be re-fetched and are never evicted.
    pinned: bool,
    /// Access order (higher = more recent).
    access_order: u64,
}

impl Entry {
    fn has_more(&self) -> bool {
        self.total.is_some_and(|total| self.rows.len() < total)
    }

    fn is_complete(&self) -> bool {
        self.total.is_some_and(|total| self.rows.len() >= total)
    }
}

/// Per-node paginated children with LRU bound.
#[derive(Debug)]
pub struct ChildPageCache {
    entries: HashMap<String, Entry>,
    /// Global access counter for LRU tracking.
    access_counter: u64,
    page_size: usize,
    max_nodes: usize,
}

impl ChildPageCache {
    /// Create a cache with the given page size and node bound.
    pub fn new(page_size: usize, max_nodes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            access_counter: 0,
            page_size: page_size.max(1),
            max_nodes: max_nodes.max(1),
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &CacheConfig, page_size: usize) -> Self {
        Self::new(page_size, config.max_nodes)
    }

    /// Page size used for requests.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn entry_mut(&mut self, path: &str) -> &mut Entry {
        self.access_counter += 1;
        let order = self.access_counter;
        let entry = self.entries.entry(path.to_string()).or_default();
        entry.access_order = order;
        entry
    }

    fn issue(&mut self, path: &str, offset: usize) -> FetchRequest {
        let limit = self.page_size;
        let entry = self.entry_mut(path);
        entry.in_flight = Some(offset);
        entry.error = None;
        FetchRequest {
            path: path.to_string(),
            offset,
            limit,
        }
    }

    /// Request the first page of `path` unless something is held, in flight
    /// or failed.
    pub fn request_first_page(&mut self, path: &str) -> Option<FetchRequest> {
        let entry = self.entry_mut(path);
        if entry.in_flight.is_some()
            || entry.error.is_some()
            || entry.total.is_some()
            || !entry.rows.is_empty()
        {
            return None;
        }
        Some(self.issue(path, 0))
    }

    /// Request the page after the rows already held, if any remain.
    pub fn request_next_page(&mut self, path: &str) -> Option<FetchRequest> {
        let entry = self.entries.get(path)?;
        if entry.in_flight.is_some() || entry.error.is_some() || !entry.has_more() {
            return None;
        }
        let offset = entry.rows.len();
        Some(self.issue(path, offset))
    }

    /// Re-issue the request that failed for `path`.
    pub fn retry(&mut self, path: &str) -> Option<FetchRequest> {
        let entry = self.entries.get(path)?;
        if entry.in_flight.is_some() || entry.error.is_none() {
            return None;
        }
        let offset = entry.rows.len();
        tracing::debug!(path, offset, "retrying fetch");
        Some(self.issue(path, offset))
    }

    /// Fold a finished fetch into the cache.
    ///
    /// `is_live` tells whether a node is still expanded-fetched. A result for
    /// a node that is not live is discarded, and live entries are never
    /// evicted.
    pub fn complete(
        &mut self,
        outcome: FetchOutcome,
        is_live: impl Fn(&str) -> bool,
    ) -> Completion {
        let FetchOutcome { request, result } = outcome;
        let applicable = is_live(&request.path);
        let Some(entry) = self.entries.get_mut(&request.path) else {
            tracing::debug!(path = %request.path, "discarding result for evicted node");
            return Completion::DiscardedStale;
        };
        if entry.in_flight == Some(request.offset) {
            entry.in_flight = None;
        }

        if !applicable {
            tracing::debug!(path = %request.path, "discarding result for collapsed node");
            return Completion::DiscardedStale;
        }
        if request.offset != entry.rows.len() {
            tracing::debug!(
                path = %request.path,
                offset = request.offset,
                held = entry.rows.len(),
                "discarding out-of-order page"
            );
            return Completion::DiscardedOutOfOrder;
        }

        match result {
            Ok(page) => {
                entry.rows.extend(page.children);
                entry.total = Some(page.total);
                entry.error = None;
            }
            Err(message) => {
                tracing::warn!(path = %request.path, error = %message, "fetch failed");
                entry.error = Some(message);
            }
        }

        self.access_counter += 1;
        entry.access_order = self.access_counter;
        self.evict_if_needed(is_live);
        Completion::Applied
    }

    /// Store a page obtained outside the request cycle (e.g. the root's
    /// children), replacing whatever was held for `path`. Seeded entries
    /// are pinned and do not count toward the bound.
    pub fn seed(&mut self, path: &str, page: ChildPage) {
        let entry = self.entry_mut(path);
        entry.rows = page.children;
        entry.total = Some(page.total);
        entry.in_flight = None;
        entry.error = None;
        entry.pinned = true;
    }

    /// Mark `path` as recently used.
    pub fn touch(&mut self, path: &str) {
        if let Some(entry) = self.entries.get_mut(path) {
            self.access_counter += 1;
            entry.access_order = self.access_counter;
        }
    }

    /// Rows held for `path`, in offset order.
    pub fn children(&self, path: &str) -> &[Row] {
        self.entries
            .get(path)
            .map(|entry| entry.rows.as_slice())
            .unwrap_or_default()
    }

    /// Total number of children reported by the server, once known.
    pub fn total(&self, path: &str) -> Option<usize> {
        self.entries.get(path).and_then(|entry| entry.total)
    }

    /// Load status of `path`.
    pub fn status(&self, path: &str) -> PageStatus {
        match self.entries.get(path) {
            None => PageStatus::Idle,
            Some(entry) if entry.in_flight.is_some() => PageStatus::Loading,
            Some(Entry {
                error: Some(message),
                ..
            }) => PageStatus::Failed(message.clone()),
            Some(entry) if entry.total.is_some() => PageStatus::Loaded {
                has_more: entry.has_more(),
            },
            Some(_) => PageStatus::Idle,
        }
    }

    /// Whether every page of `path` has been loaded.
    pub fn is_complete(&self, path: &str) -> bool {
        self.entries.get(path).is_some_and(Entry::is_complete)
    }

    fn unpinned_len(&self) -> usize {
        self.entries.values().filter(|entry| !entry.pinned).count()
    }

    /// Evict least recently used entries while over the bound, skipping
    /// pinned, in-flight and live ones. The cache may stay above the bound
    /// when every remaining entry is in use.
    fn evict_if_needed(&mut self, is_live: impl Fn(&str) -> bool) {
        let mut held = self.unpinned_len();
        while held > self.max_nodes {
            let lru_path = self
                .entries
                .iter()
                .filter(|(path, entry)| {
                    entry.in_flight.is_none() && !entry.pinned && !is_live(path)
                })
                .min_by_key(|(_, entry)| entry.access_order)
                .map(|(path, _)| path.clone());

            match lru_path {
                Some(path) => {
                    tracing::debug!(path = %path, "evicting cached children");
                    self.entries.remove(&path);
                    held -= 1;
                }
                None => {
                    tracing::debug!(held, max = self.max_nodes, "every cached node is in use");
                    break;
                }
            }
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.unpinned_len(),
            max_entries: self.max_nodes,
            in_flight: self.entries.values().filter(|e| e.in_flight.is_some()).count(),
            row_count: self.entries.values().map(|e| e.rows.len()).sum(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of unpinned nodes held.
    pub entry_count: usize,
    /// Maximum nodes allowed.
    pub max_entries: usize,
    /// Requests outstanding.
    pub in_flight: usize,
    /// Rows held across all nodes.
    pub row_count: usize,
}

impl CacheStats {
    /// Get usage as percentage. Exceeds 100 while every held node is in use.
    pub fn usage_percent(&self) -> f64 {
        if self.max_entries == 0 {
            return 0.0;
        }
        (self.entry_count as f64 / self.max_entries as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    /// In-memory source: `fanout` children per node, named `c000`, `c001`, ...
    struct FanoutSource {
        fanout: usize,
    }

    impl ChildSource for FanoutSource {
        fn fetch_page<'a>(
            &'a self,
            node_path: &'a str,
            offset: usize,
            limit: usize,
        ) -> BoxFuture<'a, Result<ChildPage>> {
            Box::pin(async move {
                let children = (offset..self.fanout.min(offset + limit))
                    .map(|i| Row::new(path::join(node_path, &format!("c{i:03}")), 0))
                    .collect();
                Ok(ChildPage {
                    children,
                    total: self.fanout,
                })
            })
        }
    }

    /// Liveness where only `node` is expanded-fetched.
    fn only(node: &'static str) -> impl Fn(&str) -> bool {
        move |p| p == node
    }

    fn ok_outcome(request: FetchRequest, count: usize, total: usize) -> FetchOutcome {
        let children = (request.offset..request.offset + count)
            .map(|i| Row::new(format!("{} > n{i}", request.path), 0))
            .collect();
        FetchOutcome {
            request,
            result: Ok(ChildPage { children, total }),
        }
    }

    #[test]
    fn test_first_page_is_deduplicated() {
        let mut cache = ChildPageCache::new(10, 100);
        let first = cache.request_first_page("r > a");
        assert_eq!(
            first,
            Some(FetchRequest {
                path: "r > a".to_string(),
                offset: 0,
                limit: 10
            })
        );
        assert_eq!(cache.request_first_page("r > a"), None);
        assert_eq!(cache.status("r > a"), PageStatus::Loading);
    }

    #[test]
    fn test_pages_append_in_order() {
        let mut cache = ChildPageCache::new(2, 100);
        let first = cache.request_first_page("r").unwrap();
        assert_eq!(cache.complete(ok_outcome(first, 2, 3), only("r")), Completion::Applied);
        assert_eq!(cache.status("r"), PageStatus::Loaded { has_more: true });

        let next = cache.request_next_page("r").unwrap();
        assert_eq!(next.offset, 2);
        assert_eq!(cache.request_next_page("r"), None);
        cache.complete(ok_outcome(next, 1, 3), only("r"));

        assert_eq!(cache.children("r").len(), 3);
        assert!(cache.is_complete("r"));
        assert_eq!(cache.request_next_page("r"), None);
        assert_eq!(cache.request_first_page("r"), None);
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut cache = ChildPageCache::new(5, 100);
        let request = cache.request_first_page("r > a").unwrap();
        let outcome = ok_outcome(request, 3, 3);
        assert_eq!(cache.complete(outcome, |_| false), Completion::DiscardedStale);
        assert!(cache.children("r > a").is_empty());
        // The in-flight marker is cleared, so re-expanding fetches again.
        assert!(cache.request_first_page("r > a").is_some());
    }

    #[test]
    fn test_out_of_order_page_discarded() {
        let mut cache = ChildPageCache::new(5, 100);
        let _ = cache.request_first_page("r").unwrap();
        let bogus = FetchRequest {
            path: "r".to_string(),
            offset: 5,
            limit: 5,
        };
        assert_eq!(
            cache.complete(ok_outcome(bogus, 5, 20), only("r")),
            Completion::DiscardedOutOfOrder
        );
        assert!(cache.children("r").is_empty());
        assert_eq!(cache.status("r"), PageStatus::Loading);
    }

    #[test]
    fn test_failure_and_retry() {
        let mut cache = ChildPageCache::new(5, 100);
        let request = cache.request_first_page("r").unwrap();
        cache.complete(
            FetchOutcome {
                request,
                result: Err("boom".to_string()),
            },
            only("r"),
        );
        assert_eq!(cache.status("r"), PageStatus::Failed("boom".to_string()));
        assert_eq!(cache.request_first_page("r"), None);

        let retry = cache.retry("r").unwrap();
        assert_eq!(retry.offset, 0);
        assert_eq!(cache.status("r"), PageStatus::Loading);
        assert_eq!(cache.retry("r"), None);
    }

    #[test]
    fn test_lru_eviction_skips_in_flight() {
        let mut cache = ChildPageCache::new(5, 2);
        let a = cache.request_first_page("a").unwrap();
        cache.complete(ok_outcome(a, 1, 1), only("a"));
        let _b = cache.request_first_page("b").unwrap();
        let c = cache.request_first_page("c").unwrap();
        cache.complete(ok_outcome(c, 1, 1), only("c"));

        // "b" is older than "c" but still loading, so "a" goes instead.
        assert_eq!(cache.stats().entry_count, 2);
        assert_eq!(cache.status("a"), PageStatus::Idle);
        assert_eq!(cache.status("b"), PageStatus::Loading);
        assert_eq!(cache.children("c").len(), 1);
    }

    #[test]
    fn test_lru_evicts_least_recent_idle() {
        let mut cache = ChildPageCache::new(5, 2);
        for node in ["a", "b"] {
            let request = cache.request_first_page(node).unwrap();
            cache.complete(ok_outcome(request, 1, 1), |p| p == node);
        }
        cache.touch("a");
        let c = cache.request_first_page("c").unwrap();
        cache.complete(ok_outcome(c, 1, 1), only("c"));

        assert!(cache.children("b").is_empty());
        assert_eq!(cache.children("a").len(), 1);
        assert_eq!(cache.children("c").len(), 1);
    }

    #[test]
    fn test_seeded_entry_is_pinned() {
        let mut cache = ChildPageCache::new(5, 1);
        cache.seed(
            "r",
            ChildPage {
                children: vec![Row::new("r > a", 0), Row::new("r > b", 0)],
                total: 2,
            },
        );
        let a = cache.request_first_page("r > a").unwrap();
        cache.complete(ok_outcome(a, 1, 1), only("r > a"));
        let b = cache.request_first_page("r > b").unwrap();
        cache.complete(ok_outcome(b, 1, 1), only("r > b"));

        assert_eq!(cache.children("r").len(), 2);
        assert!(cache.is_complete("r"));
        assert!(cache.children("r > a").is_empty());
        assert_eq!(cache.children("r > b").len(), 1);
        assert_eq!(cache.request_first_page("r"), None);
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn test_live_entries_outgrow_the_bound() {
        let mut cache = ChildPageCache::new(5, 2);
        let expanded = ["a", "b", "c"];
        for node in expanded {
            let request = cache.request_first_page(node).unwrap();
            cache.complete(ok_outcome(request, 1, 1), |p| expanded.iter().any(|e| *e == p));
        }

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 3);
        assert!(stats.usage_percent() > 100.0);
        for node in expanded {
            assert_eq!(cache.children(node).len(), 1);
            assert_eq!(cache.request_first_page(node), None);
        }

        // Once "a" is collapsed it is the first to go.
        let d = cache.request_first_page("d").unwrap();
        cache.complete(ok_outcome(d, 1, 1), |p| p != "a");
        assert!(cache.children("a").is_empty());
        assert_eq!(cache.stats().entry_count, 3);
    }

    #[tokio::test]
    async fn test_run_fetch_against_source() {
        let source: Arc<dyn ChildSource> = Arc::new(FanoutSource { fanout: 3 });
        let mut cache = ChildPageCache::new(2, 10);

        let request = cache.request_first_page("r").unwrap();
        let outcome = run_fetch(Arc::clone(&source), request).await;
        cache.complete(outcome, only("r"));
        let request = cache.request_next_page("r").unwrap();
        let outcome = run_fetch(source, request).await;
        cache.complete(outcome, only("r"));

        let names: Vec<&str> = cache.children("r").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c000", "c001", "c002"]);
        assert!(cache.is_complete("r"));
    }

    struct DownSource;

    impl ChildSource for DownSource {
        fn fetch_page<'a>(
            &'a self,
            node_path: &'a str,
            _offset: usize,
            _limit: usize,
        ) -> BoxFuture<'a, Result<ChildPage>> {
            Box::pin(async move {
                Err(crate::error::ExplorerError::NodeNotFound {
                    path: node_path.to_string(),
                })
            })
        }
    }

    #[test]
    fn test_run_fetch_captures_failure_message() {
        let mut cache = ChildPageCache::new(2, 10);
        let request = cache.request_first_page("r > gone").unwrap();

        let outcome = tokio_test::block_on(run_fetch(Arc::new(DownSource), request));
        assert_eq!(outcome.result, Err("Node not found: r > gone".to_string()));

        cache.complete(outcome, only("r > gone"));
        assert_eq!(
            cache.status("r > gone"),
            PageStatus::Failed("Node not found: r > gone".to_string())
        );
    }
}
