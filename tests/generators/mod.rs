//! Synthetic taxonomy generators.
//!
//! Builds complete trees of configurable depth and fan-out, either as flat
//! depth-ascending rows (the ingestion shape) or as an in-memory
//! [`ChildSource`] that pages children the way the HTTP API does.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use futures::future::BoxFuture;
use taxonomy_explorer::cache::{ChildPage, ChildSource};
use taxonomy_explorer::error::{ExplorerError, Result};
use taxonomy_explorer::merge::compare_names;
use taxonomy_explorer::model::{FlatRow, RootResponse, Row, SearchResponse};
use taxonomy_explorer::path;

/// Shape of a generated taxonomy.
#[derive(Debug, Clone)]
pub struct TaxonomyConfig {
    /// Name of the root node.
    pub root: String,
    /// Number of levels below the root.
    pub depth: usize,
    /// Children per internal node.
    pub fanout: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            root: "Life".to_string(),
            depth: 3,
            fanout: 3,
        }
    }
}

impl TaxonomyConfig {
    /// A tiny tree for fast tests.
    pub fn minimal() -> Self {
        Self {
            depth: 2,
            fanout: 2,
            ..Default::default()
        }
    }

    /// A wide, shallow tree where paging matters.
    pub fn wide() -> Self {
        Self {
            depth: 2,
            fanout: 25,
            ..Default::default()
        }
    }

    /// Number of descendants of a node `level` levels below the root.
    pub fn descendants_at(&self, level: usize) -> u64 {
        let fanout = self.fanout as u64;
        let mut total = 0;
        let mut layer = 1;
        for _ in level..self.depth {
            layer *= fanout;
            total += layer;
        }
        total
    }

    /// Total number of nodes including the root.
    pub fn node_count(&self) -> usize {
        usize::try_from(self.descendants_at(0)).unwrap_or(usize::MAX) + 1
    }
}

/// Generate the taxonomy as depth-ascending flat rows.
pub fn generate_rows(config: &TaxonomyConfig) -> Vec<FlatRow> {
    let mut rows = vec![FlatRow::from_path(config.root.clone(), config.descendants_at(0))];
    let mut frontier = vec![config.root.clone()];

    for level in 1..=config.depth {
        let mut next = Vec::with_capacity(frontier.len() * config.fanout);
        for parent in &frontier {
            for index in 0..config.fanout {
                let child = path::join(parent, &format!("n{level}_{index:02}"));
                rows.push(FlatRow::from_path(child.clone(), config.descendants_at(level)));
                next.push(child);
            }
        }
        frontier = next;
    }

    rows
}

/// An in-memory [`ChildSource`] over a fixed set of rows.
#[derive(Debug, Default)]
pub struct StaticSource {
    root: Option<Row>,
    children: HashMap<String, Vec<Row>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StaticSource {
    /// Index flat rows by parent, sorting each child list by name.
    pub fn from_rows(rows: &[FlatRow]) -> Self {
        let has_children: HashSet<&str> =
            rows.iter().filter_map(|row| row.parent_path.as_deref()).collect();
        let mut source = Self::default();

        for row in rows {
            let expandable = has_children.contains(row.path.as_str());
            let api_row = Row::new(row.path.clone(), row.size).with_children(expandable);
            match &row.parent_path {
                Some(parent) => source
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(api_row),
                None => source.root = Some(api_row),
            }
        }
        for list in source.children.values_mut() {
            list.sort_by(|a, b| compare_names(&a.name, &b.name));
        }
        source
    }

    /// Make every later fetch of `path` fail.
    pub fn fail(&self, path: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(path.to_string());
        }
    }

    /// Let fetches of `path` succeed again.
    pub fn heal(&self, path: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(path);
        }
    }

    /// Every `(path, offset)` fetched so far, in call order.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// The `GET /nodes/root` response for this taxonomy.
    pub fn root_response(&self) -> Option<RootResponse> {
        let node = self.root.clone()?;
        let children = self.children.get(&node.path).cloned().unwrap_or_default();
        Some(RootResponse { node, children })
    }

    /// Substring search over paths, largest first, the way the API orders it.
    pub fn search(&self, query: &str, offset: usize, limit: usize) -> SearchResponse {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<Row> = self
            .children
            .values()
            .flatten()
            .filter(|row| row.path.to_lowercase().contains(&needle))
            .map(|row| Row::new(row.path.clone(), row.size))
            .collect();
        matches.sort_by(|a, b| {
            b.size
                .cmp(&a.size)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.path.cmp(&b.path))
        });

        SearchResponse {
            total: matches.len(),
            results: matches.into_iter().skip(offset).take(limit).collect(),
            query: query.trim().to_string(),
            limit,
            offset,
        }
    }

    fn page(&self, node_path: &str, offset: usize, limit: usize) -> Result<ChildPage> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((node_path.to_string(), offset));
        }
        if self
            .failing
            .lock()
            .map(|failing| failing.contains(node_path))
            .unwrap_or(false)
        {
            return Err(ExplorerError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        let all = self.children.get(node_path).map(Vec::as_slice).unwrap_or_default();
        let known = !all.is_empty()
            || self.root.as_ref().is_some_and(|root| root.path == node_path)
            || self.children.values().flatten().any(|row| row.path == node_path);
        if !known {
            return Err(ExplorerError::NodeNotFound {
                path: node_path.to_string(),
            });
        }

        let children = all.iter().skip(offset).take(limit).cloned().collect();
        Ok(ChildPage {
            children,
            total: all.len(),
        })
    }
}

impl ChildSource for StaticSource {
    fn fetch_page<'a>(
        &'a self,
        path: &'a str,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<ChildPage>> {
        Box::pin(async move { self.page(path, offset, limit) })
    }
}
