//! HTTP client for the taxonomy API.
//!
//! Thin `reqwest` wrapper over the four read endpoints. Limits are clamped
//! to the server maxima before sending, and non-success responses are turned
//! into [`ExplorerError::ApiError`] carrying the body's `error` message.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::cache::{ChildPage, ChildSource};
use crate::config::ApiConfig;
use crate::error::{ExplorerError, Result};
use crate::model::{ApiErrorBody, ChildrenResponse, RootResponse, SearchResponse, SubtreeResponse};

/// Largest page the children endpoint serves.
pub const MAX_CHILDREN_LIMIT: usize = 500;

/// Largest page the search endpoint serves.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Queries shorter than this are rejected before any request is made.
pub const MIN_QUERY_LEN: usize = 2;

/// Async client for the taxonomy API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:3001/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ExplorerError::invalid_argument(
                "base_url",
                format!("expected an http:// or https:// URL, got '{base_url}'"),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taxonomy-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExplorerError::http(&base_url, e))?;
        Ok(Self { base_url, http })
    }

    /// Create a client from the `[api]` configuration section.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.base_url);
        tracing::debug!(url = %url, ?query, "GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ExplorerError::http(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
            };
            tracing::warn!(url = %url, status = status.as_u16(), %message, "API error");
            return Err(ExplorerError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ExplorerError::http(&url, e))
    }

    /// `GET /nodes/root`: the root row and its immediate children.
    pub async fn root(&self) -> Result<RootResponse> {
        self.get("/nodes/root", &[]).await
    }

    /// `GET /nodes/children`: one page of a node's children.
    pub async fn children(
        &self,
        path: &str,
        limit: usize,
        offset: usize,
    ) -> Result<ChildrenResponse> {
        let limit = limit.clamp(1, MAX_CHILDREN_LIMIT);
        self.get(
            "/nodes/children",
            &[
                ("path", path.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }

    /// `GET /nodes/subtree`: the server-assembled subtree under `path`.
    pub async fn subtree(&self, path: &str) -> Result<SubtreeResponse> {
        self.get("/nodes/subtree", &[("path", path.to_string())])
            .await
            .map_err(|e| match e {
                ExplorerError::ApiError { status: 404, .. } => ExplorerError::NodeNotFound {
                    path: path.to_string(),
                },
                other => other,
            })
    }

    /// `GET /search`: paginated substring search over paths.
    pub async fn search(&self, query: &str, limit: usize, offset: usize) -> Result<SearchResponse> {
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        self.get(
            "/search",
            &[
                ("q", query.trim().to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ],
        )
        .await
    }
}

impl ChildSource for ApiClient {
    fn fetch_page<'a>(
        &'a self,
        path: &'a str,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<ChildPage>> {
        Box::pin(async move { self.children(path, limit, offset).await.map(ChildPage::from) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3001/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001/api");
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = ApiClient::new("localhost:3001", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidArgument { .. }));
    }
}
