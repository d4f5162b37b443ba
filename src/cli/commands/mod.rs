//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod assemble;
pub mod children;
pub mod config;
pub mod search;
pub mod subtree;
pub mod tui;

use std::future::Future;

use crate::cli::Cli;
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{ExplorerError, Result};

/// Load configuration and build an API client from it.
pub fn api_client(cli: &Cli) -> Result<(Config, ApiClient)> {
    let config = cli.load_config()?;
    let client = ApiClient::from_config(&config.api)?;
    Ok((config, client))
}

/// Drive a future to completion on a fresh runtime.
///
/// The CLI is synchronous at the top level; only commands that talk to the
/// API need a runtime, and they need it for a single request chain.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ExplorerError::io("failed to build async runtime", e))?;
    Ok(runtime.block_on(future))
}
