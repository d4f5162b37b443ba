//! Terminal User Interface for taxonomy-explorer.
//!
//! Provides an interactive two-pane interface:
//! - Left: Lazily loaded taxonomy tree
//! - Right: Details of the selected node, or the search pane
//!
//! Built with ratatui for cross-platform terminal support. API requests run
//! on a tokio runtime and report back to the single-threaded event loop.

mod app;
mod components;
mod events;
pub mod state;
pub mod theme;

pub use theme::available_themes;

use crate::config::Config;
use crate::error::Result;

/// Options for launching the TUI.
#[derive(Debug, Clone)]
pub struct TuiOptions {
    /// Loaded configuration (API, cache, display settings).
    pub config: Config,
    /// Theme name.
    pub theme: String,
    /// Use ASCII-only glyphs.
    pub ascii: bool,
    /// Path to reveal once the tree is loaded.
    pub reveal: Option<String>,
}

/// Launch the TUI application.
pub fn run(options: TuiOptions) -> Result<()> {
    app::run(options)
}
