//! taxonomy-explorer: lazy browsing of very large hierarchical taxonomies.
//!
//! The taxonomy is far too large to load at once, so children are fetched a
//! page at a time from a remote store. The engine in this crate keeps the
//! in-memory tree consistent while the user jumps straight to arbitrary deep
//! nodes, revealing them in place without fetching every intervening page.
//!
//! # Features
//!
//! - **Lazy paging**: children are requested per node, de-duplicated and
//!   bounded by an LRU cache
//! - **Navigation without fetch storms**: revealing a deep node expands its
//!   ancestors in a suppressed state and shows placeholders until released
//! - **Pure state transitions**: expansion is an immutable value driven by
//!   [`expansion::Action`]s
//! - **Dual Interface**: scriptable CLI and an interactive TUI
//!
//! # Quick Start
//!
//! ```rust
//! use taxonomy_explorer::expansion::ExpansionState;
//! use taxonomy_explorer::merge;
//! use taxonomy_explorer::model::Row;
//!
//! // Reveal a node whose ancestors have not been fetched yet.
//! let state = ExpansionState::new().expand_to_node("Life > Animal > Bird");
//!
//! // The fetched first page of "Life" does not contain "Animal"...
//! let fetched = vec![Row::new("Life > Fungus", 12), Row::new("Life > Plant", 40)];
//! let children = merge::render("Life", &fetched, &state, Some("Life > Animal > Bird"));
//!
//! // ...so a placeholder is merged in at its sorted position.
//! let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
//! assert_eq!(names, ["Animal", "Fungus", "Plant"]);
//! assert!(children[0].is_placeholder());
//! ```
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`path`]: Pure functions over `" > "`-delimited path strings
//! - [`model`]: Rows, tree nodes and API response types
//! - [`reconstruction`]: Tree assembly from flat, depth-sorted rows
//! - [`expansion`]: Expansion/selection state and its transitions
//! - [`merge`]: Fetched-plus-placeholder child lists
//! - [`cache`]: Paginated child storage and the [`cache::ChildSource`] seam
//! - [`client`]: HTTP client for the taxonomy API
//! - [`explorer`]: Session glue: dispatch, fetch planning, flattening
//! - [`cli`]: Command-line interface
//! - [`tui`]: Terminal user interface
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling

#![doc(html_root_url = "https://docs.rs/taxonomy-explorer/0.1.0")]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod expansion;
pub mod explorer;
pub mod merge;
pub mod model;
pub mod path;
pub mod reconstruction;
pub mod tui;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{ExplorerError, Result};
pub use model::{FlatRow, Row, TreeNode};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cache::{ChildPage, ChildPageCache, ChildSource, FetchOutcome, FetchRequest};
    pub use crate::error::{ExplorerError, Result};
    pub use crate::expansion::{Action, ExpansionState, NodeState, SelectionState};
    pub use crate::explorer::{Explorer, RowKind, VisibleRow};
    pub use crate::merge::{ChildOrigin, ChildView};
    pub use crate::model::{FlatRow, Row, TreeNode};
    pub use crate::reconstruction::{build_tree, AssemblyMode, TreeAssembler};
}
