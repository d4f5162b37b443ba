//! Tree reconstruction from flat rows.
//!
//! This module handles:
//! - Building a nested [`TreeNode`] from depth-ascending [`FlatRow`]s
//! - Detecting orphaned, duplicate and extra-root rows
//! - Traversing assembled trees (see [`tree`])
//!
//! Assembly is a single linear pass. Rows are indexed into an arena in input
//! order, then nodes are materialized back to front so every child is complete
//! before its parent takes ownership of it. Neither pass recurses, so tree
//! depth does not affect stack usage.

mod tree;

pub use tree::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, Result};
use crate::model::{FlatRow, TreeNode};

/// How the assembler treats rows that break the input contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyMode {
    /// Fail on the first orphaned, duplicate or extra-root row.
    #[default]
    Strict,
    /// Skip offending rows and log a warning for each.
    Lenient,
}

impl std::fmt::Display for AssemblyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Lenient => f.write_str("lenient"),
        }
    }
}

impl std::str::FromStr for AssemblyMode {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(ExplorerError::invalid_argument(
                "assembly",
                format!("expected 'strict' or 'lenient', got '{other}'"),
            )),
        }
    }
}

/// Outcome of an assembly pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// The assembled root, or `None` for empty input.
    pub root: Option<TreeNode>,
    /// Number of nodes in the assembled tree.
    pub node_count: usize,
    /// Paths of rows dropped in lenient mode.
    pub skipped: Vec<String>,
}

/// Arena slot used during assembly.
struct Slot {
    name: String,
    size: u64,
    children: Vec<usize>,
}

/// Reconstructs nested trees from flat, depth-ascending rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeAssembler {
    mode: AssemblyMode,
}

impl TreeAssembler {
    /// Create an assembler with the given mode.
    pub fn new(mode: AssemblyMode) -> Self {
        Self { mode }
    }

    /// Create a lenient assembler.
    pub fn lenient() -> Self {
        Self::new(AssemblyMode::Lenient)
    }

    /// The configured mode.
    pub fn mode(&self) -> AssemblyMode {
        self.mode
    }

    /// Assemble rows into a tree, returning only the root.
    pub fn assemble(&self, rows: &[FlatRow]) -> Result<Option<TreeNode>> {
        self.assemble_with_report(rows).map(|assembly| assembly.root)
    }

    /// Assemble rows into a tree, reporting node count and skipped rows.
    ///
    /// Rows must be sorted by depth ascending; the order is not checked or
    /// corrected. Children keep their input order.
    pub fn assemble_with_report(&self, rows: &[FlatRow]) -> Result<Assembly> {
        let mut slots: Vec<Slot> = Vec::with_capacity(rows.len());
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
        let mut depths: Vec<usize> = Vec::with_capacity(rows.len());
        let mut root: Option<usize> = None;
        let mut skipped = Vec::new();

        for row in rows {
            if index.contains_key(row.path.as_str()) {
                self.reject(&mut skipped, row, || ExplorerError::MalformedRows {
                    message: format!("duplicate row for path '{}'", row.path),
                })?;
                continue;
            }

            let parent_slot = match row.parent_path.as_deref() {
                None => {
                    if root.is_some() {
                        self.reject(&mut skipped, row, || ExplorerError::MalformedRows {
                            message: format!("second root row '{}'", row.path),
                        })?;
                        continue;
                    }
                    None
                }
                Some(parent_path) => match index.get(parent_path) {
                    Some(&slot) if depths[slot] + 1 == row.depth => Some(slot),
                    Some(&slot) => {
                        let parent_depth = depths[slot];
                        self.reject(&mut skipped, row, || ExplorerError::MalformedRows {
                            message: format!(
                                "row '{}' at depth {} under parent at depth {parent_depth}",
                                row.path, row.depth
                            ),
                        })?;
                        continue;
                    }
                    None => {
                        self.reject(&mut skipped, row, || {
                            ExplorerError::integrity(&row.path, parent_path)
                        })?;
                        continue;
                    }
                },
            };

            let slot = slots.len();
            slots.push(Slot {
                name: row.name.clone(),
                size: row.size,
                children: Vec::new(),
            });
            depths.push(row.depth);
            index.insert(row.path.as_str(), slot);

            match parent_slot {
                Some(parent) => slots[parent].children.push(slot),
                None => root = Some(slot),
            }
        }

        let node_count = count_reachable(&slots, root);
        let root = root.map(|root_slot| materialize(slots, root_slot));

        tracing::debug!(
            rows = rows.len(),
            nodes = node_count,
            skipped = skipped.len(),
            mode = %self.mode,
            "assembled tree"
        );

        Ok(Assembly {
            root,
            node_count,
            skipped,
        })
    }

    /// Fail in strict mode, record and continue in lenient mode.
    fn reject(
        &self,
        skipped: &mut Vec<String>,
        row: &FlatRow,
        error: impl FnOnce() -> ExplorerError,
    ) -> Result<()> {
        match self.mode {
            AssemblyMode::Strict => Err(error()),
            AssemblyMode::Lenient => {
                tracing::warn!(path = %row.path, reason = %error(), "skipping row");
                skipped.push(row.path.clone());
                Ok(())
            }
        }
    }
}

/// Assemble rows with the default (strict) assembler.
pub fn build_tree(rows: &[FlatRow]) -> Result<Option<TreeNode>> {
    TreeAssembler::default().assemble(rows)
}

/// Count slots reachable from the root.
fn count_reachable(slots: &[Slot], root: Option<usize>) -> usize {
    let Some(root) = root else {
        return 0;
    };
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(slot) = stack.pop() {
        count += 1;
        stack.extend(&slots[slot].children);
    }
    count
}

/// Turn arena slots into owned nodes.
///
/// Every child slot has a higher index than its parent, so walking the arena
/// backwards finishes children first.
fn materialize(slots: Vec<Slot>, root: usize) -> TreeNode {
    let mut built: Vec<Option<TreeNode>> = Vec::with_capacity(slots.len());
    built.resize_with(slots.len(), || None);
    let mut links: Vec<Vec<usize>> = Vec::with_capacity(slots.len());
    let mut heads: Vec<(String, u64)> = Vec::with_capacity(slots.len());
    for slot in slots {
        links.push(slot.children);
        heads.push((slot.name, slot.size));
    }

    for idx in (0..heads.len()).rev() {
        let children = links[idx]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        let (name, size) = std::mem::take(&mut heads[idx]);
        built[idx] = Some(TreeNode {
            name,
            size,
            children,
        });
    }

    built[root].take().unwrap_or_else(|| TreeNode::leaf("", 0))
}
