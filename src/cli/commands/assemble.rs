//! Assemble command implementation.
//!
//! Builds a nested tree from a local file of flat, depth-sorted rows, the
//! same shape ingestion produces. Accepts either a JSON array or JSON Lines.

use std::path::Path;

use serde::Serialize;

use crate::cli::{AssembleArgs, Cli, OutputFormat};
use crate::error::{ExplorerError, Result};
use crate::model::{FlatRow, TreeNode};
use crate::reconstruction::{AssemblyMode, TreeAssembler};

/// JSON output of the assemble command.
#[derive(Debug, Serialize)]
struct AssembleOutput<'a> {
    mode: AssemblyMode,
    node_count: usize,
    skipped: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<&'a TreeNode>,
}

/// Run the assemble command.
pub fn run(cli: &Cli, args: &AssembleArgs) -> Result<()> {
    let config = cli.load_config()?;
    let mode = if args.lenient {
        AssemblyMode::Lenient
    } else {
        config.tree.assembly
    };

    let rows = load_rows(&args.file)?;
    let assembly = TreeAssembler::new(mode).assemble_with_report(&rows)?;

    match cli.effective_output() {
        OutputFormat::Json => {
            let output = AssembleOutput {
                mode,
                node_count: assembly.node_count,
                skipped: &assembly.skipped,
                tree: if args.summary {
                    None
                } else {
                    assembly.root.as_ref()
                },
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if !args.summary {
                if let Some(root) = &assembly.root {
                    print!("{}", root.render_indented(args.max_depth));
                }
            }
            if args.summary || !cli.quiet {
                println!(
                    "{} rows, {} nodes assembled, {} skipped ({mode})",
                    rows.len(),
                    assembly.node_count,
                    assembly.skipped.len()
                );
                for path in &assembly.skipped {
                    println!("  skipped: {path}");
                }
            }
        }
    }

    Ok(())
}

/// Read flat rows from a file.
pub fn load_rows(path: &Path) -> Result<Vec<FlatRow>> {
    if !path.exists() {
        return Err(ExplorerError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ExplorerError::io(format!("Failed to read {}", path.display()), e))?;
    parse_rows(&content)
}

/// Parse rows from a JSON array or from JSON Lines (one row per line).
pub fn parse_rows(content: &str) -> Result<Vec<FlatRow>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| ExplorerError::SerializationError {
                context: format!("line {}", index + 1),
                source: e,
            })
        })
        .collect()
}
