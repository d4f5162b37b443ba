//! Subtree command implementation.
//!
//! Prints the server-assembled subtree under a node.

use crate::cli::{Cli, OutputFormat, SubtreeArgs};
use crate::error::Result;

use super::{api_client, block_on};

/// Run the subtree command.
pub fn run(cli: &Cli, args: &SubtreeArgs) -> Result<()> {
    let (_config, client) = api_client(cli)?;
    let response = block_on(client.subtree(&args.path))??;
    let tree = &response.tree;

    match cli.effective_output() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            print!("{}", tree.render_indented(args.max_depth));
            if !cli.quiet {
                eprintln!("{} nodes, height {}", tree.node_count(), tree.height());
            }
        }
    }

    Ok(())
}
