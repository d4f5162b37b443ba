//! Search command implementation.
//!
//! Runs one page of a substring search over node paths.

use crate::cli::{Cli, OutputFormat, SearchArgs};
use crate::client::MIN_QUERY_LEN;
use crate::error::{ExplorerError, Result};
use crate::util::{format_count, format_size};

use super::{api_client, block_on};

/// Run the search command.
pub fn run(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let query = args.query.trim();
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(ExplorerError::invalid_argument(
            "query",
            format!("must be at least {MIN_QUERY_LEN} characters"),
        ));
    }

    let (config, client) = api_client(cli)?;
    let limit = args.limit.unwrap_or(config.api.search_page_size);
    let response = block_on(client.search(query, limit, args.offset))??;

    match cli.effective_output() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            for row in &response.results {
                if config.display.show_sizes {
                    println!("{:>8}  {}", format_size(row.size), row.path);
                } else {
                    println!("{}", row.path);
                }
            }

            if !cli.quiet {
                if response.results.is_empty() {
                    eprintln!("No matches for \"{}\"", response.query);
                } else {
                    eprintln!(
                        "Showing {}-{} of {} matches",
                        format_count(response.offset as u64 + 1),
                        format_count((response.offset + response.results.len()) as u64),
                        format_count(response.total as u64)
                    );
                }
                if response.has_next_page() {
                    eprintln!(
                        "Next page: --offset {}",
                        response.offset + response.results.len()
                    );
                }
            }
        }
    }

    Ok(())
}
