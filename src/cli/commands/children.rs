//! Children command implementation.
//!
//! Lists one page (or, with `--all`, every page) of a node's children.

use crate::cli::{ChildrenArgs, Cli, OutputFormat};
use crate::client::ApiClient;
use crate::error::Result;
use crate::model::{ChildrenResponse, Row};
use crate::util::{format_count, format_size};

use super::{api_client, block_on};

/// Run the children command.
pub fn run(cli: &Cli, args: &ChildrenArgs) -> Result<()> {
    let (config, client) = api_client(cli)?;
    let limit = args.limit.unwrap_or(config.api.page_size);

    let response = block_on(async {
        if !args.all {
            return fetch_page(&client, &args.path, limit, args.offset).await;
        }

        let mut first = fetch_page(&client, &args.path, limit, 0).await?;
        while first.children.len() < first.total {
            let page = fetch_page(&client, &args.path, limit, first.children.len()).await?;
            if page.children.is_empty() {
                tracing::warn!(
                    path = %args.path,
                    loaded = first.children.len(),
                    total = first.total,
                    "server returned an empty page before the total was reached"
                );
                break;
            }
            first.children.extend(page.children);
        }
        Ok(first)
    })??;

    match cli.effective_output() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => print_text(cli, args, &response, config.display.show_sizes),
    }

    Ok(())
}

/// Fetch one page, retrying once when the failure looks transient.
async fn fetch_page(
    client: &ApiClient,
    path: &str,
    limit: usize,
    offset: usize,
) -> Result<ChildrenResponse> {
    match client.children(path, limit, offset).await {
        Err(e) if e.is_retryable() => {
            tracing::warn!(path, offset, error = %e, "retrying page");
            client.children(path, limit, offset).await
        }
        result => result,
    }
}

fn print_text(cli: &Cli, args: &ChildrenArgs, response: &ChildrenResponse, show_sizes: bool) {
    for row in &response.children {
        println!("{}", format_row(row, show_sizes));
    }

    if cli.quiet {
        return;
    }
    let offset = if args.all { 0 } else { args.offset };
    let shown_to = offset + response.children.len();
    if response.children.is_empty() {
        eprintln!("No children ({} total)", format_count(response.total as u64));
    } else {
        eprintln!(
            "Showing {}-{} of {}",
            format_count(offset as u64 + 1),
            format_count(shown_to as u64),
            format_count(response.total as u64)
        );
    }
    if shown_to < response.total {
        eprintln!("Next page: --offset {shown_to}");
    }
}

fn format_row(row: &Row, show_sizes: bool) -> String {
    let marker = if row.is_expandable() { "+" } else { " " };
    if show_sizes {
        format!("{marker} {:<40} {:>8}", row.name, format_size(row.size))
    } else {
        format!("{marker} {}", row.name)
    }
}
