//! TUI launcher command.
//!
//! Launches the interactive explorer.

use crate::cli::{Cli, TuiArgs};
use crate::error::Result;
use crate::tui::TuiOptions;

/// Run the TUI command.
pub fn run(cli: &Cli, args: &TuiArgs) -> Result<()> {
    let config = cli.load_config()?;
    let options = TuiOptions {
        theme: args.theme.clone().unwrap_or_else(|| config.theme.name.clone()),
        ascii: args.ascii || !config.theme.unicode,
        reveal: args.reveal.clone(),
        config,
    };
    crate::tui::run(options)
}
