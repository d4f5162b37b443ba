//! Config command implementation.
//!
//! View and modify taxonomy-explorer configuration settings.

use std::path::{Path, PathBuf};

use crate::cli::{Cli, ConfigAction, ConfigArgs, OutputFormat};
use crate::config::{default_config_path, Config, CONFIG_KEYS};
use crate::error::Result;

/// Run the config command.
pub fn run(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    let path = config_path(cli)?;
    match &args.action {
        ConfigAction::Show => show_config(cli, &path),
        ConfigAction::Get { key } => get_config_value(cli, &path, key),
        ConfigAction::Set { key, value } => set_config_value(&path, key, value),
        ConfigAction::Path => show_config_path(&path),
        ConfigAction::Init => init_config(&path),
        ConfigAction::Reset => reset_config(&path),
    }
}

/// The file the config command operates on.
fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

/// Show full configuration.
fn show_config(cli: &Cli, path: &Path) -> Result<()> {
    let config = Config::load_or_default(Some(path))?;

    match cli.effective_output() {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("Taxonomy Explorer Configuration");
            println!("===============================\n");

            let mut section = "";
            for key in CONFIG_KEYS {
                let (name, field) = key.split_once('.').unwrap_or(("", key));
                if name != section {
                    if !section.is_empty() {
                        println!();
                    }
                    println!("[{name}]");
                    section = name;
                }
                println!("  {field} = {}", config.get_value(key)?);
            }
        }
    }

    Ok(())
}

/// Get a specific configuration value.
fn get_config_value(cli: &Cli, path: &Path, key: &str) -> Result<()> {
    let config = Config::load_or_default(Some(path))?;
    let value = config.get_value(key)?;

    match cli.effective_output() {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ key: value }));
        }
        OutputFormat::Text => {
            println!("{value}");
        }
    }

    Ok(())
}

/// Set a configuration value.
fn set_config_value(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default(Some(path))?;
    config.set_value(key, value)?;
    config.save_to(path)?;
    println!("Set {key} = {}", config.get_value(key)?);

    Ok(())
}

/// Show configuration file path.
fn show_config_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}

/// Initialize configuration file with defaults.
fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use 'taxo config reset' to reset to defaults.");
        return Ok(());
    }

    Config::default().save_to(path)?;
    println!("Created configuration file at: {}", path.display());

    Ok(())
}

/// Reset configuration to defaults.
fn reset_config(path: &Path) -> Result<()> {
    if !path.exists() {
        println!("No configuration file exists. Use 'taxo config init' to create one.");
        return Ok(());
    }

    Config::default().save_to(path)?;
    println!("Reset configuration to defaults at: {}", path.display());

    Ok(())
}
