//! Command-line interface for taxonomy-explorer.
//!
//! Provides scriptable access to the taxonomy API and the local assembler:
//! - `tui`: Interactive explorer
//! - `children`: One page of a node's children
//! - `subtree`: Server-assembled subtree
//! - `search`: Paginated search
//! - `assemble`: Build a tree from a local file of flat rows
//! - `config`: View and modify configuration

mod commands;

pub use commands::*;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;

/// Browse a large hierarchical taxonomy lazily.
#[derive(Debug, Parser)]
#[command(name = "taxo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the taxonomy API (overrides the config file).
    #[arg(short = 'u', long, global = true, env = "TAXO_BASE_URL")]
    pub base_url: Option<String>,

    /// Output format for structured data.
    #[arg(short = 'o', long, global = true, default_value = "text", env = "TAXO_OUTPUT")]
    pub output: OutputFormat,

    /// Output as JSON (shorthand for -o json).
    #[arg(long, global = true, env = "TAXO_JSON")]
    pub json: bool,

    /// Suppress non-essential output.
    #[arg(short = 'q', long, global = true, env = "TAXO_QUIET")]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "TAXO_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "TAXO_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Log output file (default: stderr; the TUI logs only when this is set).
    #[arg(long, global = true, env = "TAXO_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "TAXO_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output.
    Json,
}

impl Cli {
    /// Get effective output format.
    #[must_use]
    pub fn effective_output(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }

    /// Load the configuration file and apply global flag overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.trim_end_matches('/').to_string();
        }
        Ok(config)
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Launch the interactive explorer.
    Tui(TuiArgs),

    /// List one page of a node's children.
    #[command(alias = "ls")]
    Children(ChildrenArgs),

    /// Show the subtree under a node.
    Subtree(SubtreeArgs),

    /// Search node paths.
    #[command(alias = "find")]
    Search(SearchArgs),

    /// Assemble a tree from a local file of flat rows.
    Assemble(AssembleArgs),

    /// View and modify configuration.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the TUI command.
#[derive(Debug, Parser)]
pub struct TuiArgs {
    /// Reveal and select this path once the tree is loaded.
    #[arg(short = 'r', long)]
    pub reveal: Option<String>,

    /// Theme to use.
    #[arg(long, env = "TAXO_TUI_THEME")]
    pub theme: Option<String>,

    /// Use ASCII-only characters (no Unicode markers).
    #[arg(long, env = "TAXO_ASCII")]
    pub ascii: bool,
}

/// Arguments for the children command.
#[derive(Debug, Parser)]
pub struct ChildrenArgs {
    /// Full path of the parent node, e.g. "Life > Animal".
    pub path: String,

    /// Page size (server maximum 500; default from config).
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Number of children to skip.
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Follow pagination until every child is listed.
    #[arg(short = 'a', long, conflicts_with = "offset")]
    pub all: bool,
}

/// Arguments for the subtree command.
#[derive(Debug, Parser)]
pub struct SubtreeArgs {
    /// Full path of the subtree root.
    pub path: String,

    /// Only print this many levels below the subtree root.
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Substring to search for (at least 2 characters).
    pub query: String,

    /// Results per page (server maximum 100; default from config).
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Number of results to skip.
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

/// Arguments for the assemble command.
#[derive(Debug, Parser)]
pub struct AssembleArgs {
    /// File of flat rows: a JSON array or one JSON object per line.
    pub file: PathBuf,

    /// Skip orphaned and duplicate rows instead of failing.
    #[arg(long)]
    pub lenient: bool,

    /// Only print this many levels below the root.
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Print only counts, not the tree.
    #[arg(short = 's', long)]
    pub summary: bool,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Config action to perform.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommand actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show all configuration values.
    Show,

    /// Get a specific configuration value.
    Get {
        /// Configuration key (e.g., "api.page_size").
        key: String,
    },

    /// Set a configuration value.
    Set {
        /// Configuration key (e.g., "api.page_size").
        key: String,
        /// Value to set.
        value: String,
    },

    /// Show configuration file path.
    Path,

    /// Initialize configuration file with defaults.
    Init,

    /// Reset configuration to defaults.
    Reset,
}

/// Arguments for the completions command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "taxo", &mut io::stdout());
}

/// Initialize tracing/logging based on CLI options.
fn init_logging(cli: &Cli) {
    use std::sync::Mutex;
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    // The TUI owns the terminal; without a log file it stays silent.
    let is_tui = matches!(cli.command, Commands::Tui(_));
    if is_tui && cli.log_file.is_none() {
        return;
    }

    let writer = match &cli.log_file {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
            Err(e) => {
                eprintln!("Warning: Could not open log file {}: {e}", path.display());
                if is_tui {
                    return;
                }
                BoxMakeWriter::new(std::io::stderr)
            }
        },
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let ansi = cli.log_file.is_none();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(ansi)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_ansi(ansi).with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    match &cli.command {
        Commands::Tui(args) => commands::tui::run(&cli, args),
        Commands::Children(args) => commands::children::run(&cli, args),
        Commands::Subtree(args) => commands::subtree::run(&cli, args),
        Commands::Search(args) => commands::search::run(&cli, args),
        Commands::Assemble(args) => commands::assemble::run(&cli, args),
        Commands::Config(args) => commands::config::run(&cli, args),
        Commands::Completions(args) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}
