//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Default configuration file, used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "logtrack.toml";

/// logtrack -- replay job-processor and proxy logs into the job history database.
///
/// Use `logtrack <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logtrack", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logtrack.toml configuration file [default: logtrack.toml].
    ///
    /// A missing file is an error only when this flag is given.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Shorthand for `--log-level debug`.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration path to load and whether the user named it explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }

    /// Effective log level override, if any. `--log-level` wins over `-v`.
    pub fn log_level_override(&self) -> Option<String> {
        self.log_level
            .clone()
            .or_else(|| self.verbose.then(|| "debug".to_owned()))
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a log directory into the job history database.
    Run(RunArgs),

    /// Inspect line-classification rules.
    Rules(RulesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Walk a log directory, classify every line and write job history.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Log directory to walk recursively (overrides `processor.log_path`).
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// YAML rule file (overrides `processor.rules_path`).
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// PostgreSQL connection string (overrides `store.dsn`).
    #[arg(long)]
    pub dsn: Option<String>,

    /// SQL script to run once before processing (overrides `store.setup_script`).
    #[arg(long)]
    pub setup_script: Option<PathBuf>,

    /// Only log what each line would do; never connect to the database.
    #[arg(long)]
    pub dry_run: bool,
}

// ---- rules ----

/// Inspect line-classification rules.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List file patterns, line patterns and handlers in match order.
    List {
        /// YAML rule file (default: `processor.rules_path`, else built-in rules).
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Build a rule table from a YAML file and report errors.
    Check {
        /// YAML rule file to check.
        path: PathBuf,
    },
}

// ---- config ----

/// Manage logtrack configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, store, processor, handlers).
        #[arg(long)]
        section: Option<String>,
    },
}
