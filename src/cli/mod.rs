//! Command-line interface for inspecting service topologies.
//!
//! The `weave` binary reads a topology file (see [`topology`]), builds it with
//! the real container, and prints what the build engine recorded.
//!
//! # Commands
//!
//! - `report` - text report grouped by service role
//! - `dot` - Graphviz digraph with cycles highlighted
//! - `cycles` - one normalized cycle per line
//! - `graph` - adjacency lists as text, JSON, or build order
//! - `check` - build and exit non-zero on failures (and optionally cycles)
//!
//! # Global options
//!
//! - `--verbose` / `-v`: debug logging to stderr
//! - `--quiet` / `-q`: errors only
//! - `--config` / `-c`: container and rendering settings (TOML)
//!
//! Without `--verbose` or `--quiet`, `RUST_LOG` is honored if set.

mod check;
mod cycles;
mod dot;
mod graph;
mod report;
pub mod topology;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::WeaveConfig;

pub use check::CheckCommand;
pub use cycles::CyclesCommand;
pub use dot::DotCommand;
pub use graph::{GraphCommand, GraphFormat};
pub use report::ReportCommand;

/// Settings derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can run commands with explicit
/// settings instead of parsed arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive, or `None` for errors only.
    pub log_level: Option<String>,
    /// Whether the level came from an explicit flag rather than the default.
    pub explicit_level: bool,
    /// Path to a [`WeaveConfig`] file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) if self.explicit_level => EnvFilter::new(format!("weave={level}")),
            Some(level) => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("weave={level}"))),
            None => EnvFilter::new("error"),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the container settings, or defaults when no file was given.
    pub fn load_weave_config(&self) -> Result<WeaveConfig> {
        WeaveConfig::load_with_optional(self.config_path.as_deref()).with_context(|| {
            format!(
                "Failed to load settings from {}",
                self.config_path.as_deref().map_or_else(|| "defaults".into(), |p| p.display().to_string())
            )
        })
    }
}

/// Inspect how a set of services depends on each other.
#[derive(Parser, Debug)]
#[command(
    name = "weave",
    about = "Build service topologies and inspect their dependency graphs",
    version,
    long_about = "weave builds a declared service topology with a lazy, cycle-tolerant \
                  container and reports the dependency graph it recorded."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr.
    ///
    /// Shows every provider that runs and every rollback. Mutually exclusive
    /// with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a settings file.
    ///
    /// ```toml
    /// strict_lookups = false
    /// dedupe_edges = true
    ///
    /// [render]
    /// rankdir = "LR"
    /// ```
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a text report of the dependency graph
    Report(ReportCommand),

    /// Print the dependency graph in Graphviz DOT format
    Dot(DotCommand),

    /// List dependency cycles
    Cycles(CyclesCommand),

    /// Print adjacency lists
    Graph(GraphCommand),

    /// Build a topology and fail if any provider fails
    Check(CheckCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Translate global flags into a [`CliConfig`].
    ///
    /// `--verbose` maps to `debug`, `--quiet` to errors only, and the default
    /// is `info` unless `RUST_LOG` says otherwise.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let (log_level, explicit_level) = if self.verbose {
            (Some("debug".to_string()), true)
        } else if self.quiet {
            (None, true)
        } else {
            (Some("info".to_string()), false)
        };

        CliConfig {
            log_level,
            explicit_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with explicit settings.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let weave_config = config.load_weave_config()?;

        match self.command {
            Commands::Report(cmd) => cmd.execute(&weave_config),
            Commands::Dot(cmd) => cmd.execute(&weave_config),
            Commands::Cycles(cmd) => cmd.execute(&weave_config),
            Commands::Graph(cmd) => cmd.execute(&weave_config),
            Commands::Check(cmd) => cmd.execute(&weave_config),
        }
    }
}
