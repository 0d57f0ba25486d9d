//! weave CLI entry point
//!
//! Parses arguments, runs the selected command, and turns failures into a
//! user-friendly message with a non-zero exit code.
//!
//! - `report` - text report of the dependency graph
//! - `dot` - Graphviz output
//! - `cycles` - list dependency cycles
//! - `graph` - adjacency lists, JSON, or build order
//! - `check` - build a topology and fail on errors

use anyhow::Result;
use clap::Parser;
use weave::cli;
use weave::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
