//! Build a topology and report whether it is healthy.
//!
//! Exits non-zero if any provider fails, and with `--deny-cycles` also when
//! the recorded graph contains a cycle.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use super::topology::build_topology;
use crate::config::WeaveConfig;
use crate::core::{ErrorContext, WeaveError};

/// Build a topology and fail on errors (and optionally on cycles).
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Topology file to build
    #[arg(value_name = "TOPOLOGY")]
    pub topology: PathBuf,

    /// Treat any dependency cycle as an error
    #[arg(long)]
    pub deny_cycles: bool,
}

impl CheckCommand {
    pub fn execute(self, config: &WeaveConfig) -> Result<()> {
        let container = build_topology(&self.topology, config)?;
        let cycles = container.all_circular_dependencies();

        if self.deny_cycles
            && let Some(cycle) = container.circular_dependency()
        {
            return Err(ErrorContext::new(WeaveError::CircularDependency {
                cycle,
            })
            .with_suggestion("Break the cycle, or run without --deny-cycles to accept it")
            .with_details("Cyclic services are built, but each side sees the other only after build() returns")
            .into());
        }

        info!("Checked {}", self.topology.display());
        println!(
            "{} Built {} services from {}",
            "✓".green(),
            container.len(),
            self.topology.display()
        );
        if !cycles.is_empty() {
            println!(
                "{} {} circular {} (run 'weave cycles' for details)",
                "⚠".yellow(),
                cycles.len(),
                if cycles.len() == 1 {
                    "dependency"
                } else {
                    "dependencies"
                }
            );
        }
        Ok(())
    }
}
