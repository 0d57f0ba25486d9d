//! Print a text report of a topology's dependency graph.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::topology::build_topology;
use crate::config::WeaveConfig;

/// Build a topology and print its dependency report.
#[derive(Args, Debug)]
pub struct ReportCommand {
    /// Topology file to build
    #[arg(value_name = "TOPOLOGY")]
    pub topology: PathBuf,
}

impl ReportCommand {
    pub fn execute(self, config: &WeaveConfig) -> Result<()> {
        print!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &WeaveConfig) -> Result<String> {
        let container = build_topology(&self.topology, config)?;
        Ok(container.print_dependency_graph())
    }
}
