//! List the dependency cycles of a topology.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::topology::build_topology;
use crate::config::WeaveConfig;
use crate::constants::PATH_SEPARATOR;

/// Build a topology and print one normalized cycle per line.
#[derive(Args, Debug)]
pub struct CyclesCommand {
    /// Topology file to build
    #[arg(value_name = "TOPOLOGY")]
    pub topology: PathBuf,

    /// Print groups of mutually dependent services instead of cycle paths
    #[arg(long)]
    pub components: bool,
}

impl CyclesCommand {
    pub fn execute(self, config: &WeaveConfig) -> Result<()> {
        print!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &WeaveConfig) -> Result<String> {
        let container = build_topology(&self.topology, config)?;
        let graph = container.dependency_graph();

        let lines: Vec<String> = if self.components {
            graph.strongly_connected_components().iter().map(|group| group.join(", ")).collect()
        } else {
            graph.all_cycles().iter().map(|cycle| cycle.join(PATH_SEPARATOR)).collect()
        };

        if lines.is_empty() {
            return Ok("No circular dependencies found.\n".to_string());
        }
        Ok(lines.iter().map(|line| format!("{line}\n")).collect())
    }
}
