//! Print a topology's dependency graph in Graphviz format.
//!
//! ```bash
//! weave dot services.toml | dot -Tsvg > services.svg
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::topology::build_topology;
use crate::config::WeaveConfig;

/// Build a topology and print it as a Graphviz digraph.
#[derive(Args, Debug)]
pub struct DotCommand {
    /// Topology file to build
    #[arg(value_name = "TOPOLOGY")]
    pub topology: PathBuf,

    /// Layout direction, overriding `render.rankdir` from the config file
    #[arg(long, value_parser = ["TB", "LR", "BT", "RL"])]
    pub rankdir: Option<String>,
}

impl DotCommand {
    pub fn execute(self, config: &WeaveConfig) -> Result<()> {
        print!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &WeaveConfig) -> Result<String> {
        let mut config = config.clone();
        if let Some(rankdir) = &self.rankdir {
            config.render.rankdir.clone_from(rankdir);
        }
        let container = build_topology(&self.topology, &config)?;
        Ok(container.generate_dot_graph())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TopologyFixture;
    use tempfile::tempdir;

    #[test]
    fn test_dot_rankdir_override() {
        let temp = tempdir().unwrap();
        let cmd = DotCommand {
            topology: TopologyFixture::cyclic().write_to(temp.path()).unwrap(),
            rankdir: Some("LR".to_string()),
        };

        let dot = cmd.render(&WeaveConfig::default()).unwrap();
        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("\"a\" [fillcolor=lightcoral"));
        assert!(dot.contains("legend"));
    }
}
