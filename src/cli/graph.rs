//! Print the raw adjacency of a topology.
//!
//! # Examples
//!
//! ```bash
//! weave graph services.toml                 # service -> dependencies
//! weave graph services.toml --format json   # both directions as JSON
//! weave graph services.toml --format order  # build order, dependencies first
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use super::topology::build_topology;
use crate::config::WeaveConfig;
use crate::graph::DependencyGraph;

/// Output formats for the `graph` command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// One line per service: `name -> dep, dep`
    #[default]
    Text,
    /// Forward and reverse adjacency as JSON
    Json,
    /// Services in dependency order; fails on cycles
    Order,
}

/// Build a topology and print its adjacency lists.
#[derive(Args, Debug)]
pub struct GraphCommand {
    /// Topology file to build
    #[arg(value_name = "TOPOLOGY")]
    pub topology: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = GraphFormat::Text)]
    pub format: GraphFormat,

    /// Only show SERVICE and everything it depends on, directly or not
    #[arg(short = 's', long, value_name = "SERVICE")]
    pub service: Option<String>,
}

impl GraphCommand {
    pub fn execute(self, config: &WeaveConfig) -> Result<()> {
        print!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &WeaveConfig) -> Result<String> {
        let container = build_topology(&self.topology, config)?;
        let mut graph = container.dependency_graph();

        if let Some(service) = &self.service {
            if !graph.dependencies.contains_key(service) {
                return Err(crate::core::WeaveError::not_found(service.as_str()).into());
            }
            graph = restrict(&graph, service);
        }

        match self.format {
            GraphFormat::Text => Ok(graph
                .services()
                .map(|service| {
                    let deps = graph.dependencies_of(service);
                    if deps.is_empty() {
                        format!("{service} -> (none)\n")
                    } else {
                        format!("{service} -> {}\n", deps.join(", "))
                    }
                })
                .collect()),
            GraphFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&graph)?)),
            GraphFormat::Order => {
                let order = graph.topological_order()?;
                Ok(order.iter().map(|service| format!("{service}\n")).collect())
            }
        }
    }
}

/// The subgraph induced by `service` and its transitive dependencies.
fn restrict(graph: &DependencyGraph, service: &str) -> DependencyGraph {
    let mut keep = graph.transitive_dependencies(service);
    keep.insert(service.to_string());

    DependencyGraph::from_edges(keep.iter().map(|name| {
        (
            name.as_str(),
            graph
                .dependencies_of(name)
                .iter()
                .filter(|dep| keep.contains(*dep))
                .map(String::as_str),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WeaveError;
    use crate::test_utils::TopologyFixture;
    use tempfile::tempdir;

    fn command(fixture: TopologyFixture, format: GraphFormat, dir: &std::path::Path) -> GraphCommand {
        GraphCommand {
            topology: fixture.write_to(dir).unwrap(),
            format,
            service: None,
        }
    }

    #[test]
    fn test_text_format() {
        let temp = tempdir().unwrap();
        let cmd = command(TopologyFixture::layered(), GraphFormat::Text, temp.path());

        let output = cmd.render(&WeaveConfig::default()).unwrap();
        assert_eq!(output, "api -> database, users\ndatabase -> (none)\nusers -> database\n");
    }

    #[test]
    fn test_json_format() {
        let temp = tempdir().unwrap();
        let cmd = command(TopologyFixture::layered(), GraphFormat::Json, temp.path());

        let output = cmd.render(&WeaveConfig::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["dependencies"]["users"][0], "database");
        assert_eq!(json["dependents"]["database"][1], "users");
    }

    #[test]
    fn test_order_format() {
        let temp = tempdir().unwrap();
        let cmd = command(TopologyFixture::layered(), GraphFormat::Order, temp.path());

        let output = cmd.render(&WeaveConfig::default()).unwrap();
        assert_eq!(output, "database\nusers\napi\n");
    }

    #[test]
    fn test_order_format_rejects_cycles() {
        let temp = tempdir().unwrap();
        let cmd = command(TopologyFixture::cyclic(), GraphFormat::Order, temp.path());

        let err = cmd.render(&WeaveConfig::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<WeaveError>(), Some(WeaveError::CircularDependency { .. })));
    }

    #[test]
    fn test_restrict_to_service() {
        let temp = tempdir().unwrap();
        let mut cmd = command(TopologyFixture::layered(), GraphFormat::Text, temp.path());
        cmd.service = Some("users".to_string());

        let output = cmd.render(&WeaveConfig::default()).unwrap();
        assert_eq!(output, "database -> (none)\nusers -> database\n");
    }

    #[test]
    fn test_restrict_to_unknown_service() {
        let temp = tempdir().unwrap();
        let mut cmd = command(TopologyFixture::layered(), GraphFormat::Text, temp.path());
        cmd.service = Some("nope".to_string());

        let err = cmd.render(&WeaveConfig::default()).unwrap_err();
        assert!(err.to_string().contains("service [nope] not found"));
    }
}
