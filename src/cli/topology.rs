//! Declarative service topologies.
//!
//! The `weave` binary does not run user code. Instead it reads a TOML file
//! that declares services and their dependencies, registers one provider per
//! declared service, and builds the container so that the real build engine
//! records the graph:
//!
//! ```toml
//! [services.database]
//!
//! [services.users]
//! depends_on = ["database"]
//!
//! [services.cache]
//! fail = true
//! ```
//!
//! Each provider requests its `depends_on` names in order through the
//! resolver, then fails if `fail = true`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{WeaveConfig, parse_config};
use crate::container::{Container, ServiceRef};

/// A set of declared services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Topology {
    /// Declared services by name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
}

/// One declared service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSpec {
    /// Services requested by this service's provider, in request order.
    pub depends_on: Vec<String>,
    /// Make the provider fail after requesting its dependencies.
    pub fail: bool,
}

/// Context shared by all topology providers.
#[derive(Debug, Clone)]
pub struct TopologyContext {
    /// File the topology was read from.
    pub source: PathBuf,
}

/// What a topology provider builds.
#[derive(Debug)]
pub struct Node {
    /// Service name this node was built for.
    pub name: String,
    /// Slots of the declared dependencies, in `depends_on` order.
    pub dependencies: Vec<ServiceRef>,
}

impl Topology {
    /// Read a topology file.
    pub fn load(path: &Path) -> Result<Self> {
        parse_config(path).with_context(|| format!("Failed to load topology {}", path.display()))
    }

    /// Parse topology TOML from a string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse topology")
    }

    /// Register one provider per declared service.
    ///
    /// The container is returned unbuilt.
    pub fn into_container(self, source: PathBuf, config: WeaveConfig) -> Container<TopologyContext> {
        let container = Container::with_config(config);
        container.set_context(TopologyContext {
            source,
        });

        for (name, spec) in self.services {
            let node_name = name.clone();
            container.provide(name, move |ctx: &TopologyContext, resolver| {
                let mut dependencies = Vec::with_capacity(spec.depends_on.len());
                for dep in &spec.depends_on {
                    dependencies.push(resolver.get_service(dep)?);
                }
                if spec.fail {
                    anyhow::bail!("declared with fail = true in {}", ctx.source.display());
                }
                Ok(Node {
                    name: node_name.clone(),
                    dependencies,
                })
            });
        }

        container
    }
}

/// Load the topology at `path` and build it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the build
/// fails. Build failures carry the underlying [`WeaveError`](crate::core::WeaveError).
pub fn build_topology(path: &Path, config: &WeaveConfig) -> Result<Container<TopologyContext>> {
    let topology = Topology::load(path)?;
    debug!("Loaded {} services from {}", topology.services.len(), path.display());

    let container = topology.into_container(path.to_path_buf(), config.clone());
    container.build()?;
    Ok(container)
}
