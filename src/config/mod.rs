//! Container and rendering configuration.
//!
//! Configuration is optional: every field has a default, and an empty file is
//! a valid configuration. The `weave` binary reads it from `--config <file>`.
//!
//! ```toml
//! # Fail lookups of services that have not been built yet
//! strict_lookups = true
//!
//! # Record each dependency edge once per service
//! dedupe_edges = true
//!
//! [render]
//! rankdir = "LR"
//! node_shape = "ellipse"
//! ```

mod parser;

pub use parser::parse_config;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{DEFAULT_NODE_SHAPE, DEFAULT_RANKDIR};

/// Settings for a [`Container`](crate::container::Container).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct WeaveConfig {
    /// Fail `get_service` for registered services that are not built yet.
    ///
    /// When `false` (the default) such lookups return the empty placeholder slot.
    pub strict_lookups: bool,

    /// Record a dependency edge only the first time a provider requests it.
    ///
    /// Repeated requests never change cycle results; this only keeps the
    /// adjacency lists free of duplicates.
    pub dedupe_edges: bool,

    /// Graphviz output settings.
    pub render: RenderOptions,
}

/// Graphviz output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Graph layout direction (`TB`, `LR`, `BT`, `RL`).
    pub rankdir: String,
    /// Node shape attribute.
    pub node_shape: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            rankdir: DEFAULT_RANKDIR.to_string(),
            node_shape: DEFAULT_NODE_SHAPE.to_string(),
        }
    }
}

impl WeaveConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if
    /// `render.rankdir` is not a Graphviz direction.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Self = parse_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise return the defaults.
    ///
    /// # Errors
    ///
    /// As [`load_from`](Self::load_from).
    pub fn load_with_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::ConfigError`](crate::core::WeaveError::ConfigError)
    /// for an unknown `rankdir` or a `node_shape` that is not a plain
    /// Graphviz identifier.
    pub fn validate(&self) -> Result<()> {
        const DIRECTIONS: [&str; 4] = ["TB", "LR", "BT", "RL"];
        if !DIRECTIONS.contains(&self.render.rankdir.as_str()) {
            return Err(crate::core::WeaveError::ConfigError {
                message: format!(
                    "render.rankdir must be one of {}, got '{}'",
                    DIRECTIONS.join(", "),
                    self.render.rankdir
                ),
            }
            .into());
        }
        if !is_shape_name(&self.render.node_shape) {
            return Err(crate::core::WeaveError::ConfigError {
                message: format!(
                    "render.node_shape must be a Graphviz shape name (letters, digits, '_'), got '{}'",
                    self.render.node_shape
                ),
            }
            .into());
        }
        Ok(())
    }
}

/// Graphviz shape names are bare identifiers such as `box` or `box3d`.
pub(crate) fn is_shape_name(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
