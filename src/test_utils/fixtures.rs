//! Sample topology files for CLI and container tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Test fixture for creating topology TOML files
#[derive(Clone, Debug)]
pub struct TopologyFixture {
    pub content: String,
    pub name: String,
}

impl TopologyFixture {
    /// Layered services without cycles: database <- users <- api
    pub fn layered() -> Self {
        Self {
            name: "layered".to_string(),
            content: r#"
[services.database]

[services.users]
depends_on = ["database"]

[services.api]
depends_on = ["users", "database"]
"#
            .trim()
            .to_string(),
        }
    }

    /// Two cycles sharing one service: a -> b -> c -> a and b -> d -> b
    pub fn cyclic() -> Self {
        Self {
            name: "cyclic".to_string(),
            content: r#"
[services.a]
depends_on = ["b"]

[services.b]
depends_on = ["c", "d"]

[services.c]
depends_on = ["a"]

[services.d]
depends_on = ["b"]
"#
            .trim()
            .to_string(),
        }
    }

    /// A service whose provider fails, and one that depends on it
    pub fn failing() -> Self {
        Self {
            name: "failing".to_string(),
            content: r#"
[services.cache]
fail = true

[services.web]
depends_on = ["cache"]
"#
            .trim()
            .to_string(),
        }
    }

    /// A dependency on a service that is never declared
    pub fn missing_dependency() -> Self {
        Self {
            name: "missing_dependency".to_string(),
            content: r#"
[services.web]
depends_on = ["ghost"]
"#
            .trim()
            .to_string(),
        }
    }

    /// Not valid TOML
    pub fn invalid_syntax() -> Self {
        Self {
            name: "invalid_syntax".to_string(),
            content: "[services.web\ndepends_on = [".to_string(),
        }
    }

    /// Write the fixture to `<dir>/<name>.toml`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.toml", self.name));
        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        Ok(path)
    }
}
