//! Generic TOML parsing with file-path context.
//!
//! Error messages name the file and whether reading or parsing failed:
//!
//! ```text
//! Failed to parse config file: /path/to/weave.toml
//! Caused by:
//!     invalid type: string "yes", expected a boolean
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML file into any deserializable type.
///
/// # Examples
///
/// ```rust,no_run
/// use weave::config::{parse_config, WeaveConfig};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config: WeaveConfig = parse_config(Path::new("weave.toml"))?;
/// println!("strict lookups: {}", config.strict_lookups);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or does
/// not match the shape of `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, serde::Deserialize)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn test_parse_config() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sample.toml");
        std::fs::write(&path, "name = \"graph\"\nvalue = 3\n").unwrap();

        let sample: Sample = parse_config(&path).unwrap();
        assert_eq!(sample.name, "graph");
        assert_eq!(sample.value, 3);
    }

    #[test]
    fn test_parse_config_missing_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing.toml");

        let err = parse_config::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_parse_config_invalid_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.toml");
        std::fs::write(&path, "name = ").unwrap();

        let err = parse_config::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
