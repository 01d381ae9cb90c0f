use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::index::{DatasetFormat, FileSource};

/// Environment variable consulted when neither a flag nor the config file
/// names the dataset.
pub const DATASET_ENV: &str = "GEORESOLVE_DATASET";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatasetConfig {
    /// Dataset file or directory
    pub path: Option<PathBuf>,
    /// Force a format instead of detecting it from file extensions
    pub format: Option<DatasetFormat>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the dataset source. Precedence: `cli_path`, config file, then
    /// the `GEORESOLVE_DATASET` environment variable.
    pub fn dataset_source(&self, cli_path: Option<PathBuf>) -> Result<FileSource> {
        let path = cli_path
            .or_else(|| self.dataset.path.clone())
            .or_else(|| std::env::var_os(DATASET_ENV).map(PathBuf::from))
            .with_context(|| {
                format!(
                    "No dataset configured: pass --dataset, set [dataset].path or {}",
                    DATASET_ENV
                )
            })?;
        Ok(FileSource::new(path).with_format(self.dataset.format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [dataset]
            path = "data/geo.csv.gz"
            format = "csv"

            [server]
            listen = "127.0.0.1:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.dataset.path, Some(PathBuf::from("data/geo.csv.gz")));
        assert_eq!(config.dataset.format, Some(DatasetFormat::Csv));
        assert_eq!(config.server.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.dataset.path.is_none());
        assert_eq!(config.server.listen, "0.0.0.0:3000");
    }

    #[test]
    fn test_cli_path_wins() {
        let config: Config = toml::from_str("[dataset]\npath = \"from-file.csv\"\n").unwrap();
        let source = config
            .dataset_source(Some(PathBuf::from("from-cli.jsonl")))
            .unwrap();
        assert_eq!(source.path(), Path::new("from-cli.jsonl"));

        let source = config.dataset_source(None).unwrap();
        assert_eq!(source.path(), Path::new("from-file.csv"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("georesolve.toml");
        std::fs::write(&path, "[dataset]\nformat = \"jsonl\"\n").unwrap();

        let config = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.dataset.format, Some(DatasetFormat::Jsonl));
        assert!(Config::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
