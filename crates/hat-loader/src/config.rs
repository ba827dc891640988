//! Loader settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path to a JSON settings file
pub const CONFIG_ENV: &str = "HAT_LOADER_CONFIG";
/// Overrides `bundles_dir`
pub const BUNDLES_ENV: &str = "HAT_LOADER_BUNDLES";

/// Named path from the character root to the hat anchor
pub const DEFAULT_ATTACH_PATH: [&str; 8] =
    ["Scout", "Armature", "Hip", "Mid", "AimJoint", "Torso", "Head", "Hat"];

/// Shader resolvable in the host at runtime
pub const DEFAULT_SHADER: &str = "W/Character";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory scanned for bundles
    pub bundles_dir: PathBuf,
    /// Shader bound to every injected hat
    pub shader: String,
    /// Child names from the entity root to the hat anchor
    pub attach_path: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            bundles_dir: PathBuf::from("hatsbundles"),
            shader: DEFAULT_SHADER.to_string(),
            attach_path: DEFAULT_ATTACH_PATH.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LoaderConfig {
    /// Load settings from `HAT_LOADER_CONFIG`, or defaults if unset or unreadable
    pub fn load() -> Self {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_file(Path::new(&path)).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "using default loader settings");
                Self::default()
            }),
            None => Self::default(),
        };
        if let Some(dir) = std::env::var_os(BUNDLES_ENV) {
            config.bundles_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.shader, "W/Character");
        assert_eq!(config.attach_path.len(), 8);
        assert_eq!(config.attach_path.first().map(String::as_str), Some("Scout"));
        assert_eq!(config.attach_path.last().map(String::as_str), Some("Hat"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.json");
        std::fs::write(&path, r#"{"bundles_dir":"plugins/hats"}"#).unwrap();

        let config = LoaderConfig::load_file(&path).unwrap();
        assert_eq!(config.bundles_dir, PathBuf::from("plugins/hats"));
        assert_eq!(config.shader, DEFAULT_SHADER);
    }

    #[test]
    fn test_load_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(LoaderConfig::load_file(&missing), Err(ConfigError::Read { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ shader: ").unwrap();
        match LoaderConfig::load_file(&broken) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, broken),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
