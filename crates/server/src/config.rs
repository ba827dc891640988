//! Server and build settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared::{INTAKE_DIR, OUTPUT_BUNDLE_PATH};
use thiserror::Error;

/// Path to a JSON config file
pub const CONFIG_ENV: &str = "HATBUNDLE_CONFIG";
pub const BIND_ENV: &str = "HATBUNDLE_BIND";
pub const PROJECT_ENV: &str = "HATBUNDLE_PROJECT";
pub const TOOL_ENV: &str = "HATBUNDLE_TOOL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What to do with a build request while another build is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Wait for the running build to finish
    #[default]
    Queue,
    /// Fail immediately
    Reject,
}

/// External compilation tool invocation.
///
/// The six positional build arguments are inserted between `leading_args`
/// and `trailing_args`, so an editor-hosted tool can be driven with e.g.
/// `-batchmode -projectPath <dir> -executeMethod <method>` before and
/// `-quit -logFile <file>` after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub program: PathBuf,
    pub leading_args: Vec<String>,
    pub trailing_args: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("bundle-tool"),
            leading_args: Vec::new(),
            trailing_args: Vec::new(),
        }
    }
}

/// Build orchestration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Working directory of the tool
    pub project_dir: PathBuf,
    /// Overrides `<project_dir>/Assets/Uploads`
    pub intake_dir: Option<PathBuf>,
    /// Overrides `<project_dir>/Assets/StreamingAssets/AssetBundles/hat`
    pub output_path: Option<PathBuf>,
    /// Where finished bundles are kept, one file per build
    pub bundles_dir: PathBuf,
    pub tool: ToolConfig,
    pub timeout_secs: u64,
    pub busy_policy: BusyPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("project"),
            intake_dir: None,
            output_path: None,
            bundles_dir: PathBuf::from("server/bundles"),
            tool: ToolConfig::default(),
            timeout_secs: 300,
            busy_policy: BusyPolicy::default(),
        }
    }
}

impl BuildConfig {
    pub fn intake_dir(&self) -> PathBuf {
        self.intake_dir
            .clone()
            .unwrap_or_else(|| self.project_dir.join(INTAKE_DIR))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.project_dir.join(OUTPUT_BUNDLE_PATH))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// All server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Static files (preview UI)
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub build: BuildConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            public_dir: PathBuf::from("public"),
            max_upload_bytes: 64 * 1024 * 1024,
            build: BuildConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `HATBUNDLE_CONFIG` (if set), then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
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

    fn apply_env(&mut self) {
        if let Ok(bind) = std::env::var(BIND_ENV) {
            self.bind_addr = bind;
        }
        if let Some(project) = std::env::var_os(PROJECT_ENV) {
            self.build.project_dir = PathBuf::from(project);
        }
        if let Some(tool) = std::env::var_os(TOOL_ENV) {
            self.build.tool.program = PathBuf::from(tool);
        }
    }
}
