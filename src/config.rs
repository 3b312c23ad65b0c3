//! Run configuration: dataset location, split knobs and engine overrides.
//!
//! Values come from built-in defaults, an optional TOML file and finally the
//! command line. Engine overrides are typed patches, so an unknown key fails
//! while the file is loaded rather than when an engine reads it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::dataset::{CachePolicy, DEFAULT_ROW_LIMIT, DEFAULT_TEST_FRACTION, PrepareOptions};
use crate::engine::{CatPatch, DEFAULT_TREES, LgbPatch, XgbPatch};

/// File looked up in the application directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "flightbench.toml";
/// Environment variable that points at the dataset storage root.
pub const DATA_ENV_VAR: &str = "FLIGHTBENCH_DATA";

/// Errors that may occur while loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The config file is not valid TOML or contains unknown keys.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    /// The default storage root could not be resolved.
    #[error("Storage root unavailable: {0}")]
    Dirs(#[from] app_dirs::AppDirError),
}

/// Per-engine parameter replacements applied on top of every benchmark of that engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOverrides {
    pub xgboost: XgbPatch,
    pub lightgbm: LgbPatch,
    pub catboost: CatPatch,
}

/// Settings for one `prepare` or `run` invocation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Directory holding the raw source file and its cache artifact.
    pub storage_root: Option<PathBuf>,
    pub row_limit: usize,
    pub test_fraction: f64,
    pub shuffle: bool,
    pub n_trees: usize,
    /// CPU threads handed to engines; all available cores when unset.
    pub threads: Option<usize>,
    pub cache_policy: CachePolicy,
    pub overrides: EngineOverrides,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            storage_root: None,
            row_limit: DEFAULT_ROW_LIMIT,
            test_fraction: DEFAULT_TEST_FRACTION,
            shuffle: true,
            n_trees: DEFAULT_TREES,
            threads: None,
            cache_policy: CachePolicy::default(),
            overrides: EngineOverrides::default(),
        }
    }
}

/// Subset of [`RunConfig`] echoed into benchmark reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSummary {
    pub storage_root: Option<PathBuf>,
    pub row_limit: usize,
    pub test_fraction: f64,
    pub shuffle: bool,
    pub n_trees: usize,
    pub threads: usize,
    pub cache_policy: CachePolicy,
}

impl RunConfig {
    /// Parse a TOML config file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `flightbench.toml` from the application directory, or defaults when absent.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!("Loading run config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::Invalid {
                key: "test_fraction",
                reason: format!("{} is not strictly between 0 and 1", self.test_fraction),
            });
        }
        if self.row_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "row_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.n_trees == 0 {
            return Err(ConfigError::Invalid {
                key: "n_trees",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid {
                key: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Explicit root, then `FLIGHTBENCH_DATA`, then the application data directory.
    pub fn resolved_storage_root(&self) -> Result<PathBuf, ConfigError> {
        if let Some(root) = &self.storage_root {
            return Ok(root.clone());
        }
        if let Ok(root) = std::env::var(DATA_ENV_VAR) {
            if !root.trim().is_empty() {
                return Ok(PathBuf::from(root));
            }
        }
        Ok(app_dirs::data_dir()?)
    }

    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn prepare_options(&self) -> PrepareOptions {
        PrepareOptions {
            row_limit: self.row_limit,
            test_fraction: self.test_fraction,
            shuffle: self.shuffle,
            cache_policy: self.cache_policy,
        }
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            storage_root: self.storage_root.clone(),
            row_limit: self.row_limit,
            test_fraction: self.test_fraction,
            shuffle: self.shuffle,
            n_trees: self.n_trees,
            threads: self.effective_threads(),
            cache_policy: self.cache_policy,
        }
    }
}
