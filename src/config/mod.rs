//! Policy configuration loading.
//!
//! Configuration comes from a YAML file in the repository root, then
//! environment overrides (with fallback to the user settings file), then
//! command-line flags applied by the caller.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::policy::PolicyConfig;
use crate::utils::Settings;

/// Configuration file looked up in the repository root.
pub const DEFAULT_CONFIG_FILE: &str = ".commit-inspect.yaml";

/// Comma-separated list of active CI providers.
pub const PROVIDERS_ENV: &str = "COMMIT_INSPECT_CI_PROVIDERS";

/// `true` or `false`; overrides `allow_ci_skip`.
pub const ALLOW_CI_SKIP_ENV: &str = "COMMIT_INSPECT_ALLOW_CI_SKIP";

/// Loads the policy configuration for a repository.
pub struct ConfigManager {
    config_path: PathBuf,
    settings_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a manager reading the default file under `repo_root`
    pub fn new(repo_root: &Path) -> Self {
        Self {
            config_path: repo_root.join(DEFAULT_CONFIG_FILE),
            settings_path: None,
        }
    }

    /// Create a manager with a custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            settings_path: None,
        }
    }

    /// Read environment fallbacks from `path` instead of the user settings file
    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration file; a missing file yields defaults
    pub fn load_file(&self) -> Result<PolicyConfig, ConfigError> {
        let path = &self.config_path;
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(PolicyConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        // An empty file deserializes to null, which means "all defaults".
        if content.trim().is_empty() {
            return Ok(PolicyConfig::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load the configuration file and apply environment overrides
    ///
    /// A settings file that exists but cannot be loaded is an error.
    pub fn load(&self) -> Result<PolicyConfig, ConfigError> {
        let mut config = self.load_file()?;
        let settings = self.load_settings()?;
        apply_overrides(&mut config, |key| settings.get_env_var(key))?;
        Ok(config)
    }

    fn load_settings(&self) -> Result<Settings, ConfigError> {
        let settings = match &self.settings_path {
            Some(path) => Settings::load_from_path(path),
            None => Settings::load(),
        };
        settings.map_err(|e| ConfigError::Settings {
            detail: format!("{e:#}"),
        })
    }
}

/// Applies environment-style overrides through `lookup`.
pub fn apply_overrides<F>(config: &mut PolicyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(providers) = lookup(PROVIDERS_ENV) {
        config.ci_providers_active = parse_list(&providers);
    }

    if let Some(value) = lookup(ALLOW_CI_SKIP_ENV) {
        config.allow_ci_skip = parse_bool(ALLOW_CI_SKIP_ENV, &value)?;
    }

    Ok(())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
