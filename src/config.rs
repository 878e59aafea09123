use crate::domain::Project;
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "monorel.toml";

/// Represents the complete configuration for monorel.
///
/// Lists the workspace projects and controls where changesets live and how
/// release tags leave the machine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub projects: Vec<Project>,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_changeset_dir() -> PathBuf {
    PathBuf::from(".changeset")
}

/// Where release tags are pushed and where pending changesets are read from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_changeset_dir")]
    pub changeset_dir: PathBuf,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            remote: default_remote(),
            changeset_dir: default_changeset_dir(),
        }
    }
}

/// Configuration for behavior customization.
///
/// Controls runtime behavior without affecting version resolution.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BehaviorConfig {
    /// Push newly created tags to `release.remote`
    #[serde(default)]
    pub push_tags: bool,
}

impl Config {
    /// Parse a TOML document and validate it
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ReleaseError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the release engine cannot act on
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for project in &self.projects {
            if project.name.is_empty() {
                return Err(ReleaseError::config("project name must not be empty"));
            }
            // A leading '@' is an npm scope; anywhere else it would split the tag.
            let unscoped = project.name.strip_prefix('@').unwrap_or(&project.name);
            if unscoped.is_empty() || unscoped.contains('@') || unscoped.contains('*') {
                return Err(ReleaseError::config(format!(
                    "project name '{}' must not contain '*' or a '@' past the scope",
                    project.name
                )));
            }
            if !seen.insert(project.name.as_str()) {
                return Err(ReleaseError::config(format!(
                    "project '{}' is declared twice",
                    project.name
                )));
            }
        }
        if self.release.remote.trim().is_empty() {
            return Err(ReleaseError::config("release.remote must not be empty"));
        }
        Ok(())
    }

    /// Look up a configured project by name
    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ReleaseError::not_found(format!("Project '{}' is not configured", name)))
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `monorel.toml` in current directory
/// 3. `monorel.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err(Config)` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    load_config_in(config_path, Path::new("."))
}

/// Same lookup as [load_config], with step 2 searching `root` instead of
/// the current directory
pub fn load_config_in(config_path: Option<&str>, root: &Path) -> Result<Config> {
    let local = root.join(CONFIG_FILE_NAME);
    let path = if let Some(path) = config_path {
        PathBuf::from(path)
    } else if local.exists() {
        local
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("cannot read '{}': {}", path.display(), e))
    })?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Config::from_toml(&content)
}
