pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing straight at a settings file
pub const CONFIG_PATH_ENV: &str = "CLOUDKEEL_CONFIG_PATH";

const APP_DIR: &str = "cloudkeel";
const PROJECT_DIR: &str = ".cloudkeel";
const GLOBAL_FILE: &str = "cloudkeel.yaml";
const CANDIDATES: [&str; 4] = [
    "cloudkeel.local.yaml",
    ".cloudkeel.local.yaml",
    "cloudkeel.yaml",
    ".cloudkeel.yaml",
];

/// Client settings
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Network the balancer members are resolved in; unset means every network
    pub network_id: Option<String>,

    pub poll: PollSettings,

    pub limits: LimitSettings,
}

/// Job polling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,

    /// Unset waits for jobs forever
    pub max_wait_secs: Option<u64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 3000,
            max_wait_secs: None,
        }
    }
}

/// Page sizes used when listing remote resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub hosts: u32,
    pub listeners: u32,
    pub members: u32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            hosts: 500,
            listeners: 100,
            members: 500,
        }
    }
}

impl Settings {
    /// Parse settings from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // serde_yaml rejects an empty document
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll.interval_ms must be greater than 0".to_string(),
            ));
        }
        let limits = [
            ("limits.hosts", self.limits.hosts),
            ("limits.listeners", self.limits.listeners),
            ("limits.members", self.limits.members),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        if self.network_id.as_deref() == Some("") {
            return Err(ConfigError::Invalid(
                "network_id must not be empty; omit it to search every network".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global settings directory (`~/.config/cloudkeel` on Linux)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join(APP_DIR);
    Ok(config_dir)
}

/// Locate the settings file
///
/// Search order:
/// 1. `CLOUDKEEL_CONFIG_PATH`
/// 2. current directory: cloudkeel.local.yaml, .cloudkeel.local.yaml, cloudkeel.yaml, .cloudkeel.yaml
/// 3. `./.cloudkeel/` with the same names
/// 4. `~/.config/cloudkeel/cloudkeel.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(PROJECT_DIR);
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join(GLOBAL_FILE);
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Find and parse the settings file, falling back to defaults when there is none
pub fn load_settings() -> Result<Settings> {
    match find_config_file() {
        Ok(path) => Settings::from_path(path),
        Err(ConfigError::ConfigFileNotFound) => Ok(Settings::default()),
        Err(e) => Err(e),
    }
}
