//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/remedy/config.toml`.

use crate::recommender::DEFAULT_MAX_RESULTS;
use crate::session::SessionSettings;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub recommender: RecommenderConfig,

    #[serde(default)]
    pub conditions: ConditionsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding `catalog.json` and `interactions.csv`; the
    /// built-in catalog is used when unset
    #[serde(default)]
    pub dataset_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            dataset_dir: None,
        }
    }
}

impl DataConfig {
    pub fn users_dir(&self) -> PathBuf {
        self.data_dir.join("users")
    }
}

/// Session inactivity timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    #[serde(default = "default_warning_time_secs")]
    pub warning_time_secs: u64,

    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            warning_time_secs: default_warning_time_secs(),
            login_path: default_login_path(),
        }
    }
}

impl SessionConfig {
    pub fn to_settings(&self) -> Result<SessionSettings> {
        let seconds = |secs: u64| {
            i64::try_from(secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .ok_or_else(|| Error::Config(format!("session duration {}s out of range", secs)))
        };
        Ok(SessionSettings::new(
            seconds(self.inactivity_timeout_secs)?,
            seconds(self.warning_time_secs)?,
        )?
        .with_login_path(self.login_path.clone()))
    }
}

/// Recommendation parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommenderConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

/// Extra curated condition → ailment terms, keyed by condition id
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ConditionsConfig {
    #[serde(default)]
    pub aliases: HashMap<String, Vec<String>>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(std::env::temp_dir)
    });
    base.join("remedy")
}

fn default_inactivity_timeout_secs() -> u64 {
    30 * 60
}

fn default_warning_time_secs() -> u64 {
    5 * 60
}

fn default_login_path() -> String {
    "/login".into()
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<()> {
        self.session.to_settings()?;
        if !(1..=DEFAULT_MAX_RESULTS).contains(&self.recommender.max_results) {
            return Err(Error::Config(format!(
                "recommender.max_results must be between 1 and {}, got {}",
                DEFAULT_MAX_RESULTS, self.recommender.max_results
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(std::env::temp_dir)
        });
        base.join("remedy").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
