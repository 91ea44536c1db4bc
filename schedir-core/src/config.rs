//! Global schedir configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Weekday;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SchedirError, SchedirResult};
use crate::view::ViewName;

static DEFAULT_STORE_DIR: &str = "~/schedule";
static DEFAULT_LOCALE: &str = "pl-PL";
static DEFAULT_WEEK_START: &str = "monday";
static DEFAULT_STORE_TIMEOUT: &str = "10s";

fn default_store_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_week_start() -> String {
    DEFAULT_WEEK_START.to_string()
}

fn default_store_timeout() -> String {
    DEFAULT_STORE_TIMEOUT.to_string()
}

/// Global configuration at ~/.config/schedir/config.toml
///
/// Every key can be overridden from the environment with a `SCHEDIR_`
/// prefix, e.g. `SCHEDIR_LOCALE=en-GB`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SchedirConfig {
    /// Where event documents are stored.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Locale tag for date/time formatting in the rendering surface.
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default)]
    pub default_view: ViewName,

    #[serde(default = "default_week_start")]
    pub week_start: String,

    /// How long a single store call may take, e.g. "10s" or "500ms".
    #[serde(default = "default_store_timeout")]
    pub store_timeout: String,
}

impl Default for SchedirConfig {
    fn default() -> Self {
        SchedirConfig {
            store_dir: default_store_dir(),
            locale: default_locale(),
            default_view: ViewName::default(),
            week_start: default_week_start(),
            store_timeout: default_store_timeout(),
        }
    }
}

impl SchedirConfig {
    pub fn config_path() -> SchedirResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SchedirError::Config("Could not determine config directory".into()))?
            .join("schedir");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented default file on first run.
    pub fn load() -> SchedirResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SchedirResult<Self> {
        let config: SchedirConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SCHEDIR"))
            .build()
            .map_err(|e| SchedirError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SchedirError::Config(e.to_string()))?;

        // Surface bad values at load time rather than on first use.
        config.week_start()?;
        config.store_timeout()?;

        Ok(config)
    }

    /// The store directory with `~` expanded.
    pub fn store_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.store_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn week_start(&self) -> SchedirResult<Weekday> {
        self.week_start.parse::<Weekday>().map_err(|_| {
            SchedirError::Config(format!("Invalid week_start '{}'", self.week_start))
        })
    }

    pub fn store_timeout(&self) -> SchedirResult<Duration> {
        humantime::parse_duration(&self.store_timeout).map_err(|e| {
            SchedirError::Config(format!(
                "Invalid store_timeout '{}': {}",
                self.store_timeout, e
            ))
        })
    }

    /// Save the current config to `path`.
    pub fn save(&self, path: &Path) -> SchedirResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SchedirError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SchedirError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| SchedirError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SchedirResult<()> {
        let contents = format!(
            "\
# schedir configuration

# Where event documents are stored:
# store_dir = \"{}\"

# Locale used when formatting dates and times:
# locale = \"{}\"

# View shown by `schedir view` (day, week or month):
# default_view = \"week\"

# First day of the week:
# week_start = \"{}\"

# Give up on a storage call after this long:
# store_timeout = \"{}\"
",
            DEFAULT_STORE_DIR, DEFAULT_LOCALE, DEFAULT_WEEK_START, DEFAULT_STORE_TIMEOUT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SchedirError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SchedirError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
