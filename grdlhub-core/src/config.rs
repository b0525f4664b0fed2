//! Global GrdlHub configuration.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_MAX_DESIGNATIONS, MAX_DESIGNATIONS_LIMIT};
use crate::error::{HubError, HubResult};

static DEFAULT_DATA_DIR: &str = "~/grdlhub";
static DEFAULT_LOG_LEVEL: &str = "warn";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_max_designations() -> usize {
    DEFAULT_MAX_DESIGNATIONS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Configuration at ~/.config/grdlhub/config.toml, overridable with
/// `GRDLHUB_*` environment variables (e.g. `GRDLHUB_DATA_DIR`).
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    /// Where the document store lives
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// IANA timezone used to decide what "today" is
    #[serde(default)]
    pub timezone: Option<String>,

    /// Designation cap for free-text titles
    #[serde(default = "default_max_designations")]
    pub default_max_designations: usize,

    /// Fallback log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            data_dir: default_data_dir(),
            timezone: None,
            default_max_designations: default_max_designations(),
            log_level: default_log_level(),
        }
    }
}

impl HubConfig {
    pub fn config_path() -> HubResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| HubError::Config("Could not determine config directory".into()))?
            .join("grdlhub");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, creating a commented-out default on first run.
    pub fn load() -> HubResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("GRDLHUB").try_parsing(true))
            .build()
            .map_err(|e| HubError::Config(e.to_string()))?
            .try_deserialize::<HubConfig>()
            .map_err(|e| HubError::Config(e.to_string()))?
            .validated()
    }

    /// Load from an explicit file only.
    pub fn load_from(path: &Path) -> HubResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()
            .map_err(|e| HubError::Config(e.to_string()))?
            .try_deserialize::<HubConfig>()
            .map_err(|e| HubError::Config(e.to_string()))?
            .validated()
    }

    fn validated(self) -> HubResult<Self> {
        if !(1..=MAX_DESIGNATIONS_LIMIT).contains(&self.default_max_designations) {
            return Err(HubError::Config(format!(
                "default_max_designations must be between 1 and {MAX_DESIGNATIONS_LIMIT}"
            )));
        }
        self.timezone()?;
        Ok(self)
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn timezone(&self) -> HubResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| HubError::Config(format!("Unknown timezone '{name}'")))
            })
            .transpose()
    }

    /// Today's date in the configured timezone (UTC if none).
    pub fn today(&self) -> HubResult<NaiveDate> {
        let now = Utc::now();
        Ok(match self.timezone()? {
            Some(tz) => now.with_timezone(&tz).date_naive(),
            None => now.date_naive(),
        })
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> HubResult<()> {
        let contents = format!(
            "\
# grdlhub configuration

# Where appointments, users and privileges are stored:
# data_dir = \"{DEFAULT_DATA_DIR}\"

# Timezone used for \"today\" (defaults to UTC):
# timezone = \"Europe/Berlin\"

# How many people may be designated when a title is not in the catalog:
# default_max_designations = {DEFAULT_MAX_DESIGNATIONS}

# Log filter used when RUST_LOG is not set:
# log_level = \"{DEFAULT_LOG_LEVEL}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HubError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| HubError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commented_default_config_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        HubConfig::create_default_config(&path).unwrap();

        let config = HubConfig::load_from(&path).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("~/grdlhub"));
        assert_eq!(config.default_max_designations, DEFAULT_MAX_DESIGNATIONS);
        assert_eq!(config.log_level, "warn");
        assert!(config.timezone.is_none());
    }

    #[test]
    fn test_reads_values_and_validates_timezone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/grdlhub\"\ntimezone = \"Europe/Amsterdam\"\ndefault_max_designations = 2\n",
        )
        .unwrap();

        let config = HubConfig::load_from(&path).unwrap();
        assert_eq!(config.data_path(), PathBuf::from("/srv/grdlhub"));
        assert_eq!(config.default_max_designations, 2);
        assert!(config.timezone().unwrap().is_some());

        std::fs::write(&path, "default_max_designations = 5\n").unwrap();
        assert!(matches!(
            HubConfig::load_from(&path),
            Err(HubError::Config(_))
        ));

        std::fs::write(&path, "timezone = \"Mars/Olympus\"\n").unwrap();
        assert!(matches!(
            HubConfig::load_from(&path),
            Err(HubError::Config(_))
        ));
    }
}
