//! TOML configuration for `padnorm`
//!
//! ```toml
//! [session]
//! stats_interval_secs = 10
//!
//! [session.detection]
//! xbox_one = ["Xbox Wireless"]
//!
//! [session.ps3.trigger]
//! raw_min = 0
//! raw_max = 255
//! raw_deadband = 4
//! out_min = 0.0
//! out_max = 100.0
//!
//! [cli]
//! read_interval_ms = 100
//! ```
//!
//! Every section and field is optional. A missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::controller::scaling::ScalingError;
use crate::controller::session::SessionSettings;

const CONFIG_DIR: &str = "padnorm";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub session: SessionSettings,
    pub cli: CliConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// How often the CLI prints a snapshot
    pub read_interval_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            read_interval_ms: 100,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid scaling override: {0}")]
    Invalid(#[from] ScalingError),
}

impl Config {
    /// `<config dir>/padnorm/config.toml`, or `./padnorm/config.toml` without one
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.session.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !tokio::fs::try_exists(path).await? {
            info!("Config file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Writes the defaults to `path` unless a file is already there
    pub async fn ensure_default(path: &Path) -> Result<(), ConfigError> {
        if tokio::fs::try_exists(path).await? {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(&Self::default())?;
        tokio::fs::write(path, content).await?;
        info!("Created default config at {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::profile::ControllerFamily;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cli.read_interval_ms, 100);
        assert_eq!(config.session.stats_interval_secs, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [session.detection]
            ps3 = ["Sony Computer Entertainment"]

            [session.xbox_one.joystick]
            raw_min = -32768
            raw_max = 32767
            raw_deadband = 4000
            out_min = -1.0
            out_max = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(config.cli, CliConfig::default());
        assert_eq!(
            config.session.detection.detect("Sony Computer Entertainment Wireless"),
            Some(ControllerFamily::Ps3)
        );
        let profile = config.session.profile_for(ControllerFamily::XboxOne);
        assert_eq!(profile.joystick_scaling().raw_deadband, 4000);
        assert_eq!(profile.joystick_scaling().scale(32767), 1.0);
        // the untouched trigger keeps the built-in constants
        assert_eq!(profile.trigger_scaling().raw_max, 255);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let err = Config::parse(
            r#"
            [session.ps3.trigger]
            raw_min = 0
            raw_max = 255
            raw_deadband = -1
            out_min = 0.0
            out_max = 100.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ScalingError::NegativeDeadband(-1))));
    }

    #[test]
    fn syntax_errors_surface_as_parse_errors() {
        assert!(matches!(Config::parse("[cli"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::parse("[cli]\nread_interval_ms = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_loads_defaults_and_ensure_default_writes_one() {
        let dir = std::env::temp_dir().join(format!("padnorm-config-test-{}", std::process::id()));
        let path = dir.join(CONFIG_FILE);
        let _ = tokio::fs::remove_dir_all(&dir).await;

        assert_eq!(Config::load(&path).await.unwrap(), Config::default());

        Config::ensure_default(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(Config::load(&path).await.unwrap(), Config::default());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_default_keeps_an_existing_file() {
        let dir = std::env::temp_dir().join(format!("padnorm-config-keep-{}", std::process::id()));
        let path = dir.join(CONFIG_FILE);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(&path, "[cli]\nread_interval_ms = 250\n").await.unwrap();

        Config::ensure_default(&path).await.unwrap();
        assert_eq!(Config::load(&path).await.unwrap().cli.read_interval_ms, 250);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
