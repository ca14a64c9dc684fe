use super::schema::SlidePilotConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub const ENV_EMAIL: &str = "SLIDEPILOT_EMAIL";
pub const ENV_PASSWORD: &str = "SLIDEPILOT_PASSWORD";
pub const ENV_CHAT_URL: &str = "SLIDEPILOT_CHAT_URL";
pub const ENV_DECK_URL: &str = "SLIDEPILOT_DECK_URL";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from an explicit path if given, else from default locations,
    /// then apply environment overrides.
    pub async fn load(explicit: Option<&Path>) -> Result<SlidePilotConfig, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path).await?,
            None => Self::load_default().await?,
        };
        apply_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from default locations:
    /// 1. ./slidepilot.yaml
    /// 2. ~/.slidepilot/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<SlidePilotConfig, ConfigError> {
        let local_config = PathBuf::from("./slidepilot.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".slidepilot").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(SlidePilotConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<SlidePilotConfig, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: SlidePilotConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Overlay values from `lookup` (normally the process environment). Empty
/// values are ignored.
pub fn apply_overrides<F>(config: &mut SlidePilotConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(email) = get(ENV_EMAIL) {
        config.credentials.email = Some(email);
    }
    if let Some(password) = get(ENV_PASSWORD) {
        config.credentials.password = Some(password);
    }
    if let Some(url) = get(ENV_CHAT_URL) {
        config.targets.chat_url = url;
    }
    if let Some(url) = get(ENV_DECK_URL) {
        config.targets.deck_url = url;
    }
}
