mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

pub const API_KEY_ENV: &str = "GENAI_API_KEY";
pub const MODEL_NAME_ENV: &str = "GENAI_MODEL_NAME";

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let config = match tokio::fs::read_to_string(&config_path).await {
        Ok(config_str) => from_yaml_str(&config_str)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No configuration file at {}, using defaults", config_path);
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    let config = apply_env_overrides(config, |name| env::var(name).ok());
    validate(&config)?;

    Ok(config)
}

pub fn from_yaml_str(config_str: &str) -> Result<Config> {
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

/// Environment variables win over the file.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(api_key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
        config.gemini.api_key = api_key;
    }
    if let Some(model) = lookup(MODEL_NAME_ENV).filter(|v| !v.is_empty()) {
        config.gemini.model = model;
    }
    config
}

pub fn validate(config: &Config) -> Result<()> {
    if config.gemini.api_key.trim().is_empty() {
        return Err(Error::config(format!(
            "Gemini API key is not set; export {} or set gemini.api_key",
            API_KEY_ENV
        )));
    }
    if config.gemini.model.trim().is_empty() {
        return Err(Error::config("gemini.model must not be empty"));
    }
    if config.gemini.poll_interval_secs == 0 {
        return Err(Error::config("gemini.poll_interval_secs must be positive"));
    }
    Ok(())
}
