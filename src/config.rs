// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("studymate");

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load the config file, creating it with defaults on first run, then apply
/// the `GEMINI_API_KEY` override.
pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&get_config_path()?)?;
    apply_env_override(&mut config, std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_config = AppConfig::default();
        save_config_to(path, &default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, contents).context("Failed to write config file")?;

    Ok(())
}

fn apply_env_override(config: &mut AppConfig, api_key: Option<String>) {
    if let Some(key) = api_key.filter(|key| !key.trim().is_empty()) {
        config.api_key = key.trim().to_string();
    }
}

/// Fail early with a useful message when there is no key to authenticate with.
pub fn ensure_api_key(config: &AppConfig) -> Result<()> {
    if config.api_key.trim().is_empty() {
        let path = get_config_path()
            .map_or_else(|_| "config.toml".to_string(), |p| p.display().to_string());
        anyhow::bail!(
            "No Gemini API key configured. Set api_key in {path} or export {API_KEY_ENV}."
        );
    }
    Ok(())
}
