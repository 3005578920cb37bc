use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::models;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API token for the Puter endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Base URL of the Puter API
    pub base_url: String,

    /// Model used when no override is given
    pub default_model: String,

    /// System prompt forwarded with every call when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Per-request timeout in seconds; unset means calls run to completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Puterchat home directory
    #[serde(skip)]
    pub puterchat_home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            api_token: None,
            base_url: "https://api.puter.com".to_string(),
            default_model: models::DEFAULT_MODEL.to_string(),
            system_prompt: None,
            request_timeout_secs: None,
            puterchat_home: home.join(".puterchat"),
        }
    }
}

impl Config {
    /// Load configuration from ~/.puterchat/config.toml, creating the
    /// directory and falling back to defaults when the file is absent
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let puterchat_home = home.join(".puterchat");
        let config_path = puterchat_home.join("config.toml");

        fs::create_dir_all(&puterchat_home)
            .context("Failed to create .puterchat directory")?;

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.puterchat_home = puterchat_home;

        // Write defaults on first run so there is a file to edit.
        if !config_path.exists() {
            config.save()?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.puterchat_home.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Get API token from config or environment
    pub fn api_token(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var("PUTER_API_TOKEN").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_timeout_unset() {
        let config = Config::default();
        assert_eq!(config.default_model, models::DEFAULT_MODEL);
        assert_eq!(config.base_url, "https://api.puter.com");
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn partial_config_file_falls_back_to_defaults() {
        let config: Config = toml::from_str("default_model = \"gpt-4\"").unwrap();
        assert_eq!(config.default_model, "gpt-4");
        assert_eq!(config.base_url, "https://api.puter.com");
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn optional_fields_round_trip() {
        let mut config = Config::default();
        config.request_timeout_secs = Some(30);
        config.system_prompt = Some("Be brief.".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.request_timeout_secs, Some(30));
        assert_eq!(parsed.system_prompt.as_deref(), Some("Be brief."));
    }
}
