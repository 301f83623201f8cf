//! Configuration Management
//!
//! Handles persistent configuration storage for tshop.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API base URL
    #[serde(default)]
    pub api_url: Option<String>,
    /// Last viewed resource
    #[serde(default)]
    pub last_resource: Option<String>,
    /// Command aliases, e.g. "v" -> "vendors"
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    /// Hidden column headers per resource
    #[serde(default)]
    pub hidden_columns: HashMap<String, Vec<String>>,
    /// Toast detail level: "minimal", "detailed", or "verbose"
    #[serde(default)]
    pub notification_detail: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tshop").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective API URL (CLI > config > env > default)
    pub fn effective_api_url(&self, cli_url: Option<&str>) -> String {
        cli_url
            .map(str::to_string)
            .or_else(|| self.api_url.clone())
            .or_else(|| std::env::var("TSHOP_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// API token from the environment, if set
    pub fn api_token(&self) -> Option<String> {
        std::env::var("TSHOP_API_TOKEN").ok().filter(|t| !t.is_empty())
    }

    /// Resolve a command alias, returning the input unchanged if unaliased
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Set an alias and save
    pub fn set_alias(&mut self, name: &str, target: &str) -> Result<()> {
        self.aliases.insert(name.to_string(), target.to_string());
        self.save()
    }

    /// Set last viewed resource and save
    pub fn set_last_resource(&mut self, resource: &str) -> Result<()> {
        self.last_resource = Some(resource.to_string());
        self.save()
    }

    /// Toast detail level from config, defaulting to "detailed"
    pub fn notification_detail_level(&self) -> crate::notification::DetailLevel {
        self.notification_detail
            .as_deref()
            .map(crate::notification::DetailLevel::from_str)
            .unwrap_or_default()
    }

    /// Check whether a column is hidden for a resource
    pub fn is_column_hidden(&self, resource: &str, header: &str) -> bool {
        self.hidden_columns
            .get(resource)
            .is_some_and(|cols| cols.iter().any(|c| c == header))
    }

    /// Toggle column visibility (does not save; caller saves once done)
    pub fn toggle_column(&mut self, resource: &str, header: &str) {
        let cols = self.hidden_columns.entry(resource.to_string()).or_default();
        if let Some(pos) = cols.iter().position(|c| c == header) {
            cols.remove(pos);
        } else {
            cols.push(header.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolution() {
        let mut config = Config::default();
        config.aliases.insert("v".to_string(), "vendors".to_string());
        assert_eq!(config.resolve_alias("v"), "vendors");
        assert_eq!(config.resolve_alias("orders"), "orders");
    }

    #[test]
    fn test_column_toggle_roundtrip() {
        let mut config = Config::default();
        assert!(!config.is_column_hidden("vendors", "EMAIL"));
        config.toggle_column("vendors", "EMAIL");
        assert!(config.is_column_hidden("vendors", "EMAIL"));
        config.toggle_column("vendors", "EMAIL");
        assert!(!config.is_column_hidden("vendors", "EMAIL"));
    }

    #[test]
    fn test_notification_detail_level() {
        use crate::notification::DetailLevel;

        let mut config = Config::default();
        assert_eq!(config.notification_detail_level(), DetailLevel::Detailed);

        config.notification_detail = Some("verbose".to_string());
        assert_eq!(config.notification_detail_level(), DetailLevel::Verbose);
        assert_eq!(config.notification_detail_level().as_str(), "verbose");

        config.notification_detail = Some("garbage".to_string());
        assert_eq!(config.notification_detail_level(), DetailLevel::Detailed);
    }

    #[test]
    fn test_effective_api_url_prefers_cli() {
        let config = Config {
            api_url: Some("http://config:9000".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.effective_api_url(Some("http://cli:7000")),
            "http://cli:7000"
        );
        assert_eq!(config.effective_api_url(None), "http://config:9000");
    }
}
