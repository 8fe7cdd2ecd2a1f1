//! Configuration types and loading for dbchat.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::error::Result;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the sales database file.
    pub database: PathBuf,

    /// Path to a file holding the system message for the conversation.
    /// No system message is injected when unset or missing.
    pub system_prompt: Option<PathBuf>,

    /// Maximum number of enumerated values shown per domain when a table
    /// schema is rendered for the model. Longer lists are truncated with a
    /// total count.
    pub display_cap: usize,

    /// Maximum completion round-trips per user turn before the
    /// orchestrator gives up on a tool-calling loop.
    pub max_tool_rounds: usize,

    /// Override for the MCP server command. Defaults to the `dbchat-mcp`
    /// binary next to the current executable, falling back to PATH lookup.
    pub mcp_server: Option<PathBuf>,

    /// Model endpoint configuration.
    pub model: ModelConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dbchat");

        Self {
            database: data_dir.join("customer_sales.db"),
            system_prompt: None,
            display_cap: 10,
            max_tool_rounds: 10,
            mcp_server: None,
            model: ModelConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            let mut config = Self::default();
            config.model.apply_env();
            Ok(config)
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.expand_paths();
        config.model.apply_env();
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dbchat")
            .join("config.toml")
    }

    /// Save configuration to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Ensure config exists at the given path, creating defaults if missing.
    pub fn ensure_at(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            let mut config = Self::default();
            config.expand_paths();
            config.save_to_path(path)?;
            config.model.apply_env();
            Ok(config)
        }
    }

    /// Expand a path, replacing ~ with home directory.
    pub fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::full(path)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| path.to_string());
        PathBuf::from(expanded)
    }

    fn expand_paths(&mut self) {
        self.database = Self::expand_path(&self.database.to_string_lossy());
        self.system_prompt = self
            .system_prompt
            .as_ref()
            .map(|p| Self::expand_path(&p.to_string_lossy()));
        self.mcp_server = self
            .mcp_server
            .as_ref()
            .map(|p| Self::expand_path(&p.to_string_lossy()));
    }
}

/// Chat completion endpoint configuration (Azure OpenAI shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,

    /// Deployment (model) name.
    pub deployment: String,

    /// API version query parameter.
    pub api_version: String,

    /// Maximum output tokens per completion.
    pub max_tokens: u32,

    /// API key. Read from the environment, never persisted to disk.
    #[serde(skip_serializing)]
    pub api_key: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-10-21".to_string(),
            max_tokens: 10240,
            api_key: String::new(),
        }
    }
}

impl ModelConfig {
    /// Overlay credentials and endpoint details from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("DBCHAT_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("DBCHAT_API_KEY") {
            self.api_key = key;
        }
        if let Ok(deployment) = std::env::var("DBCHAT_MODEL") {
            self.deployment = deployment;
        }
        if let Ok(version) = std::env::var("DBCHAT_API_VERSION") {
            self.api_version = version;
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
