use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::security::validator::ExecPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    pub llm: LLMConfig,
    pub executor: ExecutorConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// OpenAI-compatible chat-completions endpoint
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExecutorConfig {
    pub policy: ExecPolicy,
    pub timeout_seconds: u64,
    pub max_output_bytes: usize,
    pub confirm_dangerous_ops: bool,
    pub log_commands: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    /// Cap on model-facing conversation turns
    pub history_cap: usize,
    /// Most-recent sessions retained in the store
    pub session_cap: usize,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "openai/gpt-oss-20b".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_seconds: 60,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            policy: ExecPolicy::GitOnly,
            timeout_seconds: 30,
            max_output_bytes: 1024 * 1024,
            confirm_dangerous_ops: true,
            log_commands: true,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_cap: 20,
            session_cap: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            executor: ExecutorConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitpal"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default path, falling back to defaults
    /// when no file exists yet.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), ConfigError> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self)?;

        fs::write(&path, contents)?;

        // The file may carry an API key or private endpoint
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.endpoint.is_empty()
            || !(self.llm.endpoint.starts_with("http://")
                || self.llm.endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue(format!(
                "llm.endpoint must be an http(s) URL, got: {}",
                self.llm.endpoint
            )));
        }

        if self.llm.model.is_empty() {
            return Err(ConfigError::InvalidValue(
                "llm.model must not be empty".to_string(),
            ));
        }

        if self.llm.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "llm.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.executor.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "executor.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.executor.max_output_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "executor.max_output_bytes must be greater than 0".to_string(),
            ));
        }

        if self.chat.history_cap == 0 {
            return Err(ConfigError::InvalidValue(
                "chat.history_cap must be greater than 0".to_string(),
            ));
        }

        if self.chat.session_cap == 0 {
            return Err(ConfigError::InvalidValue(
                "chat.session_cap must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
