//! Configuration management
//!
//! Handles loading, validation, and creation of the Stride configuration.
//! Configuration is stored in TOML format at `~/.stride/config.toml`.
//!
//! # Configuration Sections
//!
//! - **core**: data directory, log level
//! - **llm**: provider selection, sampling bounds, retry budget
//! - **agent**: conversation loop bounds
//! - **prompt**: optional override path for the coach system prompt
//!
//! API keys never live in the config file; they are read from the
//! environment (`ANTHROPIC_API_KEY`, `OPENAI_API_KEY`) by the providers.
//!
//! # Examples
//!
//! ```no_run
//! use stride_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Provider: {}", config.llm.default_provider);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Conversation loop configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Coach prompt configuration
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (anthropic, openai)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Maximum tokens the model may generate per turn
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature. Kept low so the model follows the scheduling
    /// rules in the coach prompt literally.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retries for transient transport failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-call timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Anthropic provider settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
            anthropic: AnthropicConfig::default(),
            openai: OpenAIConfig::default(),
        }
    }
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for the Anthropic API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,
    // Note: API key comes from ANTHROPIC_API_KEY, not from config
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
        }
    }
}

/// OpenAI-compatible provider configuration
///
/// Point `base_url` at a local runtime (Ollama, vLLM) to run without an API
/// key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for the API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    // Note: API key comes from OPENAI_API_KEY, not from config
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool round-trips per run before the run is aborted
    #[serde(default = "default_max_round_trips")]
    pub max_round_trips: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_round_trips: default_max_round_trips(),
        }
    }
}

/// Coach prompt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Path to a prompt template overriding the built-in one.
    /// The template may use a `{current_date}` placeholder.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.stride")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_retries() -> u32 {
    2
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_round_trips() -> usize {
    10
}

impl Config {
    /// Default configuration file location: `~/.stride/config.toml`.
    pub fn default_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".stride").join("config.toml"))
    }

    /// Load the configuration, creating a default file if none exists.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let path = Self::default_path()?;

        if path.exists() {
            return Self::load_from_path(&path);
        }

        let config = Self::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to render default config: {e}")))?;
        fs::write(&path, rendered)?;

        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&raw).map_err(|e| {
            EngineError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Path of the workout store inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        expand_tilde(&self.core.data_dir).join("stride.db")
    }

    fn validate(&self) -> Result<(), EngineError> {
        match self.llm.default_provider.as_str() {
            "anthropic" | "openai" => {}
            other => {
                return Err(EngineError::Config(format!(
                    "Unknown provider '{other}', expected 'anthropic' or 'openai'"
                )))
            }
        }

        if self.agent.max_round_trips == 0 {
            return Err(EngineError::Config(
                "agent.max_round_trips must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let Some(raw) = path.to_str() else {
        return path.to_path_buf();
    };

    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }

    path.to_path_buf()
}
