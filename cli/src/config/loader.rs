//! CLI configuration loader for toolrelay
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./toolrelay.json or ./.toolrelay/config.json
//! 3. User config dir: $XDG_CONFIG_HOME/toolrelay/config.json
//! 4. Environment variables only (no files)

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toolrelay_core::config::DEFAULT_BASE_URL;
use toolrelay_core::{ModelParams, ResolvedLlmConfig};
use tracing::debug;

/// Model used when neither the config nor the environment names one
const DEFAULT_MODEL: &str = "gpt-4";

/// Raw configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, uses the OpenAI endpoint if not specified)
    pub base_url: Option<String>,
    /// Model name
    pub model: String,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Tool-round budget per query (optional)
    #[serde(default)]
    pub max_tool_rounds: Option<usize>,
    /// Replacement system prompt (optional)
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Tools offered to the model when `--tool` is not given (optional)
    #[serde(default)]
    pub tools: Option<Vec<String>>,
}

/// Everything the CLI needs to build a query processor
#[derive(Debug, Clone)]
pub struct CliSettings {
    pub llm: ResolvedLlmConfig,
    pub max_tool_rounds: Option<usize>,
    pub system_prompt: Option<String>,
    pub tools: Option<Vec<String>>,
}

/// CLI configuration loader
#[derive(Debug, Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    temperature_override: Option<f32>,
    max_rounds_override: Option<usize>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set temperature override
    pub fn with_temperature_override(mut self, temperature: f32) -> Self {
        self.temperature_override = Some(temperature);
        self
    }

    /// Set tool-round budget override
    pub fn with_max_rounds_override(mut self, max_rounds: usize) -> Self {
        self.max_rounds_override = Some(max_rounds);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<CliSettings> {
        let config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load().await?
        };

        let config = self.apply_overrides(config);
        resolve_config(config)
    }

    fn apply_overrides(&self, mut config: RawConfig) -> RawConfig {
        if let Some(api_key) = &self.api_key_override {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = model.clone();
        }
        if let Some(temperature) = self.temperature_override {
            config.params.temperature = Some(temperature);
        }
        if let Some(max_rounds) = self.max_rounds_override {
            config.max_tool_rounds = Some(max_rounds);
        }
        config
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<RawConfig> {
        let cwd = std::env::current_dir()?;
        if let Some(config) = self.try_load_dir(&cwd).await? {
            return Ok(config);
        }

        if let Some(config) = self.try_load_xdg().await? {
            return Ok(config);
        }

        self.try_load_env_only()
    }

    /// Try ./toolrelay.json, then ./.toolrelay/config.json under `dir`
    async fn try_load_dir(&self, dir: &Path) -> Result<Option<RawConfig>> {
        let candidates = [
            dir.join("toolrelay.json"),
            dir.join(".toolrelay").join("config.json"),
        ];

        for path in candidates {
            if path.exists() {
                return Ok(Some(self.load_file(&path).await?));
            }
        }

        Ok(None)
    }

    /// Try loading from the user config directory
    async fn try_load_xdg(&self) -> Result<Option<RawConfig>> {
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("toolrelay").join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }
        Ok(None)
    }

    /// Build a config from environment variables only
    fn try_load_env_only(&self) -> Result<RawConfig> {
        // A flag-supplied key is enough on its own
        let api_key = match (&self.api_key_override, std::env::var("OPENAI_API_KEY")) {
            (Some(key), _) => key.clone(),
            (None, Ok(key)) => key,
            (None, Err(_)) => {
                return Err(anyhow!(
                    "No configuration found. Please create a toolrelay.json file or set OPENAI_API_KEY"
                ))
            }
        };

        let model = std::env::var("OPENAI_MODEL")
            .or_else(|_| std::env::var("TOOLRELAY_MODEL"))
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        debug!("using environment-only configuration");

        Ok(RawConfig {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL").ok(),
            model,
            params: ModelParams::default(),
            max_tool_rounds: None,
            system_prompt: None,
            tools: None,
        })
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        debug!("loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Resolve a raw config into validated settings
fn resolve_config(config: RawConfig) -> Result<CliSettings> {
    let api_key = match config.api_key.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .with_context(|| format!("Environment variable not found: {}", var_name))?,
        None => config.api_key,
    };

    let base_url = config
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let llm = ResolvedLlmConfig::new(base_url, api_key, config.model).with_params(config.params);
    llm.validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    Ok(CliSettings {
        llm,
        max_tool_rounds: config.max_tool_rounds,
        system_prompt: config.system_prompt,
        tools: config.tools,
    })
}
