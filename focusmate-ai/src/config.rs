use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::runtime::{SummarizerOptions, TranslatorOptions};

/// Oldest Chrome major version that ships the built-in AI APIs
pub const DEFAULT_MIN_RUNTIME_VERSION: u32 = 138;
pub const DEFAULT_LIVENESS_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 30_000;

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_CLOUD_MODEL: &str = "mistralai/mistral-7b-instruct:free";

/// Settings for the OpenRouter-backed cloud provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudConfig {
    pub endpoint: String,
    pub model: String,
    /// Falls back to the `OPENROUTER_API_KEY` environment variable
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_ms: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            endpoint: OPENROUTER_API_URL.to_string(),
            model: DEFAULT_CLOUD_MODEL.to_string(),
            api_key: None,
            max_tokens: 150,
            temperature: 0.5,
            request_timeout_ms: 60_000,
        }
    }
}

impl CloudConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Core configuration. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub min_runtime_version: u32,
    pub liveness_timeout_ms: u64,
    pub health_check_interval_ms: u64,
    pub translation: TranslatorOptions,
    pub summary: SummarizerOptions,
    pub cloud: CloudConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_runtime_version: DEFAULT_MIN_RUNTIME_VERSION,
            liveness_timeout_ms: DEFAULT_LIVENESS_TIMEOUT_MS,
            health_check_interval_ms: DEFAULT_HEALTH_CHECK_INTERVAL_MS,
            translation: TranslatorOptions::default(),
            summary: SummarizerOptions::default(),
            cloud: CloudConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: CoreConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liveness_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "livenessTimeoutMs must be greater than zero".to_string(),
            ));
        }

        if self.health_check_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "healthCheckIntervalMs must be greater than zero".to_string(),
            ));
        }

        if self.translation.source_language.trim().is_empty()
            || self.translation.target_language.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "translation languages cannot be empty".to_string(),
            ));
        }

        if self.cloud.model.trim().is_empty() {
            return Err(ConfigError::Invalid("cloud model cannot be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.cloud.temperature) {
            return Err(ConfigError::Invalid(format!(
                "cloud temperature {} is outside 0.0-2.0",
                self.cloud.temperature
            )));
        }

        if self.cloud.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "cloud requestTimeoutMs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }
}
