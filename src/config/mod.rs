//! Configuration management for talkie
//!
//! One environment-sourced API key is used as a bearer token for all three
//! remote endpoints. The model-profile table is static and validated at
//! startup; an optional TOML file overlays the remaining defaults.

pub mod file;

use std::time::Duration;

use url::Url;

use crate::voice::SAMPLE_RATE;
use crate::{Error, Result};

/// Environment variable holding the bearer token for the remote endpoints
pub const API_KEY_ENV: &str = "HF_API_KEY";

/// Timeout applied to every remote call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default ASR endpoint
const DEFAULT_STT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/openai/whisper-tiny";

/// Default TTS endpoint
const DEFAULT_TTS_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/mms-tts-eng";

/// Default UI-facing API server port
const DEFAULT_PORT: u16 = 18990;

/// Default recording duration per record press, in seconds
const DEFAULT_RECORD_SECS: f32 = 5.0;

/// Talkie configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the ASR, generation, and TTS endpoints
    pub api_key: Option<String>,

    /// ASR endpoint URL
    pub stt_endpoint: String,

    /// TTS endpoint URL
    pub tts_endpoint: String,

    /// Generation model profiles
    pub models: ModelTable,

    /// Audio capture configuration
    pub voice: VoiceConfig,

    /// UI-facing API server port
    pub port: u16,
}

/// Audio capture configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Recording duration per record press, in seconds
    pub record_secs: f32,

    /// Capture sample rate in Hz
    pub sample_rate: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            record_secs: DEFAULT_RECORD_SECS,
            sample_rate: SAMPLE_RATE,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            stt_endpoint: DEFAULT_STT_ENDPOINT.to_string(),
            tts_endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            models: ModelTable::default(),
            voice: VoiceConfig::default(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load configuration: defaults, overlaid by the optional config file,
    /// overlaid by the environment. Model profiles are validated here so a
    /// bad table fails at startup rather than mid-turn.
    ///
    /// # Errors
    ///
    /// Returns error if the model-profile table fails validation
    pub fn load() -> Result<Self> {
        let overlay = file::load_config_file();

        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or(overlay.api_key);

        if api_key.is_none() {
            tracing::warn!("{API_KEY_ENV} is not set, remote calls will fail");
        }

        let config = Self {
            api_key,
            stt_endpoint: overlay
                .endpoints
                .stt
                .unwrap_or_else(|| DEFAULT_STT_ENDPOINT.to_string()),
            tts_endpoint: overlay
                .endpoints
                .tts
                .unwrap_or_else(|| DEFAULT_TTS_ENDPOINT.to_string()),
            models: ModelTable::default(),
            voice: VoiceConfig {
                record_secs: overlay.voice.record_secs.unwrap_or(DEFAULT_RECORD_SECS),
                sample_rate: overlay.voice.sample_rate.unwrap_or(SAMPLE_RATE),
            },
            port: overlay.server.port.unwrap_or(DEFAULT_PORT),
        };

        config.models.validate()?;
        Ok(config)
    }
}

/// UI model-quality selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    /// Small, fast model
    #[default]
    Standard,
    /// Larger model, also the escalation target for short replies
    Advanced,
    /// Multilingual model
    Multilingual,
}

impl ModelChoice {
    /// Parse a UI selector string. Unknown values fall back to the standard
    /// profile rather than failing the turn.
    #[must_use]
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_lowercase().as_str() {
            "advanced" => Self::Advanced,
            "multilingual" => Self::Multilingual,
            "standard" => Self::Standard,
            other => {
                tracing::debug!(selector = other, "unknown model selector, using standard");
                Self::Standard
            }
        }
    }
}

/// Generation parameters for one remote model
#[derive(Debug, Clone)]
pub struct ModelProfile {
    /// Generation endpoint URL
    pub endpoint: String,

    /// Maximum generated length in tokens
    pub max_length: u32,

    /// Sampling temperature, in (0, 2]
    pub temperature: f32,
}

impl ModelProfile {
    fn validate(&self) -> std::result::Result<(), String> {
        Url::parse(&self.endpoint)
            .map_err(|e| format!("invalid endpoint {:?}: {e}", self.endpoint))?;
        if self.max_length == 0 {
            return Err("max_length must be positive".to_string());
        }
        if !(self.temperature > 0.0 && self.temperature <= 2.0) {
            return Err(format!("temperature {} outside (0, 2]", self.temperature));
        }
        Ok(())
    }
}

/// Static per-model generation profiles, keyed by the UI quality selector
#[derive(Debug, Clone)]
pub struct ModelTable {
    pub standard: ModelProfile,
    pub advanced: ModelProfile,
    pub multilingual: ModelProfile,
}

impl Default for ModelTable {
    fn default() -> Self {
        Self {
            standard: ModelProfile {
                endpoint: "https://api-inference.huggingface.co/models/google/flan-t5-small"
                    .to_string(),
                max_length: 150,
                temperature: 0.7,
            },
            advanced: ModelProfile {
                endpoint: "https://api-inference.huggingface.co/models/google/flan-t5-xl"
                    .to_string(),
                max_length: 200,
                temperature: 0.8,
            },
            multilingual: ModelProfile {
                endpoint: "https://api-inference.huggingface.co/models/google/mt5-large"
                    .to_string(),
                max_length: 180,
                temperature: 0.75,
            },
        }
    }
}

impl ModelTable {
    /// Profile for the given selector
    #[must_use]
    pub fn get(&self, choice: ModelChoice) -> &ModelProfile {
        match choice {
            ModelChoice::Standard => &self.standard,
            ModelChoice::Advanced => &self.advanced,
            ModelChoice::Multilingual => &self.multilingual,
        }
    }

    /// Validate every profile in the table
    ///
    /// # Errors
    ///
    /// Returns error if any endpoint is not a URL, any `max_length` is zero,
    /// or any temperature falls outside (0, 2]
    pub fn validate(&self) -> Result<()> {
        let entries = [
            ("standard", &self.standard),
            ("advanced", &self.advanced),
            ("multilingual", &self.multilingual),
        ];
        for (name, profile) in entries {
            profile
                .validate()
                .map_err(|e| Error::Config(format!("model profile {name}: {e}")))?;
        }
        Ok(())
    }
}
