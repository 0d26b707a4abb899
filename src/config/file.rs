//! TOML configuration file loading
//!
//! Supports `~/.config/talkie/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct TalkieConfigFile {
    /// Bearer token fallback for when `HF_API_KEY` is unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Audio capture configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Remote endpoint overrides
    #[serde(default)]
    pub endpoints: EndpointsFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// UI-facing API server port
    pub port: Option<u16>,
}

/// Audio capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Recording duration per record press, in seconds
    pub record_secs: Option<f32>,

    /// Capture sample rate in Hz
    pub sample_rate: Option<u32>,
}

/// Remote endpoint overrides
#[derive(Debug, Default, Deserialize)]
pub struct EndpointsFileConfig {
    /// ASR endpoint URL
    pub stt: Option<String>,

    /// TTS endpoint URL
    pub tts: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `TalkieConfigFile::default()` if the file doesn't exist or can't
/// be parsed.
#[must_use]
pub fn load_config_file() -> TalkieConfigFile {
    let Some(path) = config_file_path() else {
        return TalkieConfigFile::default();
    };

    if !path.exists() {
        return TalkieConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                TalkieConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            TalkieConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/talkie/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("talkie").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overlay_parses() {
        let overlay: TalkieConfigFile = toml::from_str(
            r#"
            [voice]
            record_secs = 3.0

            [endpoints]
            stt = "http://localhost:9000/asr"
            "#,
        )
        .unwrap();

        assert!((overlay.voice.record_secs.unwrap() - 3.0).abs() < f32::EPSILON);
        assert_eq!(overlay.voice.sample_rate, None);
        assert_eq!(overlay.endpoints.stt.as_deref(), Some("http://localhost:9000/asr"));
        assert_eq!(overlay.endpoints.tts, None);
        assert_eq!(overlay.server.port, None);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let overlay: TalkieConfigFile = toml::from_str("").unwrap();
        assert!(overlay.api_key.is_none());
        assert!(overlay.server.port.is_none());
    }
}
