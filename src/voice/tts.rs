//! Text-to-speech via a remote synthesis endpoint

use crate::config::REQUEST_TIMEOUT;
use crate::{Error, Result};

use super::TempWav;

/// Request body for the TTS endpoint
#[derive(serde::Serialize)]
struct SynthesisRequest<'a> {
    inputs: &'a str,
}

/// Synthesizes speech through a remote TTS endpoint
pub struct Synthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Synthesizer {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built
    pub fn new(endpoint: String, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("API key required for TTS".to_string()));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Synthesize `text` into a temporary audio file.
    ///
    /// `None` means "skip playback": the failure has already been logged and
    /// must not abort the turn.
    pub async fn synthesize(&self, text: &str) -> Option<TempWav> {
        match self.try_synthesize(text).await {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::error!(error = %e, "speech synthesis failed");
                None
            }
        }
    }

    /// POST the text and write the raw response bytes verbatim to a fresh
    /// temp file.
    async fn try_synthesize(&self, text: &str) -> Result<TempWav> {
        tracing::debug!(chars = text.len(), "starting speech synthesis");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&SynthesisRequest { inputs: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        let file = TempWav::from_bytes(&audio)?;

        tracing::debug!(
            bytes = audio.len(),
            path = %file.path().display(),
            "synthesized speech saved"
        );
        Ok(file)
    }
}
