//! Speech-to-text via a remote ASR endpoint

use crate::config::REQUEST_TIMEOUT;
use crate::{Error, Result};

use super::TempWav;

/// Response from the ASR endpoint
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes recorded speech through a remote ASR endpoint
pub struct Transcriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Transcriber {
    /// Create a new transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built
    pub fn new(endpoint: String, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for transcription".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Transcribe a recorded WAV file to text.
    ///
    /// Never fails the caller: any transport, status, or decode error on both
    /// attempts yields an empty string, which the orchestrator treats as
    /// "nothing was said".
    pub async fn transcribe(&self, audio: &TempWav) -> String {
        match self.try_transcribe(audio).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "transcription failed");
                String::new()
            }
        }
    }

    /// Multipart upload first; on a non-success status, one retry with the
    /// raw WAV bytes as the request body.
    async fn try_transcribe(&self, audio: &TempWav) -> Result<String> {
        let bytes = audio.read_bytes()?;
        tracing::debug!(audio_bytes = bytes.len(), "starting transcription");

        let part = reqwest::multipart::Part::bytes(bytes.clone())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Stt(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let response = if response.status().is_success() {
            response
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body = %body,
                "multipart transcription attempt failed, retrying with raw bytes"
            );

            let retry = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "audio/wav")
                .body(bytes)
                .send()
                .await?;

            if !retry.status().is_success() {
                let status = retry.status();
                let body = retry.text().await.unwrap_or_default();
                return Err(Error::Stt(format!("ASR error {status}: {body}")));
            }
            retry
        };

        let result: TranscriptionResponse = response.json().await?;
        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}
