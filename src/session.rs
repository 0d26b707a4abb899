//! Conversation orchestration
//!
//! Sequences capture → transcribe → respond → synthesize → play for each
//! turn and owns the session transcript. One turn runs at a time: a second
//! turn requested while one is in flight is rejected, never interleaved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;

use crate::chat::ChatClient;
use crate::config::{Config, ModelChoice};
use crate::voice::{self, AudioBuffer, Playback, Synthesizer, Transcriber};
use crate::{Error, Result};

/// Shown to the user when transcription hears nothing
pub const RETRY_PROMPT: &str =
    "Sorry, I couldn't hear you. Please try again or switch to text input mode.";

/// Speaking-flag poll interval (10 Hz)
const SPEAKING_POLL: Duration = Duration::from_millis(100);

/// Author of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One utterance in the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Pipeline stage currently driving the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Capturing,
    Transcribing,
    Generating,
    Synthesizing,
    Playing,
}

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// User and assistant turns were appended; the assistant text may be an
    /// apology sentinel from the generation stage
    Replied { user: String, assistant: String },
    /// Transcription heard nothing; the transcript is untouched and the user
    /// is asked to retry
    NothingHeard,
}

/// One voice-chat session: the pipeline components plus all per-session
/// mutable state. Created at session start, torn down at session end.
pub struct Session {
    config: Config,
    chat: ChatClient,
    transcriber: Transcriber,
    synthesizer: Synthesizer,
    transcript: RwLock<Vec<Turn>>,
    status: RwLock<Status>,
    speaking: Arc<AtomicBool>,
    turn_lock: tokio::sync::Mutex<()>,
}

impl Session {
    /// Create a session from validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or a client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config(format!("{} is not set", crate::config::API_KEY_ENV)))?;

        let chat = ChatClient::new(config.models.clone(), api_key.clone())?;
        let transcriber = Transcriber::new(config.stt_endpoint.clone(), api_key.clone())?;
        let synthesizer = Synthesizer::new(config.tts_endpoint.clone(), api_key)?;

        Ok(Self {
            config,
            chat,
            transcriber,
            synthesizer,
            transcript: RwLock::new(Vec::new()),
            status: RwLock::new(Status::Idle),
            speaking: Arc::new(AtomicBool::new(false)),
            turn_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Snapshot of the conversation so far, oldest first
    #[must_use]
    pub fn transcript(&self) -> Vec<Turn> {
        self.transcript
            .read()
            .map(|turns| turns.clone())
            .unwrap_or_default()
    }

    /// Current pipeline stage
    #[must_use]
    pub fn status(&self) -> Status {
        self.status.read().map(|status| *status).unwrap_or_default()
    }

    /// Whether the assistant reply is currently being spoken
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::Acquire)
    }

    /// Run one voice turn: record from the microphone, then transcribe,
    /// reply, and speak.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TurnInProgress`] if another turn holds the session
    pub async fn voice_turn(&self, model: ModelChoice) -> Result<TurnOutcome> {
        let _guard = self
            .turn_lock
            .try_lock()
            .map_err(|_| Error::TurnInProgress)?;

        self.set_status(Status::Capturing);
        let duration = Duration::from_secs_f32(self.config.voice.record_secs);
        let sample_rate = self.config.voice.sample_rate;

        let capture =
            tokio::task::spawn_blocking(move || voice::capture_or_silence(duration, sample_rate))
                .await;
        let buffer = match capture {
            Ok(buffer) => buffer,
            Err(e) => {
                self.set_status(Status::Idle);
                return Err(Error::Audio(e.to_string()));
            }
        };

        let outcome = self.pipeline_from_audio(buffer, model).await;
        self.set_status(Status::Idle);
        Ok(outcome)
    }

    /// Run one turn from an already captured buffer. The capture stage is
    /// hardware-driven; everything downstream of it goes through here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TurnInProgress`] if another turn holds the session
    pub async fn audio_turn(&self, buffer: AudioBuffer, model: ModelChoice) -> Result<TurnOutcome> {
        let _guard = self
            .turn_lock
            .try_lock()
            .map_err(|_| Error::TurnInProgress)?;

        let outcome = self.pipeline_from_audio(buffer, model).await;
        self.set_status(Status::Idle);
        Ok(outcome)
    }

    /// Run one text-mode turn, skipping the capture and transcription stages
    ///
    /// # Errors
    ///
    /// Returns [`Error::TurnInProgress`] if another turn holds the session
    pub async fn text_turn(&self, text: &str, model: ModelChoice) -> Result<TurnOutcome> {
        let _guard = self
            .turn_lock
            .try_lock()
            .map_err(|_| Error::TurnInProgress)?;

        if text.trim().is_empty() {
            return Ok(TurnOutcome::NothingHeard);
        }

        let outcome = self.complete_turn(text.to_string(), model).await;
        self.set_status(Status::Idle);
        Ok(outcome)
    }

    /// Persist and transcribe the buffer, then hand off to the reply stages.
    /// An empty transcription aborts the turn without touching the
    /// transcript.
    async fn pipeline_from_audio(&self, buffer: AudioBuffer, model: ModelChoice) -> TurnOutcome {
        if buffer.is_likely_silent() {
            tracing::warn!(peak = buffer.peak(), "captured audio is near silent, likely no input");
        }

        self.set_status(Status::Transcribing);
        let text = match voice::persist(&buffer) {
            Ok(file) => {
                let text = self.transcriber.transcribe(&file).await;
                // the upload handle drops here, removing the temp file
                text
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to persist recording");
                String::new()
            }
        };

        if text.trim().is_empty() {
            tracing::info!("transcription empty, asking the user to retry");
            return TurnOutcome::NothingHeard;
        }

        self.complete_turn(text, model).await
    }

    /// Generate → append → synthesize → play. The generation stage never
    /// fails, so both turns are always appended once a turn reaches here.
    async fn complete_turn(&self, user_text: String, model: ModelChoice) -> TurnOutcome {
        self.append(Role::User, user_text.clone());

        self.set_status(Status::Generating);
        let reply = self.chat.respond(&user_text, model).await;
        self.append(Role::Assistant, reply.clone());

        self.set_status(Status::Synthesizing);
        if let Some(file) = self.synthesizer.synthesize(&reply).await {
            self.set_status(Status::Playing);
            self.speaking.store(true, Ordering::Release);
            Playback::spawn(file, Arc::clone(&self.speaking));

            while self.is_speaking() {
                tokio::time::sleep(SPEAKING_POLL).await;
            }
        }

        TurnOutcome::Replied {
            user: user_text,
            assistant: reply,
        }
    }

    fn append(&self, role: Role, content: String) {
        if let Ok(mut transcript) = self.transcript.write() {
            transcript.push(Turn { role, content });
        }
    }

    fn set_status(&self, status: Status) {
        if let Ok(mut current) = self.status.write() {
            tracing::debug!(from = ?*current, to = ?status, "session state change");
            *current = status;
        }
    }
}
