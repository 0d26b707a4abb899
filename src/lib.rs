//! Talkie - voice-interactive chat assistant
//!
//! Records the user's speech, transcribes it through a remote ASR endpoint,
//! asks a remote text-generation endpoint for a reply, and speaks the reply
//! back through a remote TTS endpoint, keeping an in-memory transcript for
//! the UI to render.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                UI (external)                 │
//! │  record button │ text entry │ transcript     │
//! └──────────────────┬───────────────────────────┘
//!                    │ HTTP
//! ┌──────────────────▼───────────────────────────┐
//! │                  Session                     │
//! │  capture → transcribe → respond → synthesize │
//! │                                  └→ playback │
//! └──────────────────┬───────────────────────────┘
//!                    │ HTTPS (bearer token)
//! ┌──────────────────▼───────────────────────────┐
//! │       Hosted models (ASR / LLM / TTS)        │
//! └──────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod session;
pub mod voice;

pub use chat::ChatClient;
pub use config::{Config, ModelChoice, ModelProfile, ModelTable};
pub use error::{Error, Result};
pub use session::{Role, Session, Status, Turn, TurnOutcome};
