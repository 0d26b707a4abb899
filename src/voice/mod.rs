//! Voice processing module
//!
//! Audio capture, temporary WAV persistence, remote transcription and
//! synthesis, and playback.

mod capture;
mod playback;
mod stt;
mod tts;
mod wav;

pub use capture::{AudioBuffer, AudioCapture, SAMPLE_RATE, SILENCE_PEAK, capture_or_silence};
pub use playback::Playback;
pub use stt::Transcriber;
pub use tts::Synthesizer;
pub use wav::{TempWav, persist, read_wav};
