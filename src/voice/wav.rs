//! Temporary WAV persistence
//!
//! Audio lives on disk only between pipeline stages. Every file is owned by
//! a [`TempWav`] handle; the file is removed when the handle drops, so
//! whichever stage reads it last cleans it up by letting it go out of scope.

use std::path::Path;

use tempfile::NamedTempFile;

use super::AudioBuffer;
use crate::{Error, Result};

/// Handle owning exactly one temporary audio file
#[derive(Debug)]
pub struct TempWav {
    inner: NamedTempFile,
}

impl TempWav {
    /// Create a fresh, uniquely named temp file with a `.wav` suffix.
    /// Never overwrites or reuses an existing file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created
    pub fn create() -> Result<Self> {
        let inner = tempfile::Builder::new()
            .prefix("talkie-")
            .suffix(".wav")
            .tempfile()?;
        Ok(Self { inner })
    }

    /// Write raw audio bytes verbatim to a fresh temp file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file = Self::create()?;
        std::fs::write(file.path(), bytes)?;
        Ok(file)
    }

    /// Path of the underlying file
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Read the full file contents
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.path())?)
    }
}

/// Persist a sample buffer as an uncompressed 16-bit mono PCM WAV file
///
/// # Errors
///
/// Returns error if the temp file cannot be created or encoding fails
pub fn persist(buffer: &AudioBuffer) -> Result<TempWav> {
    let file = TempWav::create()?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        hound::WavWriter::create(file.path(), spec).map_err(|e| Error::Audio(e.to_string()))?;
    for &sample in &buffer.samples {
        writer
            .write_sample(sample)
            .map_err(|e| Error::Audio(e.to_string()))?;
    }
    writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;

    tracing::debug!(
        path = %file.path().display(),
        samples = buffer.samples.len(),
        "recording persisted"
    );
    Ok(file)
}

/// Read a 16-bit PCM WAV file back into a sample buffer
///
/// # Errors
///
/// Returns error if the file is missing or not 16-bit PCM
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::open(path).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::Audio(e.to_string()))?;

    Ok(AudioBuffer {
        samples,
        sample_rate: spec.sample_rate,
    })
}
