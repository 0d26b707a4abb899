//! Audio capture from microphone

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16_000;

/// Peak amplitude below which a recording is treated as likely silence
pub const SILENCE_PEAK: i16 = 50;

/// A mono 16-bit PCM sample buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    /// Signed 16-bit samples, one channel
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Zero-filled buffer covering exactly `duration` at `sample_rate`
    #[must_use]
    pub fn silence(duration: Duration, sample_rate: u32) -> Self {
        Self {
            samples: vec![0; expected_samples(duration, sample_rate)],
            sample_rate,
        }
    }

    /// Buffer duration in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample amplitude
    #[must_use]
    pub fn peak(&self) -> i16 {
        self.samples
            .iter()
            .map(|s| s.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    /// Whether the recording likely contains no input at all.
    ///
    /// A failed capture comes back zero-filled, so callers treat a near-silent
    /// buffer the same as a capture failure: log and continue.
    #[must_use]
    pub fn is_likely_silent(&self) -> bool {
        self.peak() < SILENCE_PEAK
    }
}

/// Captures fixed-duration recordings from the default input device
pub struct AudioCapture {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    sample_rate: u32,
}

impl AudioCapture {
    /// Create a capture instance at the default speech sample rate
    ///
    /// # Errors
    ///
    /// Returns error if the audio device cannot be opened
    pub fn new() -> Result<Self> {
        Self::with_sample_rate(SAMPLE_RATE)
    }

    /// Create a capture instance at a specific sample rate
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports mono capture at `sample_rate`
    pub fn with_sample_rate(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(sample_rate))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            device,
            config,
            sample_rate,
        })
    }

    /// Record for exactly `duration`, blocking the calling thread.
    ///
    /// The returned buffer always holds exactly `sample_rate × duration`
    /// samples, padded or truncated as needed.
    ///
    /// # Errors
    ///
    /// Returns error if the capture stream cannot be built or started
    pub fn record(&self, duration: Duration) -> Result<AudioBuffer> {
        let buffer = Arc::new(Mutex::new(Vec::<i16>::new()));
        let sink = Arc::clone(&buffer);

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut samples) = sink.lock() {
                        samples.extend(data.iter().copied().map(f32_to_i16));
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        std::thread::sleep(duration);
        drop(stream);

        let samples = buffer
            .lock()
            .map(|mut samples| std::mem::take(&mut *samples))
            .unwrap_or_default();

        let expected = expected_samples(duration, self.sample_rate);
        tracing::debug!(
            captured = samples.len(),
            expected,
            "audio capture complete"
        );

        Ok(AudioBuffer {
            samples: fit_length(samples, expected),
            sample_rate: self.sample_rate,
        })
    }
}

/// Record with the soft-failure contract: any device error yields a
/// zero-filled buffer of the requested length so downstream stages always
/// receive a well-formed buffer.
#[must_use]
pub fn capture_or_silence(duration: Duration, sample_rate: u32) -> AudioBuffer {
    let attempt =
        AudioCapture::with_sample_rate(sample_rate).and_then(|capture| capture.record(duration));

    match attempt {
        Ok(buffer) => buffer,
        Err(e) => {
            tracing::warn!(error = %e, "audio capture failed, substituting silence");
            AudioBuffer::silence(duration, sample_rate)
        }
    }
}

/// Convert an f32 sample in [-1.0, 1.0] to i16
#[allow(clippy::cast_possible_truncation)]
fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Number of samples in `duration` at `sample_rate`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn expected_samples(duration: Duration, sample_rate: u32) -> usize {
    (sample_rate as f32 * duration.as_secs_f32()).round() as usize
}

/// Pad with zeros or truncate to exactly `expected` samples
fn fit_length(mut samples: Vec<i16>, expected: usize) -> Vec<i16> {
    samples.resize(expected, 0);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.5), -32768);
        assert_eq!(f32_to_i16(2.0), 32767);
    }

    #[test]
    fn fit_length_pads_and_truncates() {
        assert_eq!(fit_length(vec![1, 2], 4), vec![1, 2, 0, 0]);
        assert_eq!(fit_length(vec![1, 2, 3, 4], 2), vec![1, 2]);
        assert_eq!(fit_length(Vec::new(), 3), vec![0, 0, 0]);
    }

    #[test]
    fn expected_samples_scales_with_duration() {
        assert_eq!(expected_samples(Duration::from_secs(5), 16_000), 80_000);
        assert_eq!(expected_samples(Duration::from_millis(100), 16_000), 1_600);
        assert_eq!(expected_samples(Duration::from_millis(250), 8_000), 2_000);
    }

    #[test]
    fn silence_buffer_is_likely_silent() {
        let buffer = AudioBuffer::silence(Duration::from_secs(1), SAMPLE_RATE);
        assert_eq!(buffer.samples.len(), 16_000);
        assert_eq!(buffer.peak(), 0);
        assert!(buffer.is_likely_silent());
    }

    #[test]
    fn silence_threshold_is_exclusive() {
        let quiet = AudioBuffer {
            samples: vec![0, 49, -49],
            sample_rate: SAMPLE_RATE,
        };
        assert!(quiet.is_likely_silent());

        let audible = AudioBuffer {
            samples: vec![0, 50, -30],
            sample_rate: SAMPLE_RATE,
        };
        assert!(!audible.is_likely_silent());
    }

    #[test]
    fn peak_handles_extreme_negative() {
        let buffer = AudioBuffer {
            samples: vec![i16::MIN],
            sample_rate: SAMPLE_RATE,
        };
        assert_eq!(buffer.peak(), i16::MAX);
    }
}
