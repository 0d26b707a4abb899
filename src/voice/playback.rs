//! Audio playback to speakers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleRate;

use crate::{Error, Result};

use super::{TempWav, read_wav};

/// Playback completion poll interval (10 Hz)
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Plays temporary audio files on the default output device
pub struct Playback;

impl Playback {
    /// Play a WAV file, blocking until the device goes idle, then delete it.
    ///
    /// Deletion happens by dropping the handle; removal errors are suppressed
    /// by the handle itself.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be decoded or no output device
    /// supports its sample rate
    pub fn play_file(file: TempWav) -> Result<()> {
        let buffer = read_wav(file.path())?;
        Self::play_samples(&buffer.samples, buffer.sample_rate)?;
        drop(file);
        Ok(())
    }

    /// Run playback off the turn-processing path. The `speaking` flag is
    /// cleared when the device goes idle, including on playback failure.
    pub fn spawn(file: TempWav, speaking: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            if let Err(e) = Self::play_file(file) {
                tracing::error!(error = %e, "audio playback failed");
            }
            speaking.store(false, Ordering::Release);
        })
    }

    /// Play samples in a blocking manner
    #[allow(clippy::too_many_lines)]
    fn play_samples(samples: &[i16], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(sample_rate)
                        && c.max_sample_rate() >= SampleRate(sample_rate)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(sample_rate))
            .config();
        let channels = config.channels as usize;

        let samples: Vec<f32> = samples.iter().map(|&s| f32::from(s) / 32768.0).collect();
        let sample_count = samples.len();

        let samples = Arc::new(Mutex::new(samples));
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(Mutex::new(false));
        let finished_clone = Arc::clone(&finished);

        let samples_clone = Arc::clone(&samples);
        let position_clone = Arc::clone(&position);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let samples = samples_clone.lock().unwrap();
                    let mut pos = position_clone.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < samples.len() {
                            samples[*pos]
                        } else {
                            *finished_clone.lock().unwrap() = true;
                            0.0
                        };

                        for out in frame.iter_mut() {
                            *out = sample;
                        }

                        if *pos < samples.len() {
                            *pos += 1;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Poll for completion, bounded by the clip duration plus slack
        let duration_ms = (sample_count as u64 * 1000) / u64::from(sample_rate);
        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(duration_ms + 500);

        while !*finished.lock().unwrap() {
            if start.elapsed() > timeout {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        // Small delay to let the device drain
        std::thread::sleep(Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = sample_count, "playback complete");

        Ok(())
    }
}
