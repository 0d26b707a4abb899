use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use talkie::ChatClient;
use talkie::api::{self, ApiState};
use talkie::config::{Config, ModelChoice};
use talkie::session::Session;
use talkie::voice::{self, AudioCapture, Playback, Synthesizer};

/// Talkie - voice-interactive chat assistant
#[derive(Parser)]
#[command(name = "talkie", version, about)]
struct Cli {
    /// Port for the UI-facing API server
    #[arg(long, env = "TALKIE_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// One-shot text turn against the generation endpoint
    Chat {
        /// Message to send
        text: String,

        /// Model quality selector (standard, advanced, multilingual)
        #[arg(short, long, default_value = "standard")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,talkie=info",
        1 => "info,talkie=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(&config, duration),
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Chat { text, model } => chat_once(&config, &text, &model).await,
        };
    }

    tracing::info!(port = config.port, "starting talkie");

    let session = Arc::new(Session::new(config.clone())?);
    let state = Arc::new(ApiState { session });

    tracing::info!("talkie ready - waiting for the UI to connect");
    api::serve(state, config.port).await?;

    Ok(())
}

/// Test microphone input
fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Recording {duration} seconds of audio...");
    println!("Speak into your microphone!\n");

    let capture = AudioCapture::with_sample_rate(config.voice.sample_rate)?;
    let buffer = capture.record(Duration::from_secs(duration))?;

    let peak = buffer.peak();
    let rms = calculate_rms(&buffer.samples);

    println!(
        "Captured {} samples at {} Hz",
        buffer.samples.len(),
        buffer.sample_rate
    );
    println!("Peak: {peak} | RMS: {rms:.1}");

    println!("\n---");
    if buffer.is_likely_silent() {
        println!("Audio level is very low. Check:");
        println!("  1. Is your mic plugged in?");
        println!("  2. Run: pactl info | grep 'Default Source'");
        println!("  3. Run: arecord -l (to list devices)");
        println!("  4. Try: pavucontrol (to check levels)");
    } else {
        println!("Your mic is working!");
    }

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_squares / samples.len() as f64).sqrt()
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = voice::SAMPLE_RATE;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let samples: Vec<i16> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let value = (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3; // 30% volume
            (value * 32767.0) as i16
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    let buffer = voice::AudioBuffer {
        samples,
        sample_rate,
    };
    let file = voice::persist(&buffer)?;
    Playback::play_file(file)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS output against the remote endpoint
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("HF_API_KEY is not set"))?;
    let synthesizer = Synthesizer::new(config.tts_endpoint.clone(), api_key)?;

    println!("Synthesizing speech...");
    let Some(file) = synthesizer.synthesize(text).await else {
        anyhow::bail!("synthesis failed, check the log above");
    };

    println!("Playing audio...");
    Playback::play_file(file)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// One-shot text turn, printed to stdout
async fn chat_once(config: &Config, text: &str, model: &str) -> anyhow::Result<()> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("HF_API_KEY is not set"))?;
    let chat = ChatClient::new(config.models.clone(), api_key)?;

    let reply = chat.respond(text, ModelChoice::from_selector(model)).await;
    println!("{reply}");

    Ok(())
}
