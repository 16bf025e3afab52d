//! Headless capture run against the synthetic device.
//!
//! Streams for a fixed duration into the raw and live-encode sinks, stops,
//! then muxes the deliverable. Set `RUST_LOG=info` to follow the session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use framecap_core::{
    CaptureController, CaptureProfile, ControllerOptions, DisplayMode, FfmpegLauncher, FinalizeArtifacts,
    FinalizeMuxer, SessionEvent,
};
use framecap_synthetic::SyntheticDevice;

/// Frames between progress log lines.
const PROGRESS_EVERY: u64 = 100;

/// Capture from a synthetic device and finalize the recording
#[derive(Parser)]
#[command(name = "framecap-demo")]
#[command(version, about)]
struct Cli {
    /// JSON config file; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for raw, encoded, and final files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seconds to stream before stopping
    #[arg(short, long)]
    duration: Option<f64>,

    /// Display mode, e.g. hd1080i50, hd1080p25, pal
    #[arg(long, value_parser = parse_display_mode)]
    mode: Option<DisplayMode>,

    /// ffmpeg binary used for the live encode and the final mux
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Skip the raw dump
    #[arg(long)]
    no_raw: bool,

    /// Skip the live encode
    #[arg(long)]
    no_encode: bool,

    /// Stop after capture without muxing
    #[arg(long)]
    skip_finalize: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    profile: CaptureProfile,
    output_dir: PathBuf,
    write_raw: bool,
    write_encoded: bool,
    ffmpeg: PathBuf,
    audio_codec: String,
    duration_secs: f64,
    finalize: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            profile: CaptureProfile::default(),
            output_dir: PathBuf::from("capture"),
            write_raw: true,
            write_encoded: true,
            ffmpeg: PathBuf::from("ffmpeg"),
            audio_codec: "libmp3lame".to_string(),
            duration_secs: 5.0,
            finalize: true,
        }
    }
}

impl DemoConfig {
    fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing config {}", path.display()))
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(duration) = cli.duration {
            self.duration_secs = duration;
        }
        if let Some(mode) = cli.mode {
            self.profile.display_mode = mode;
        }
        if let Some(ffmpeg) = &cli.ffmpeg {
            self.ffmpeg = ffmpeg.clone();
        }
        self.write_raw &= !cli.no_raw;
        self.write_encoded &= !cli.no_encode;
        self.finalize &= !cli.skip_finalize;
    }

    fn capture_duration(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.duration_secs)
            .with_context(|| format!("invalid capture duration {}s", self.duration_secs))
    }

    fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            profile: self.profile,
            write_raw: self.write_raw,
            write_encoded: self.write_encoded,
            artifacts: FinalizeArtifacts::in_dir(&self.output_dir),
            launcher: Arc::new(FfmpegLauncher::new(&self.ffmpeg)),
            muxer: FinalizeMuxer::new(&self.ffmpeg).with_audio_codec(self.audio_codec.clone()),
        }
    }
}

fn parse_display_mode(value: &str) -> Result<DisplayMode, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown display mode: {}", value))
}

/// Log session events until the session goes away.
fn report(events: Receiver<SessionEvent>) {
    for event in events {
        match event {
            SessionEvent::StateChanged(state) => log::info!("Session {}", state),
            SessionEvent::FrameDelivered { frame_count } if frame_count % PROGRESS_EVERY == 0 => {
                log::info!("{} frames captured", frame_count)
            }
            SessionEvent::FrameDropped { dropped_frames } => log::warn!("{} frames dropped", dropped_frames),
            SessionEvent::SinkFailed(e) => log::warn!("Sink failure: {}", e),
            SessionEvent::InputFormatChanged(mode) => log::info!("Input format changed to {:?}", mode),
            SessionEvent::Error(e) => log::error!("{}", e),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    config.apply(&cli);
    let duration = config.capture_duration()?;

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let mut controller = CaptureController::new(SyntheticDevice::new(), config.controller_options())?;
    let events = controller.session().subscribe();
    let reporter = thread::Builder::new()
        .name("event-reporter".into())
        .spawn(move || report(events))
        .context("spawning event reporter")?;

    log::info!("Capturing from {} for {:.1}s", controller.status().device, config.duration_secs);
    controller.toggle_stream()?;
    thread::sleep(duration);

    if let Err(e) = controller.request_close() {
        log::info!("Close refused: {}", e);
    }
    let status = controller.status();
    controller.toggle_stream()?;
    log::info!(
        "Stopped after {} frames ({} previews, {} dropped)",
        status.frame_count,
        status.preview_count,
        controller.status().dropped_frames
    );

    if config.finalize {
        let result = controller.finalize()?;
        println!("{}", serde_json::to_string_pretty(&result.metadata)?);
    }

    controller.request_close()?;
    drop(controller);
    let _ = reporter.join();
    Ok(())
}
