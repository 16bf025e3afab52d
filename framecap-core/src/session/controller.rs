//! Thin control surface over a [`CaptureSession`].
//!
//! Maps the operator actions (stream toggle, finalize, close) onto the
//! session and checks the preconditions each one has.

use std::fs;
use std::sync::Arc;

use crate::encode::ffmpeg::FfmpegLauncher;
use crate::finalize::muxer::FinalizeMuxer;
use crate::models::error::CaptureError;
use crate::models::profile::{CaptureProfile, FinalizeArtifacts};
use crate::models::recording_result::RecordingResult;
use crate::models::state::SessionState;
use crate::session::capture::CaptureSession;
use crate::session::sink_plan::{LiveEncodePlan, RawCapturePaths, SinkPlan};
use crate::traits::device::CaptureDevice;
use crate::traits::live_encoder::EncoderLauncher;

/// What a controller captures, where it writes, and how it encodes and muxes.
#[derive(Clone)]
pub struct ControllerOptions {
    pub profile: CaptureProfile,
    /// Dump raw video and audio frames to `artifacts.raw_video` / `raw_audio`.
    pub write_raw: bool,
    /// Live encode video into `artifacts.encoded_video`.
    pub write_encoded: bool,
    pub artifacts: FinalizeArtifacts,
    pub launcher: Arc<dyn EncoderLauncher>,
    pub muxer: FinalizeMuxer,
}

impl ControllerOptions {
    /// Sinks a streaming cycle opens under these options.
    pub fn sink_plan(&self) -> SinkPlan {
        SinkPlan {
            raw: self.write_raw.then(|| RawCapturePaths {
                video: self.artifacts.raw_video.clone(),
                audio: self.artifacts.raw_audio.clone(),
            }),
            live_encode: self.write_encoded.then(|| LiveEncodePlan {
                output: self.artifacts.encoded_video.clone(),
                launcher: Arc::clone(&self.launcher),
            }),
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            profile: CaptureProfile::default(),
            write_raw: true,
            write_encoded: true,
            artifacts: FinalizeArtifacts::default(),
            launcher: Arc::new(FfmpegLauncher::default()),
            muxer: FinalizeMuxer::default(),
        }
    }
}

/// Snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub device: String,
    pub state: SessionState,
    pub frame_count: u64,
    pub preview_count: u64,
    pub dropped_frames: u64,
    pub completed_cycles: u64,
    pub last_error: Option<String>,
}

pub struct CaptureController<D: CaptureDevice> {
    session: CaptureSession<D>,
    options: ControllerOptions,
}

impl<D: CaptureDevice> CaptureController<D> {
    pub fn new(device: D, options: ControllerOptions) -> Result<Self, CaptureError> {
        options.profile.validate()?;
        Ok(Self {
            session: CaptureSession::new(device),
            options,
        })
    }

    pub fn session(&self) -> &CaptureSession<D> {
        &self.session
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Replace the options used by the next start. Refused while streaming.
    pub fn set_options(&mut self, options: ControllerOptions) -> Result<(), CaptureError> {
        if self.session.is_streaming() {
            return Err(CaptureError::InvalidState(
                "options cannot change while streaming".to_string(),
            ));
        }
        options.profile.validate()?;
        self.options = options;
        Ok(())
    }

    /// Start when idle, stop when streaming. Returns the resulting state.
    pub fn toggle_stream(&mut self) -> Result<SessionState, CaptureError> {
        if self.session.is_streaming() {
            self.stop()?;
        } else {
            self.start()?;
        }
        Ok(self.session.state())
    }

    pub fn start(&mut self) -> Result<(), CaptureError> {
        let plan = self.options.sink_plan();
        if plan.is_empty() {
            log::warn!("Starting with no sinks enabled; frames will only be counted");
        }
        self.session.start(self.options.profile, &plan)
    }

    pub fn stop(&mut self) -> Result<(), CaptureError> {
        self.session.stop()
    }

    /// Build the WAV from the raw audio capture and mux it with the encoded
    /// video into `artifacts.output`.
    ///
    /// Only valid once a streaming cycle has completed and the session is
    /// idle, so every sink of that cycle has been flushed and closed.
    pub fn finalize(&self) -> Result<RecordingResult, CaptureError> {
        let state = self.session.state();
        if !state.is_idle() {
            return Err(CaptureError::InvalidState(format!(
                "finalize requires an idle session (currently {})",
                state
            )));
        }
        if self.session.completed_cycles() == 0 {
            return Err(CaptureError::InvalidState(
                "nothing has been captured yet".to_string(),
            ));
        }

        let artifacts = &self.options.artifacts;
        let raw_audio = fs::read(&artifacts.raw_audio).map_err(|e| {
            CaptureError::Mux(format!(
                "raw audio {} unavailable: {}",
                artifacts.raw_audio.display(),
                e
            ))
        })?;

        // The recorded cycle's format, not whatever the options say now.
        let format = self
            .session
            .profile()
            .map_or(self.options.profile.audio, |p| p.audio);

        self.options.muxer.finalize(
            &artifacts.encoded_video,
            &raw_audio,
            &format,
            &artifacts.wav_audio,
            &artifacts.output,
        )
    }

    /// Whether the application may close now. Refused while streaming.
    pub fn request_close(&self) -> Result<(), CaptureError> {
        if self.session.is_streaming() {
            log::warn!("Close requested while streaming; stop the stream first");
            return Err(CaptureError::CloseRefused);
        }
        Ok(())
    }

    pub fn status(&self) -> ControllerStatus {
        let counters = self.session.counters();
        ControllerStatus {
            device: self.session.device_info().label(),
            state: self.session.state(),
            frame_count: counters.frame_count,
            preview_count: counters.preview_count,
            dropped_frames: counters.dropped_frames,
            completed_cycles: self.session.completed_cycles(),
            last_error: self.session.last_error(),
        }
    }
}
