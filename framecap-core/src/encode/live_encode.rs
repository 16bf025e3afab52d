use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::frame::{Frame, FrameKind};
use crate::models::profile::CaptureProfile;
use crate::traits::frame_sink::FrameSink;
use crate::traits::live_encoder::{EncoderLauncher, LiveEncodeProcess};

const SINK_NAME: &str = "live-encode";

/// Streams raw video frames into a running live encoder.
///
/// Writes are synchronous: when the encoder falls behind, `accept` blocks
/// and capture is paced by encode throughput. Audio frames are never sent
/// here. The output is an elementary stream, not a playable container,
/// until it goes through `FinalizeMuxer`.
pub struct LiveEncodeSink {
    process: Option<Box<dyn LiveEncodeProcess>>,
    output_path: PathBuf,
    frames_written: u64,
}

impl LiveEncodeSink {
    /// Create (truncating) `output_path` and launch an encoder writing into it.
    pub fn open(profile: &CaptureProfile, output_path: PathBuf, launcher: &dyn EncoderLauncher) -> Result<Self, CaptureError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CaptureError::SinkOpen {
                sink: SINK_NAME.to_string(),
                reason: format!("failed to create directory {}: {}", parent.display(), e),
            })?;
        }

        let output = File::create(&output_path).map_err(|e| CaptureError::SinkOpen {
            sink: SINK_NAME.to_string(),
            reason: format!("failed to create {}: {}", output_path.display(), e),
        })?;

        let process = launcher.launch(profile, output)?;
        log::info!("{} sink opened, encoding to {}", SINK_NAME, output_path.display());

        Ok(Self {
            process: Some(process),
            output_path,
            frames_written: 0,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for LiveEncodeSink {
    fn name(&self) -> &str {
        SINK_NAME
    }

    fn accepts(&self, kind: FrameKind) -> bool {
        kind == FrameKind::Video
    }

    fn accept(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        let process = self
            .process
            .as_mut()
            .ok_or_else(|| CaptureError::SinkClosed(SINK_NAME.to_string()))?;

        process.write(frame.data())?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        process.stop()?;
        log::info!(
            "{} sink closed after {} frames: {}",
            SINK_NAME,
            self.frames_written,
            self.output_path.display()
        );
        Ok(())
    }
}
