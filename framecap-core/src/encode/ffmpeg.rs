//! ffmpeg-backed live encoder.
//!
//! Raw frames are piped into ffmpeg's stdin and the H.264 elementary stream
//! it writes to stdout is redirected straight into the encoded-video file:
//!
//! ```text
//! [LiveEncodeSink] → stdin → ffmpeg -f rawvideo ... -f h264 pipe:1 → stdout → out_video.h264
//! ```

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::models::error::CaptureError;
use crate::models::profile::CaptureProfile;
use crate::traits::live_encoder::{EncoderLauncher, LiveEncodeProcess};

const SINK_NAME: &str = "live-encode";

/// Launches `ffmpeg` processes that encode raw video to H.264.
#[derive(Debug, Clone)]
pub struct FfmpegLauncher {
    binary: PathBuf,
    video_codec: String,
    preset: Option<String>,
}

impl FfmpegLauncher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            video_codec: "libx264".to_string(),
            preset: None,
        }
    }

    pub fn with_video_codec(mut self, codec: String) -> Self {
        self.video_codec = codec;
        self
    }

    pub fn with_preset(mut self, preset: Option<String>) -> Self {
        self.preset = preset;
        self
    }

    /// Arguments for encoding `profile`'s raw video from stdin to stdout.
    pub fn build_args(&self, profile: &CaptureProfile) -> Vec<String> {
        let mode = &profile.display_mode;
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(), "error".to_string(),
            "-f".to_string(), "rawvideo".to_string(),
            "-pix_fmt".to_string(), profile.pixel_format.ffmpeg_pix_fmt().to_string(),
            "-video_size".to_string(), mode.video_size(),
            "-framerate".to_string(), mode.ffmpeg_frame_rate(),
            "-i".to_string(), "pipe:0".to_string(),
            "-c:v".to_string(), self.video_codec.clone(),
        ];

        if let Some(preset) = &self.preset {
            args.push("-preset".to_string());
            args.push(preset.clone());
        }

        args.extend([
            "-f".to_string(), "h264".to_string(),
            "pipe:1".to_string(),
        ]);
        args
    }
}

impl Default for FfmpegLauncher {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl EncoderLauncher for FfmpegLauncher {
    fn launch(&self, profile: &CaptureProfile, output: File) -> Result<Box<dyn LiveEncodeProcess>, CaptureError> {
        let mut command = Command::new(&self.binary);
        command.args(self.build_args(profile));
        log::info!(
            "Starting live encoder: {} {} ({}, {})",
            self.binary.display(),
            self.video_codec,
            profile.display_mode.video_size(),
            profile.pixel_format.ffmpeg_pix_fmt()
        );
        Ok(Box::new(FfmpegLiveEncode::spawn(command, output)?))
    }
}

/// A running encoder process with its stdin held open for frame data.
pub struct FfmpegLiveEncode {
    child: Child,
    stdin: Option<ChildStdin>,
    bytes_written: u64,
}

impl FfmpegLiveEncode {
    /// Spawn `command` with a piped stdin and stdout redirected into `output`.
    pub fn spawn(mut command: Command, output: File) -> Result<Self, CaptureError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::from(output))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CaptureError::SinkOpen {
                sink: SINK_NAME.to_string(),
                reason: format!("failed to spawn encoder: {}", e),
            })?;

        let stdin = child.stdin.take();
        Ok(Self {
            child,
            stdin,
            bytes_written: 0,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl LiveEncodeProcess for FfmpegLiveEncode {
    fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| CaptureError::SinkClosed(SINK_NAME.to_string()))?;

        stdin.write_all(data).map_err(|e| CaptureError::SinkWrite {
            sink: SINK_NAME.to_string(),
            reason: e.to_string(),
        })?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(stdin) = self.stdin.take() else {
            return Ok(());
        };
        // EOF on stdin lets the encoder flush and exit.
        drop(stdin);

        let status = self.child.wait().map_err(|e| CaptureError::SinkWrite {
            sink: SINK_NAME.to_string(),
            reason: format!("failed waiting for encoder: {}", e),
        })?;

        if !status.success() {
            return Err(CaptureError::SinkWrite {
                sink: SINK_NAME.to_string(),
                reason: format!("encoder exited with {}", status),
            });
        }

        log::info!("Live encoder finished after {} input bytes", self.bytes_written);
        Ok(())
    }
}

impl Drop for FfmpegLiveEncode {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
