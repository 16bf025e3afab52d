use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::media::{DisplayMode, PixelFormat, VideoInputFlags};

/// Highest sample rate a capture profile accepts, in Hz.
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// PCM layout of the captured audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Bits per sample (default: 32). Valid values: 16, 32.
    pub bit_depth: u16,

    /// Interleaved channel count (default: 2). Valid values: 2, 8, 16.
    pub channels: u16,
}

impl AudioFormat {
    pub fn bytes_per_sample(&self) -> usize {
        self.bit_depth as usize / 8
    }

    /// Bytes per interleaved sample frame (WAV block align).
    pub fn block_align(&self) -> usize {
        self.channels as usize * self.bytes_per_sample()
    }

    /// Byte length of a packet holding `sample_frames` interleaved frames.
    pub fn packet_len(&self, sample_frames: usize) -> usize {
        sample_frames * self.block_align()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(format!(
                "sample rate {} Hz exceeds the {} Hz limit",
                self.sample_rate, MAX_SAMPLE_RATE
            ));
        }
        if ![16, 32].contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if ![2, 8, 16].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            bit_depth: 32,
            channels: 2,
        }
    }
}

/// Fixed capture configuration for one streaming cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProfile {
    pub display_mode: DisplayMode,
    pub pixel_format: PixelFormat,
    #[serde(default)]
    pub input_flags: VideoInputFlags,
    #[serde(default)]
    pub audio: AudioFormat,
}

impl CaptureProfile {
    pub fn validate(&self) -> Result<(), CaptureError> {
        self.audio.validate().map_err(CaptureError::Config)
    }

    /// Unpadded video frame size in bytes.
    pub fn video_frame_len(&self) -> usize {
        self.pixel_format.row_bytes(self.display_mode.width()) * self.display_mode.height() as usize
    }
}

impl Default for CaptureProfile {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::Hd1080i50,
            pixel_format: PixelFormat::Yuv8Bit,
            input_flags: VideoInputFlags::default(),
            audio: AudioFormat::default(),
        }
    }
}

/// Filesystem locations of the intermediate and final capture files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeArtifacts {
    pub raw_video: PathBuf,
    pub raw_audio: PathBuf,
    pub encoded_video: PathBuf,
    pub wav_audio: PathBuf,
    pub output: PathBuf,
}

impl FinalizeArtifacts {
    /// Standard file names placed under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            raw_video: dir.join("out_video.raw"),
            raw_audio: dir.join("out_audio.raw"),
            encoded_video: dir.join("out_video.h264"),
            wav_audio: dir.join("out_audio.wav"),
            output: dir.join("out_fin.mp4"),
        }
    }
}

impl Default for FinalizeArtifacts {
    fn default() -> Self {
        Self::in_dir(".")
    }
}
