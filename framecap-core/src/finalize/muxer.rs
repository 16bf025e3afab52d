//! Final mux of the encoded video stream with the captured audio.
//!
//! ```text
//! out_audio.raw ─build_wav─→ out_audio.wav ─┐
//! out_video.h264 ───────────────────────────┴─ ffmpeg (-c:v copy -c:a <codec>) ─→ out_fin.mp4
//! ```
//!
//! Intermediates are never removed, whether or not the mux succeeds.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::models::error::CaptureError;
use crate::models::profile::AudioFormat;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::processing::wav_format::build_wav;
use crate::storage::checksum::sha256_file;
use crate::storage::metadata::write_metadata;

/// Lines of the muxer's stderr kept in a `Mux` error.
const STDERR_TAIL_LINES: usize = 5;

/// Runs the external muxer that produces the deliverable container.
#[derive(Debug, Clone)]
pub struct FinalizeMuxer {
    binary: PathBuf,
    audio_codec: String,
}

impl FinalizeMuxer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            audio_codec: "libmp3lame".to_string(),
        }
    }

    pub fn with_audio_codec(mut self, codec: String) -> Self {
        self.audio_codec = codec;
        self
    }

    pub fn audio_codec(&self) -> &str {
        &self.audio_codec
    }

    /// Video is copied as-is; only the audio is re-encoded.
    pub fn build_args(&self, encoded_video: &Path, wav: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-f", "h264", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(encoded_video.into());
        args.push("-i".into());
        args.push(wav.into());
        for arg in ["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a"] {
            args.push(arg.into());
        }
        args.push(self.audio_codec.as_str().into());
        args.push(output.into());
        args
    }

    /// Wrap `raw_audio` into a WAV at `wav_path`, then mux it with
    /// `encoded_video` into `output`.
    ///
    /// Blocks for the whole mux. Fails with `Mux` when the encoded video is
    /// missing, the muxer exits non-zero, or no output appears.
    pub fn finalize(
        &self,
        encoded_video: &Path,
        raw_audio: &[u8],
        format: &AudioFormat,
        wav_path: &Path,
        output: &Path,
    ) -> Result<RecordingResult, CaptureError> {
        if !encoded_video.is_file() {
            return Err(CaptureError::Mux(format!(
                "encoded video {} not found",
                encoded_video.display()
            )));
        }

        let wav = build_wav(raw_audio, format)?;
        fs::write(wav_path, &wav)
            .map_err(|e| CaptureError::Storage(format!("failed to write {}: {}", wav_path.display(), e)))?;
        log::info!("Wrote {} ({} bytes of PCM)", wav_path.display(), raw_audio.len());

        log::info!(
            "Muxing {} + {} -> {} (audio: {})",
            encoded_video.display(),
            wav_path.display(),
            output.display(),
            self.audio_codec
        );
        let result = Command::new(&self.binary)
            .args(self.build_args(encoded_video, wav_path, output))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| CaptureError::Mux(format!("failed to run {}: {}", self.binary.display(), e)))?;

        if !result.status.success() {
            return Err(CaptureError::Mux(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                result.status,
                stderr_tail(&result.stderr)
            )));
        }
        if !output.is_file() {
            return Err(CaptureError::Mux(format!(
                "{} reported success but produced no {}",
                self.binary.display(),
                output.display()
            )));
        }

        let checksum = sha256_file(output)?;
        let size_bytes = fs::metadata(output)
            .map_err(|e| CaptureError::Storage(format!("failed to stat {}: {}", output.display(), e)))?
            .len();
        let metadata = RecordingMetadata::new_h264(&output.to_string_lossy(), &checksum, &self.audio_codec, format);

        if let Err(e) = write_metadata(&metadata, output) {
            log::warn!("Failed to write metadata sidecar: {}", e);
        }

        log::info!("Finalized {} ({} bytes, sha256 {})", output.display(), size_bytes, checksum);
        Ok(RecordingResult {
            output_path: output.to_path_buf(),
            size_bytes,
            metadata,
            checksum,
        })
    }
}

impl Default for FinalizeMuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    if lines.is_empty() {
        "no diagnostic output".to_string()
    } else {
        lines[start..].join("; ")
    }
}
