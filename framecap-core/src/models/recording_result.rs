use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::profile::AudioFormat;

/// Result returned when finalize produces the deliverable file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub metadata: RecordingMetadata,
    pub checksum: String,
}

/// Metadata written as a JSON sidecar next to the deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub checksum: String,
    pub video_codec: String,
    pub video_passthrough: bool,
    pub audio_codec: String,
    pub audio_sample_rate: u32,
    pub audio_channels: u16,
    pub audio_bit_depth: u16,
}

impl RecordingMetadata {
    /// Metadata for an H.264 stream muxed with re-encoded audio.
    pub fn new_h264(file_path: &str, checksum: &str, audio_codec: &str, audio: &AudioFormat) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            video_codec: "h264".to_string(),
            video_passthrough: true,
            audio_codec: audio_codec.to_string(),
            audio_sample_rate: audio.sample_rate,
            audio_channels: audio.channels,
            audio_bit_depth: audio.bit_depth,
        }
    }
}
