use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::frame::{Frame, FrameKind};
use crate::traits::frame_sink::FrameSink;

/// Appends raw frame bytes of one media kind to a file.
///
/// ## File Format
///
/// ```text
/// [frame 1 bytes][frame 2 bytes]...
/// ```
///
/// No headers or length prefixes: the file is the exact concatenation of
/// the accepted frames in arrival order. Raw video can be inspected with
/// `ffplay -f rawvideo -pixel_format uyvy422 -video_size 1920x1080 <file>`.
pub struct RawFileSink {
    name: String,
    kind: FrameKind,
    file_path: PathBuf,
    writer: Option<BufWriter<File>>,
    bytes_written: u64,
    frames_written: u64,
}

impl RawFileSink {
    /// Open `file_path` in create-or-append mode.
    pub fn open(kind: FrameKind, file_path: PathBuf) -> Result<Self, CaptureError> {
        let name = match kind {
            FrameKind::Video => "raw-video",
            FrameKind::Audio => "raw-audio",
        }
        .to_string();

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CaptureError::SinkOpen {
                sink: name.clone(),
                reason: format!("failed to create directory {}: {}", parent.display(), e),
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(|e| CaptureError::SinkOpen {
                sink: name.clone(),
                reason: format!("failed to open {}: {}", file_path.display(), e),
            })?;

        log::info!("{} sink opened at {}", name, file_path.display());

        Ok(Self {
            name,
            kind,
            file_path,
            writer: Some(BufWriter::new(file)),
            bytes_written: 0,
            frames_written: 0,
        })
    }

    /// Bytes appended by this sink since it was opened.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl FrameSink for RawFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, kind: FrameKind) -> bool {
        kind == self.kind
    }

    fn accept(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CaptureError::SinkClosed(self.name.clone()))?;

        writer.write_all(frame.data()).map_err(|e| CaptureError::SinkWrite {
            sink: self.name.clone(),
            reason: e.to_string(),
        })?;

        self.bytes_written += frame.len() as u64;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        writer.flush().map_err(|e| CaptureError::SinkWrite {
            sink: self.name.clone(),
            reason: format!("flush failed: {}", e),
        })?;

        log::info!(
            "{} sink closed: {} frames, {} bytes",
            self.name,
            self.frames_written,
            self.bytes_written
        );
        Ok(())
    }
}
