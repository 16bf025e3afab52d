//! Frame types crossing the device callback boundary.
//!
//! `VideoInputFrame` and `AudioInputPacket` borrow device-owned memory and
//! cannot outlive the callback that produced them. The session copies their
//! bytes into a session-owned [`Frame`] before any sink sees them.

use super::profile::AudioFormat;

/// Media kind of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Video,
    Audio,
}

/// A video frame as handed over by the device, valid only during the callback.
#[derive(Debug, Clone, Copy)]
pub struct VideoInputFrame<'a> {
    /// Bytes per row, including any row padding.
    pub row_bytes: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> VideoInputFrame<'a> {
    pub fn new(row_bytes: usize, height: usize, data: &'a [u8]) -> Self {
        Self {
            row_bytes,
            height,
            data,
        }
    }

    /// Declared frame size: `row_bytes * height`, padding preserved.
    pub fn byte_len(&self) -> usize {
        self.row_bytes * self.height
    }
}

/// An audio packet as handed over by the device, valid only during the callback.
#[derive(Debug, Clone, Copy)]
pub struct AudioInputPacket<'a> {
    pub sample_frame_count: usize,
    pub data: &'a [u8],
}

impl<'a> AudioInputPacket<'a> {
    pub fn new(sample_frame_count: usize, data: &'a [u8]) -> Self {
        Self {
            sample_frame_count,
            data,
        }
    }

    /// Declared packet size for the given PCM layout.
    pub fn byte_len(&self, format: &AudioFormat) -> usize {
        format.packet_len(self.sample_frame_count)
    }
}

/// Session-owned copy of one frame's bytes.
///
/// The session keeps one `Frame` per kind and refills it on every arrival,
/// so steady-state delivery does not allocate.
#[derive(Debug, Clone)]
pub struct Frame {
    kind: FrameKind,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            data: Vec::new(),
        }
    }

    pub fn with_data(kind: FrameKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Replace the contents with the first `len` bytes of `src`.
    ///
    /// Returns the number of bytes copied, which is less than `len` when the
    /// device buffer is shorter than its declared size.
    pub fn fill_from(&mut self, src: &[u8], len: usize) -> usize {
        let copied = len.min(src.len());
        self.data.clear();
        self.data.extend_from_slice(&src[..copied]);
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_len_keeps_row_padding() {
        let buf = vec![0u8; 16];
        let frame = VideoInputFrame::new(8, 2, &buf);
        assert_eq!(frame.byte_len(), 16);
    }

    #[test]
    fn audio_len_follows_format() {
        let buf = vec![0u8; 8192];
        let packet = AudioInputPacket::new(1024, &buf);
        assert_eq!(packet.byte_len(&AudioFormat::default()), 8192);
    }

    #[test]
    fn fill_reuses_buffer_and_truncates_to_len() {
        let mut frame = Frame::new(FrameKind::Video);
        assert_eq!(frame.fill_from(&[1, 2, 3, 4, 5], 3), 3);
        assert_eq!(frame.data(), &[1, 2, 3]);

        assert_eq!(frame.fill_from(&[9, 8], 2), 2);
        assert_eq!(frame.data(), &[9, 8]);
    }

    #[test]
    fn fill_clamps_to_short_source() {
        let mut frame = Frame::new(FrameKind::Audio);
        assert_eq!(frame.fill_from(&[1, 2], 10), 2);
        assert_eq!(frame.len(), 2);
    }
}
