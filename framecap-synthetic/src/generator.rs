//! Frame and audio-packet synthesis.

use framecap_core::models::frame::{AudioInputPacket, VideoInputFrame};
use framecap_core::models::media::{DisplayMode, PixelFormat};
use framecap_core::models::profile::AudioFormat;

/// Peak amplitude of the test tone as a fraction of full scale.
const TONE_LEVEL: f64 = 0.25;

/// Tone frequency in Hz.
const TONE_HZ: f64 = 1000.0;

/// Produces one video frame plus the audio that spans it, per call.
///
/// Buffers are allocated once and refilled in place.
pub(crate) struct FrameGenerator {
    row_bytes: usize,
    height: usize,
    frame_rate: (u32, u32),
    audio: AudioFormat,
    video_buf: Vec<u8>,
    audio_buf: Vec<u8>,
    sequence: u64,
    samples_emitted: u64,
}

impl FrameGenerator {
    pub(crate) fn new(mode: DisplayMode, pixel_format: PixelFormat, audio: AudioFormat) -> Self {
        let row_bytes = pixel_format.row_bytes(mode.width());
        let height = mode.height() as usize;
        Self {
            row_bytes,
            height,
            frame_rate: mode.frame_rate(),
            audio,
            video_buf: vec![0u8; row_bytes * height],
            audio_buf: Vec::new(),
            sequence: 0,
            samples_emitted: 0,
        }
    }

    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Sample frames that belong to video frame `n`.
    ///
    /// Rounds per frame so the running total matches the audio clock exactly,
    /// e.g. 1601/1602 alternating at 29.97 fps.
    fn samples_for_frame(&self, n: u64) -> u64 {
        let (num, den) = self.frame_rate;
        let rate = self.audio.sample_rate as u64;
        let total = |frames: u64| frames * rate * den as u64 / num as u64;
        total(n + 1) - total(n)
    }

    /// Fill the next frame and return borrowed views of it.
    pub(crate) fn next_frame(&mut self) -> (VideoInputFrame<'_>, AudioInputPacket<'_>) {
        let n = self.sequence;
        self.sequence += 1;

        // Luma ramps with the frame number so consecutive frames differ.
        let level = 16 + (n % 220) as u8;
        self.video_buf.fill(level);

        let samples = self.samples_for_frame(n) as usize;
        self.fill_tone(samples);

        (
            VideoInputFrame::new(self.row_bytes, self.height, &self.video_buf),
            AudioInputPacket::new(samples, &self.audio_buf),
        )
    }

    fn fill_tone(&mut self, samples: usize) {
        let bytes_per_sample = self.audio.bytes_per_sample();
        let channels = self.audio.channels as usize;
        self.audio_buf.clear();
        self.audio_buf.reserve(samples * channels * bytes_per_sample);

        let rate = self.audio.sample_rate as f64;
        for i in 0..samples as u64 {
            let t = (self.samples_emitted + i) as f64 / rate;
            let value = TONE_LEVEL * (2.0 * std::f64::consts::PI * TONE_HZ * t).sin();
            for _ in 0..channels {
                match self.audio.bit_depth {
                    16 => {
                        let sample = (value * i16::MAX as f64) as i16;
                        self.audio_buf.extend_from_slice(&sample.to_le_bytes());
                    }
                    _ => {
                        let sample = (value * i32::MAX as f64) as i32;
                        self.audio_buf.extend_from_slice(&sample.to_le_bytes());
                    }
                }
            }
        }
        self.samples_emitted += samples as u64;
    }
}
