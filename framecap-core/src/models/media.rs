use serde::{Deserialize, Serialize};

/// Video timing and geometry mode requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Ntsc,
    Pal,
    Hd720p50,
    Hd1080i50,
    Hd1080i5994,
    Hd1080p25,
    Hd1080p30,
}

impl DisplayMode {
    pub fn width(&self) -> u32 {
        match self {
            Self::Ntsc | Self::Pal => 720,
            Self::Hd720p50 => 1280,
            _ => 1920,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Ntsc => 486,
            Self::Pal => 576,
            Self::Hd720p50 => 720,
            _ => 1080,
        }
    }

    /// Frame rate as a rational `(numerator, denominator)`.
    ///
    /// Interlaced modes report the frame rate, not the field rate.
    pub fn frame_rate(&self) -> (u32, u32) {
        match self {
            Self::Ntsc | Self::Hd1080i5994 => (30000, 1001),
            Self::Pal | Self::Hd1080i50 | Self::Hd1080p25 => (25, 1),
            Self::Hd720p50 => (50, 1),
            Self::Hd1080p30 => (30, 1),
        }
    }

    /// Frame rate formatted the way ffmpeg's `-framerate` expects it.
    pub fn ffmpeg_frame_rate(&self) -> String {
        match self.frame_rate() {
            (num, 1) => num.to_string(),
            (num, den) => format!("{}/{}", num, den),
        }
    }

    /// `WxH` geometry string.
    pub fn video_size(&self) -> String {
        format!("{}x{}", self.width(), self.height())
    }
}

/// Pixel layout of captured video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit 4:2:2 YUV, UYVY ordering.
    Yuv8Bit,
    /// 10-bit 4:2:2 YUV, v210 packing.
    Yuv10Bit,
    Argb8Bit,
    Bgra8Bit,
}

impl PixelFormat {
    /// Unpadded row length for a frame of `width` pixels.
    pub fn row_bytes(&self, width: u32) -> usize {
        let width = width as usize;
        match self {
            Self::Yuv8Bit => width * 2,
            // v210 packs 6 pixels into 16 bytes and rows are 128-byte aligned.
            Self::Yuv10Bit => width.div_ceil(48) * 128,
            Self::Argb8Bit | Self::Bgra8Bit => width * 4,
        }
    }

    /// The matching ffmpeg `-pix_fmt` name.
    pub fn ffmpeg_pix_fmt(&self) -> &'static str {
        match self {
            Self::Yuv8Bit => "uyvy422",
            Self::Yuv10Bit => "v210",
            Self::Argb8Bit => "argb",
            Self::Bgra8Bit => "bgra",
        }
    }
}

/// Flags passed alongside the mode when enabling video input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoInputFlags {
    pub enable_format_detection: bool,
}

impl Default for VideoInputFlags {
    fn default() -> Self {
        Self {
            enable_format_detection: true,
        }
    }
}

/// Result of asking the device whether it can capture a given mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSupport {
    Supported,
    NotSupported,
    DisplayModeNotSupported,
}

/// Identity of the capture device backing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub display_name: String,
    pub model_name: String,
}

impl DeviceInfo {
    /// Display name, with the model appended when the two differ.
    pub fn label(&self) -> String {
        if self.display_name == self.model_name {
            self.display_name.clone()
        } else {
            format!("{} ({})", self.display_name, self.model_name)
        }
    }
}
