use crate::models::error::CaptureError;
use crate::models::media::{DeviceInfo, DisplayMode, ModeSupport, PixelFormat, VideoInputFlags};
use crate::models::profile::AudioFormat;
use crate::session::frame_path::FrameHandler;

/// Query and streaming control of a capture device.
///
/// Implemented by an adapter around the vendor SDK, or by a software
/// generator in tests. Each control call may fail; the session maps
/// failures during start to `CaptureError::DeviceConfig`.
pub trait DeviceCapability: Send {
    /// Whether the device can capture `mode` in `pixel_format` with `flags`.
    fn supports(&self, mode: DisplayMode, pixel_format: PixelFormat, flags: VideoInputFlags) -> ModeSupport;

    fn enable_video_input(
        &mut self,
        mode: DisplayMode,
        pixel_format: PixelFormat,
        flags: VideoInputFlags,
    ) -> Result<(), CaptureError>;

    fn enable_audio_input(&mut self, format: AudioFormat) -> Result<(), CaptureError>;

    fn start_streams(&mut self) -> Result<(), CaptureError>;

    fn stop_streams(&mut self) -> Result<(), CaptureError>;

    fn disable_video_input(&mut self) -> Result<(), CaptureError>;

    fn disable_audio_input(&mut self) -> Result<(), CaptureError>;

    fn device_info(&self) -> DeviceInfo;
}

/// Emitter of frame-arrival, preview, and format-change notifications.
///
/// The source calls into the attached [`FrameHandler`] from its own
/// real-time thread. Buffers passed to the handler are only valid for the
/// duration of the call.
pub trait FrameSource: Send {
    fn attach(&mut self, handler: FrameHandler);

    /// Stop delivering to the attached handler. Idempotent.
    fn detach(&mut self);
}

/// A device usable by `CaptureSession`.
pub trait CaptureDevice: DeviceCapability + FrameSource {}

impl<T: DeviceCapability + FrameSource> CaptureDevice for T {}
