//! Software capture device.
//!
//! Behaves like a hardware capture card from the session's point of view:
//! inputs are enabled, streams started, and frames arrive on a dedicated
//! thread at the mode's frame rate until the streams are stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use framecap_core::models::error::CaptureError;
use framecap_core::models::media::{DeviceInfo, DisplayMode, ModeSupport, PixelFormat, VideoInputFlags};
use framecap_core::models::profile::AudioFormat;
use framecap_core::session::frame_path::FrameHandler;
use framecap_core::traits::device::{DeviceCapability, FrameSource};

use crate::generator::FrameGenerator;

/// How frames are produced once streams are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// A generator thread delivers frames at the mode's frame rate.
    RealTime,
    /// Frames are only delivered by explicit [`SyntheticDevice::deliver_once`] calls.
    Manual,
}

/// Control call that an injected fault makes fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    EnableVideo,
    EnableAudio,
    StartStreams,
    StopStreams,
}

#[derive(Debug, Clone, Copy)]
struct VideoInput {
    mode: DisplayMode,
    pixel_format: PixelFormat,
    flags: VideoInputFlags,
}

/// Per-stream generation state, shared by the generator thread and
/// `deliver_once`.
struct Stream {
    generator: FrameGenerator,
    with_audio: bool,
    /// Mode announced before the first frame when format detection sees a
    /// signal other than the enabled mode.
    announce: Option<DisplayMode>,
}

impl Stream {
    fn emit(&mut self, handler: &FrameHandler) {
        if self.generator.sequence() == 0 {
            if let Some(mode) = self.announce {
                handler.on_input_format_changed(mode);
            }
        }
        let with_audio = self.with_audio;
        let (video, audio) = self.generator.next_frame();
        handler.on_frame_arrived(Some(video), with_audio.then_some(audio));
        handler.on_preview_frame();
    }
}

/// A capture device that synthesizes its input.
///
/// Video frames are flat fields whose level changes every frame; audio is a
/// 1 kHz tone in the enabled format.
pub struct SyntheticDevice {
    info: DeviceInfo,
    supported_modes: Vec<DisplayMode>,
    supported_pixel_formats: Vec<PixelFormat>,
    signal_mode: Option<DisplayMode>,
    pacing: Pacing,
    failure: Option<FailurePoint>,
    video: Option<VideoInput>,
    audio: Option<AudioFormat>,
    handler: Arc<Mutex<Option<FrameHandler>>>,
    stream: Arc<Mutex<Option<Stream>>>,
    running: Arc<AtomicBool>,
    generator_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl SyntheticDevice {
    /// A device that supports every mode and pixel format, paced in real time.
    pub fn new() -> Self {
        Self {
            info: DeviceInfo {
                display_name: "Synthetic Capture".into(),
                model_name: "Synthetic".into(),
            },
            supported_modes: Vec::new(),
            supported_pixel_formats: Vec::new(),
            signal_mode: None,
            pacing: Pacing::RealTime,
            failure: None,
            video: None,
            audio: None,
            handler: Arc::new(Mutex::new(None)),
            stream: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            generator_handle: Mutex::new(None),
        }
    }

    /// Restrict the accepted display modes. Empty accepts all.
    pub fn with_supported_modes(mut self, modes: Vec<DisplayMode>) -> Self {
        self.supported_modes = modes;
        self
    }

    /// Restrict the accepted pixel formats. Empty accepts all.
    pub fn with_supported_pixel_formats(mut self, formats: Vec<PixelFormat>) -> Self {
        self.supported_pixel_formats = formats;
        self
    }

    /// Pretend the incoming signal is `mode`, whatever mode is enabled.
    pub fn with_signal_mode(mut self, mode: DisplayMode) -> Self {
        self.signal_mode = Some(mode);
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_failure(mut self, failure: FailurePoint) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_info(mut self, display_name: &str, model_name: &str) -> Self {
        self.info = DeviceInfo {
            display_name: display_name.into(),
            model_name: model_name.into(),
        };
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Synchronously deliver the next frame to the attached handler.
    ///
    /// Returns `false` when streams are not running or nothing is attached.
    pub fn deliver_once(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(handler) = self.handler.lock().clone() else {
            return false;
        };
        match self.stream.lock().as_mut() {
            Some(stream) => {
                stream.emit(&handler);
                true
            }
            None => false,
        }
    }

    fn check_failure(&self, point: FailurePoint) -> Result<(), CaptureError> {
        if self.failure == Some(point) {
            return Err(CaptureError::DeviceConfig(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn ensure_stopped(&self, what: &str) -> Result<(), CaptureError> {
        if self.is_running() {
            return Err(CaptureError::DeviceConfig(format!("cannot {} while streams are running", what)));
        }
        Ok(())
    }

    fn halt_generator(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.generator_handle.lock().take() {
            let _ = handle.join();
        }
        *self.stream.lock() = None;
    }
}

impl Default for SyntheticDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCapability for SyntheticDevice {
    fn supports(&self, mode: DisplayMode, pixel_format: PixelFormat, _flags: VideoInputFlags) -> ModeSupport {
        if !self.supported_modes.is_empty() && !self.supported_modes.contains(&mode) {
            return ModeSupport::DisplayModeNotSupported;
        }
        if !self.supported_pixel_formats.is_empty() && !self.supported_pixel_formats.contains(&pixel_format) {
            return ModeSupport::NotSupported;
        }
        ModeSupport::Supported
    }

    fn enable_video_input(
        &mut self,
        mode: DisplayMode,
        pixel_format: PixelFormat,
        flags: VideoInputFlags,
    ) -> Result<(), CaptureError> {
        self.ensure_stopped("enable video input")?;
        self.check_failure(FailurePoint::EnableVideo)?;
        if self.supports(mode, pixel_format, flags) != ModeSupport::Supported {
            return Err(CaptureError::DeviceConfig(format!(
                "{:?} in {:?} is not supported",
                mode, pixel_format
            )));
        }
        self.video = Some(VideoInput {
            mode,
            pixel_format,
            flags,
        });
        Ok(())
    }

    fn enable_audio_input(&mut self, format: AudioFormat) -> Result<(), CaptureError> {
        self.ensure_stopped("enable audio input")?;
        self.check_failure(FailurePoint::EnableAudio)?;
        format.validate().map_err(CaptureError::DeviceConfig)?;
        self.audio = Some(format);
        Ok(())
    }

    fn start_streams(&mut self) -> Result<(), CaptureError> {
        self.ensure_stopped("start streams")?;
        let video = self
            .video
            .ok_or_else(|| CaptureError::DeviceConfig("video input is not enabled".into()))?;
        self.check_failure(FailurePoint::StartStreams)?;

        let announce = self
            .signal_mode
            .filter(|signal| video.flags.enable_format_detection && *signal != video.mode);
        *self.stream.lock() = Some(Stream {
            generator: FrameGenerator::new(video.mode, video.pixel_format, self.audio.unwrap_or_default()),
            with_audio: self.audio.is_some(),
            announce,
        });
        self.running.store(true, Ordering::SeqCst);

        if self.pacing == Pacing::Manual {
            return Ok(());
        }

        let (num, den) = video.mode.frame_rate();
        let interval = Duration::from_nanos(1_000_000_000 * den as u64 / num as u64);
        let running = Arc::clone(&self.running);
        let handler = Arc::clone(&self.handler);
        let stream = Arc::clone(&self.stream);

        let handle = thread::Builder::new()
            .name("synthetic-capture".into())
            .spawn(move || {
                generator_loop(&running, &handler, &stream, interval);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::DeviceConfig(format!("failed to spawn generator thread: {}", e))
            })?;

        *self.generator_handle.lock() = Some(handle);
        log::info!("Synthetic streams started: {:?} every {:?}", video.mode, interval);
        Ok(())
    }

    fn stop_streams(&mut self) -> Result<(), CaptureError> {
        if !self.is_running() {
            return Ok(());
        }
        self.halt_generator();
        log::info!("Synthetic streams stopped");
        self.check_failure(FailurePoint::StopStreams)
    }

    fn disable_video_input(&mut self) -> Result<(), CaptureError> {
        self.ensure_stopped("disable video input")?;
        self.video = None;
        Ok(())
    }

    fn disable_audio_input(&mut self) -> Result<(), CaptureError> {
        self.ensure_stopped("disable audio input")?;
        self.audio = None;
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        self.info.clone()
    }
}

impl FrameSource for SyntheticDevice {
    fn attach(&mut self, handler: FrameHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn detach(&mut self) {
        *self.handler.lock() = None;
    }
}

impl Drop for SyntheticDevice {
    fn drop(&mut self) {
        self.halt_generator();
    }
}

/// Deliver frames on a fixed cadence until `running` clears.
///
/// A late frame does not cause a burst of catch-up frames; the schedule
/// restarts from now.
fn generator_loop(
    running: &AtomicBool,
    handler: &Mutex<Option<FrameHandler>>,
    stream: &Mutex<Option<Stream>>,
    interval: Duration,
) {
    let mut next = Instant::now();
    while running.load(Ordering::SeqCst) {
        let current = handler.lock().clone();
        if let Some(handler) = current {
            if let Some(stream) = stream.lock().as_mut() {
                stream.emit(&handler);
            }
        }

        next += interval;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            log::trace!("Synthetic generator running late by {:?}", now - next);
            next = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    use framecap_core::models::profile::CaptureProfile;
    use framecap_core::models::state::SessionState;
    use framecap_core::session::capture::CaptureSession;
    use framecap_core::session::events::SessionEvent;
    use framecap_core::session::sink_plan::{RawCapturePaths, SinkPlan};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("framecap_synthetic_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn raw_plan(dir: &Path) -> SinkPlan {
        SinkPlan {
            raw: Some(RawCapturePaths {
                video: dir.join("out_video.raw"),
                audio: dir.join("out_audio.raw"),
            }),
            live_encode: None,
        }
    }

    #[test]
    fn supports_honours_restrictions() {
        let device = SyntheticDevice::new()
            .with_supported_modes(vec![DisplayMode::Hd1080i50])
            .with_supported_pixel_formats(vec![PixelFormat::Yuv8Bit]);
        let flags = VideoInputFlags::default();

        assert_eq!(
            device.supports(DisplayMode::Hd1080i50, PixelFormat::Yuv8Bit, flags),
            ModeSupport::Supported
        );
        assert_eq!(
            device.supports(DisplayMode::Pal, PixelFormat::Yuv8Bit, flags),
            ModeSupport::DisplayModeNotSupported
        );
        assert_eq!(
            device.supports(DisplayMode::Hd1080i50, PixelFormat::Bgra8Bit, flags),
            ModeSupport::NotSupported
        );
    }

    #[test]
    fn start_requires_video_input() {
        let mut device = SyntheticDevice::new();
        let err = device.start_streams().unwrap_err();
        assert!(matches!(err, CaptureError::DeviceConfig(_)));
        assert!(!device.is_running());
    }

    #[test]
    fn inputs_cannot_change_while_running() {
        let mut device = SyntheticDevice::new().with_pacing(Pacing::Manual);
        device
            .enable_video_input(DisplayMode::Pal, PixelFormat::Yuv8Bit, VideoInputFlags::default())
            .unwrap();
        device.start_streams().unwrap();

        assert!(device.disable_video_input().is_err());
        assert!(device.enable_audio_input(AudioFormat::default()).is_err());

        device.stop_streams().unwrap();
        assert!(device.disable_video_input().is_ok());
    }

    #[test]
    fn deliver_once_outside_streaming_does_nothing() {
        let device = SyntheticDevice::new().with_pacing(Pacing::Manual);
        assert!(!device.deliver_once());
    }

    #[test]
    fn manual_frame_reaches_raw_files() {
        let dir = temp_dir();
        let device = SyntheticDevice::new().with_pacing(Pacing::Manual);
        let mut session = CaptureSession::new(device);
        session.start(CaptureProfile::default(), &raw_plan(&dir)).unwrap();

        assert!(session.device().deliver_once());
        assert_eq!(session.counters().frame_count, 1);
        assert_eq!(session.counters().preview_count, 1);

        session.stop().unwrap();
        assert!(!session.device().is_running());

        // One 1080i50 UYVY frame and 1/25 s of 48 kHz stereo 32-bit audio.
        assert_eq!(fs::metadata(dir.join("out_video.raw")).unwrap().len(), 4_147_200);
        assert_eq!(fs::metadata(dir.join("out_audio.raw")).unwrap().len(), 1920 * 8);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn real_time_generator_streams_until_stopped() {
        let dir = temp_dir();
        let profile = CaptureProfile {
            display_mode: DisplayMode::Ntsc,
            ..Default::default()
        };
        let mut session = CaptureSession::new(SyntheticDevice::new());
        session.start(profile, &raw_plan(&dir)).unwrap();

        thread::sleep(Duration::from_millis(300));
        let delivered = session.counters().frame_count;
        assert!(delivered > 0);

        session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.device().is_running());

        let frame_len = profile.video_frame_len() as u64;
        let video_len = fs::metadata(dir.join("out_video.raw")).unwrap().len();
        assert!(video_len >= delivered * frame_len);
        assert_eq!(video_len % frame_len, 0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn injected_start_failure_leaves_device_stopped() {
        let dir = temp_dir();
        let device = SyntheticDevice::new().with_failure(FailurePoint::StartStreams);
        let mut session = CaptureSession::new(device);

        let err = session.start(CaptureProfile::default(), &raw_plan(&dir)).unwrap_err();

        assert!(matches!(err, CaptureError::DeviceConfig(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.device().is_running());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn mismatched_signal_is_announced_before_first_frame() {
        let dir = temp_dir();
        let device = SyntheticDevice::new()
            .with_pacing(Pacing::Manual)
            .with_signal_mode(DisplayMode::Hd1080p25);
        let mut session = CaptureSession::new(device);
        let events = session.subscribe();
        session.start(CaptureProfile::default(), &raw_plan(&dir)).unwrap();

        session.device().deliver_once();
        session.device().deliver_once();

        let changes: Vec<SessionEvent> = events
            .try_iter()
            .filter(|e| matches!(e, SessionEvent::InputFormatChanged(_)))
            .collect();
        assert_eq!(changes, vec![SessionEvent::InputFormatChanged(DisplayMode::Hd1080p25)]);

        session.stop().unwrap();
        fs::remove_dir_all(&dir).ok();
    }
}
