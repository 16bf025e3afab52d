//! Fakes shared by the session and controller tests.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::media::{DeviceInfo, DisplayMode, ModeSupport, PixelFormat, VideoInputFlags};
use crate::models::profile::{AudioFormat, CaptureProfile};
use crate::session::frame_path::FrameHandler;
use crate::traits::device::{DeviceCapability, FrameSource};
use crate::traits::live_encoder::{EncoderLauncher, LiveEncodeProcess};

/// Device that records every control call and can be told to fail one.
pub(crate) struct FakeDevice {
    pub(crate) support: ModeSupport,
    pub(crate) fail_on: Option<&'static str>,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    pub(crate) handler: Arc<Mutex<Option<FrameHandler>>>,
}

impl FakeDevice {
    pub(crate) fn new() -> Self {
        Self {
            support: ModeSupport::Supported,
            fail_on: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            handler: Arc::new(Mutex::new(None)),
        }
    }

    fn step(&self, call: &'static str, detail: String) -> Result<(), CaptureError> {
        self.calls.lock().push(if detail.is_empty() {
            call.to_string()
        } else {
            format!("{}:{}", call, detail)
        });
        if self.fail_on == Some(call) {
            return Err(CaptureError::DeviceConfig(format!("{} rejected", call)));
        }
        Ok(())
    }
}

impl DeviceCapability for FakeDevice {
    fn supports(&self, _mode: DisplayMode, _pixel_format: PixelFormat, _flags: VideoInputFlags) -> ModeSupport {
        self.support
    }

    fn enable_video_input(
        &mut self,
        mode: DisplayMode,
        _pixel_format: PixelFormat,
        _flags: VideoInputFlags,
    ) -> Result<(), CaptureError> {
        self.step("enable_video", format!("{:?}", mode))
    }

    fn enable_audio_input(&mut self, format: AudioFormat) -> Result<(), CaptureError> {
        self.step("enable_audio", format.sample_rate.to_string())
    }

    fn start_streams(&mut self) -> Result<(), CaptureError> {
        self.step("start_streams", String::new())
    }

    fn stop_streams(&mut self) -> Result<(), CaptureError> {
        self.step("stop_streams", String::new())
    }

    fn disable_video_input(&mut self) -> Result<(), CaptureError> {
        self.step("disable_video", String::new())
    }

    fn disable_audio_input(&mut self) -> Result<(), CaptureError> {
        self.step("disable_audio", String::new())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            display_name: "Fake".into(),
            model_name: "Fake".into(),
        }
    }
}

impl FrameSource for FakeDevice {
    fn attach(&mut self, handler: FrameHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn detach(&mut self) {
        *self.handler.lock() = None;
    }
}

/// What a [`RecordingLauncher`]'s encoders have seen.
#[derive(Default)]
pub(crate) struct EncoderLog {
    pub(crate) bytes: Vec<u8>,
    pub(crate) writes: usize,
    pub(crate) launches: usize,
    pub(crate) stops: usize,
}

struct RecordingProcess {
    log: Arc<Mutex<EncoderLog>>,
    fail_writes: bool,
}

impl LiveEncodeProcess for RecordingProcess {
    fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if self.fail_writes {
            return Err(CaptureError::SinkWrite {
                sink: "live-encode".into(),
                reason: "broken pipe".into(),
            });
        }
        let mut log = self.log.lock();
        log.bytes.extend_from_slice(data);
        log.writes += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.log.lock().stops += 1;
        Ok(())
    }
}

/// Launcher whose encoders record writes in memory.
#[derive(Default)]
pub(crate) struct RecordingLauncher {
    pub(crate) log: Arc<Mutex<EncoderLog>>,
    pub(crate) fail_launch: bool,
    pub(crate) fail_writes: bool,
}

impl EncoderLauncher for RecordingLauncher {
    fn launch(&self, _profile: &CaptureProfile, _output: File) -> Result<Box<dyn LiveEncodeProcess>, CaptureError> {
        if self.fail_launch {
            return Err(CaptureError::SinkOpen {
                sink: "live-encode".into(),
                reason: "encoder unavailable".into(),
            });
        }
        self.log.lock().launches += 1;
        Ok(Box::new(RecordingProcess {
            log: Arc::clone(&self.log),
            fail_writes: self.fail_writes,
        }))
    }
}

/// A fresh, empty directory under the system temp dir.
pub(crate) fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("framecap_test_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A muxer backed by a shell script that writes `muxed` to its last argument.
#[cfg(unix)]
pub(crate) fn fake_muxer(dir: &std::path::Path) -> crate::finalize::muxer::FinalizeMuxer {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-mux.sh");
    std::fs::write(&script, "#!/bin/sh\nfor last; do :; done\nprintf 'muxed' > \"$last\"\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    crate::finalize::muxer::FinalizeMuxer::new(script)
}
