use std::path::PathBuf;
use std::sync::Arc;

use crate::encode::live_encode::LiveEncodeSink;
use crate::models::error::CaptureError;
use crate::models::frame::FrameKind;
use crate::models::profile::CaptureProfile;
use crate::session::frame_path::close_sinks;
use crate::storage::raw_file::RawFileSink;
use crate::traits::frame_sink::FrameSink;
use crate::traits::live_encoder::EncoderLauncher;

/// Raw dump destinations, one file per media kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapturePaths {
    pub video: PathBuf,
    pub audio: PathBuf,
}

/// Live encode destination and the launcher that starts the encoder.
#[derive(Clone)]
pub struct LiveEncodePlan {
    pub output: PathBuf,
    pub launcher: Arc<dyn EncoderLauncher>,
}

/// Which sinks a streaming cycle opens.
///
/// At most one raw pair and one live encoder; both optional.
#[derive(Clone, Default)]
pub struct SinkPlan {
    pub raw: Option<RawCapturePaths>,
    pub live_encode: Option<LiveEncodePlan>,
}

impl SinkPlan {
    pub fn is_empty(&self) -> bool {
        self.raw.is_none() && self.live_encode.is_none()
    }

    /// Open every planned sink.
    ///
    /// On failure, sinks already opened by this call are closed before the
    /// error is returned.
    pub fn open(&self, profile: &CaptureProfile) -> Result<Vec<Box<dyn FrameSink>>, CaptureError> {
        let mut sinks = Vec::new();
        if let Err(e) = self.open_into(&mut sinks, profile) {
            let _ = close_sinks(&mut sinks);
            return Err(e);
        }
        Ok(sinks)
    }

    fn open_into(&self, sinks: &mut Vec<Box<dyn FrameSink>>, profile: &CaptureProfile) -> Result<(), CaptureError> {
        if let Some(raw) = &self.raw {
            sinks.push(Box::new(RawFileSink::open(FrameKind::Video, raw.video.clone())?));
            sinks.push(Box::new(RawFileSink::open(FrameKind::Audio, raw.audio.clone())?));
        }
        if let Some(plan) = &self.live_encode {
            sinks.push(Box::new(LiveEncodeSink::open(
                profile,
                plan.output.clone(),
                plan.launcher.as_ref(),
            )?));
        }
        Ok(())
    }
}
