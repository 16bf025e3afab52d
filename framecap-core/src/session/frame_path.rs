//! The frame-arrival hot path.
//!
//! One `parking_lot::Mutex` serializes frame delivery against teardown and
//! guards nothing else. Delivery only ever *tries* the lock so the device's
//! real-time thread never waits on a stop; stop takes it blocking so no
//! delivery is still in flight once the sinks are closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::frame::{AudioInputPacket, Frame, FrameKind, VideoInputFrame};
use crate::models::media::DisplayMode;
use crate::models::profile::AudioFormat;
use crate::models::state::SessionState;
use crate::session::counters::FrameCounters;
use crate::session::events::{EventBus, SessionEvent};
use crate::traits::frame_sink::FrameSink;

/// Active sinks plus the session-owned buffers frames are copied into.
pub(crate) struct SinkSet {
    sinks: Vec<Box<dyn FrameSink>>,
    audio_format: AudioFormat,
    video: Frame,
    audio: Frame,
}

impl SinkSet {
    pub(crate) fn empty() -> Self {
        Self::new(Vec::new(), AudioFormat::default())
    }

    pub(crate) fn new(sinks: Vec<Box<dyn FrameSink>>, audio_format: AudioFormat) -> Self {
        Self {
            sinks,
            audio_format,
            video: Frame::new(FrameKind::Video),
            audio: Frame::new(FrameKind::Audio),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sinks.len()
    }

    fn deliver_video(&mut self, input: &VideoInputFrame<'_>, failures: &mut Vec<CaptureError>) {
        let expected = input.byte_len();
        let copied = self.video.fill_from(input.data, expected);
        if copied < expected {
            log::warn!("Video frame shorter than declared: {} of {} bytes", copied, expected);
        }
        dispatch(&mut self.sinks, &self.video, failures);
    }

    fn deliver_audio(&mut self, input: &AudioInputPacket<'_>, failures: &mut Vec<CaptureError>) {
        let expected = input.byte_len(&self.audio_format);
        let copied = self.audio.fill_from(input.data, expected);
        if copied < expected {
            log::warn!("Audio packet shorter than declared: {} of {} bytes", copied, expected);
        }
        dispatch(&mut self.sinks, &self.audio, failures);
    }

    /// Close and remove every sink, returning the first close error.
    pub(crate) fn close_all(&mut self) -> Result<(), CaptureError> {
        close_sinks(&mut self.sinks)
    }
}

fn dispatch(sinks: &mut [Box<dyn FrameSink>], frame: &Frame, failures: &mut Vec<CaptureError>) {
    for sink in sinks.iter_mut().filter(|s| s.accepts(frame.kind())) {
        if let Err(e) = sink.accept(frame) {
            failures.push(e);
        }
    }
}

/// Close and drain `sinks`. Every sink is closed even if an earlier one fails.
pub(crate) fn close_sinks(sinks: &mut Vec<Box<dyn FrameSink>>) -> Result<(), CaptureError> {
    let mut first_error = None;
    for mut sink in sinks.drain(..) {
        if let Err(e) = sink.close() {
            log::error!("Failed to close sink {}: {}", sink.name(), e);
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Session status readable from reporting threads.
#[derive(Debug, Clone)]
pub(crate) struct SessionStatus {
    pub(crate) state: SessionState,
    pub(crate) last_error: Option<String>,
}

/// State shared between the session, its frame handler, and monitors.
pub(crate) struct SessionShared {
    pub(crate) streaming: AtomicBool,
    pub(crate) delivery: Mutex<SinkSet>,
    pub(crate) counters: FrameCounters,
    pub(crate) events: EventBus,
    pub(crate) status: Mutex<SessionStatus>,
}

impl SessionShared {
    pub(crate) fn new() -> Self {
        Self {
            streaming: AtomicBool::new(false),
            delivery: Mutex::new(SinkSet::empty()),
            counters: FrameCounters::default(),
            events: EventBus::default(),
            status: Mutex::new(SessionStatus {
                state: SessionState::Idle,
                last_error: None,
            }),
        }
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }
}

/// Entry point a device calls with each notification.
///
/// Cloneable and cheap; every clone feeds the same session.
#[derive(Clone)]
pub struct FrameHandler {
    shared: Arc<SessionShared>,
}

impl FrameHandler {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    /// Deliver one video frame and/or audio packet to the active sinks.
    ///
    /// Dropped silently outside the streaming window, and dropped (counted)
    /// when a stop currently holds the delivery lock. Bytes are copied before
    /// dispatch; neither input is referenced after this returns.
    pub fn on_frame_arrived(&self, video: Option<VideoInputFrame<'_>>, audio: Option<AudioInputPacket<'_>>) {
        if video.is_none() && audio.is_none() {
            return;
        }

        let shared = &*self.shared;
        if !shared.is_streaming() {
            return;
        }

        let Some(mut sinks) = shared.delivery.try_lock() else {
            let dropped = shared.counters.record_drop();
            log::trace!("Frame dropped while session is stopping ({} so far)", dropped);
            shared.events.publish(SessionEvent::FrameDropped { dropped_frames: dropped });
            return;
        };

        // A stop may have completed between the flag check and the lock.
        if !shared.is_streaming() {
            return;
        }

        let frame_count = shared.counters.increment_frames();
        let mut failures = Vec::new();

        if let Some(input) = video {
            sinks.deliver_video(&input, &mut failures);
        }
        if let Some(input) = audio {
            sinks.deliver_audio(&input, &mut failures);
        }
        drop(sinks);

        for error in failures {
            shared.counters.record_sink_failure();
            log::warn!("Frame {}: {}", frame_count, error);
            shared.events.publish(SessionEvent::SinkFailed(error));
        }
        shared.events.publish(SessionEvent::FrameDelivered { frame_count });
    }

    /// Count a preview draw. Ignored outside the streaming window.
    pub fn on_preview_frame(&self) {
        if !self.shared.is_streaming() {
            return;
        }
        let preview_count = self.shared.counters.increment_previews();
        self.shared.events.publish(SessionEvent::PreviewDrawn { preview_count });
    }

    /// The device detected a different input signal.
    pub fn on_input_format_changed(&self, mode: DisplayMode) {
        log::info!("Video input format changed: {:?} ({})", mode, mode.video_size());
        self.shared.events.publish(SessionEvent::InputFormatChanged(mode));
    }

    pub fn is_streaming(&self) -> bool {
        self.shared.is_streaming()
    }
}
