use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::media::{DeviceInfo, ModeSupport};
use crate::models::profile::CaptureProfile;
use crate::models::state::SessionState;
use crate::session::counters::CountersSnapshot;
use crate::session::events::SessionEvent;
use crate::session::frame_path::{FrameHandler, SessionShared, SinkSet};
use crate::session::sink_plan::SinkPlan;
use crate::traits::device::CaptureDevice;

/// Capture session state machine for a single device.
///
/// Owns the device's streaming lifecycle and the sinks of the current
/// streaming cycle:
/// ```text
/// [Device thread] → FrameHandler ─try_lock─→ [SinkSet] → RawFileSink (video)
///                                                       → RawFileSink (audio)
///                                                       → LiveEncodeSink
/// [Control thread] → start / stop ──lock────┘
/// ```
pub struct CaptureSession<D: CaptureDevice> {
    device: D,
    shared: Arc<SessionShared>,
    profile: Option<CaptureProfile>,
    completed_cycles: u64,
}

impl<D: CaptureDevice> CaptureSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            shared: Arc::new(SessionShared::new()),
            profile: None,
            completed_cycles: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.status.lock().state
    }

    pub fn is_streaming(&self) -> bool {
        self.shared.is_streaming()
    }

    pub fn counters(&self) -> CountersSnapshot {
        self.shared.counters.snapshot()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.status.lock().last_error.clone()
    }

    /// Profile of the current or most recent streaming cycle.
    pub fn profile(&self) -> Option<&CaptureProfile> {
        self.profile.as_ref()
    }

    /// Number of streaming cycles that have been stopped.
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    /// Number of sinks open in the current streaming cycle.
    pub fn active_sinks(&self) -> usize {
        self.shared.delivery.lock().len()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.device.device_info()
    }

    /// Bounded event queue; see [`EventBus`](crate::session::events::EventBus).
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// A read-only handle for reporting from other threads.
    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The handler devices deliver frames to.
    pub fn frame_handler(&self) -> FrameHandler {
        FrameHandler::new(Arc::clone(&self.shared))
    }

    /// Start streaming with `profile`, opening the sinks in `plan`.
    ///
    /// Transitions: idle → starting → streaming. A session that is already
    /// streaming is stopped first; an error from that stop is recorded and
    /// the new start goes ahead. On failure the session is back in idle
    /// with no sinks open.
    pub fn start(&mut self, profile: CaptureProfile, plan: &SinkPlan) -> Result<(), CaptureError> {
        if self.is_streaming() {
            log::info!("Start requested while streaming; stopping current stream first");
            if let Err(e) = self.stop() {
                log::warn!("Previous stream stopped with an error, restarting anyway: {}", e);
            }
        }

        profile.validate()?;
        self.set_state(SessionState::Starting);

        match self
            .device
            .supports(profile.display_mode, profile.pixel_format, profile.input_flags)
        {
            ModeSupport::Supported => {}
            support => {
                return Err(self.fail_start(CaptureError::UnsupportedMode(format!(
                    "{:?} in {:?}: {:?}",
                    profile.display_mode, profile.pixel_format, support
                ))));
            }
        }

        let sinks = plan.open(&profile).map_err(|e| self.fail_start(e))?;
        let sink_count = sinks.len();
        *self.shared.delivery.lock() = SinkSet::new(sinks, profile.audio);

        let handler = self.frame_handler();
        self.device.attach(handler);

        if let Err(e) = self.enable_and_start(&profile) {
            self.rollback_start();
            return Err(self.fail_start(e));
        }

        self.shared.counters.reset();
        self.profile = Some(profile);
        self.shared.streaming.store(true, Ordering::Release);
        self.set_state(SessionState::Streaming);

        log::info!(
            "Streaming from {}: {:?} {:?}, {} Hz x{} @ {}-bit, {} sink(s)",
            self.device.device_info().label(),
            profile.display_mode,
            profile.pixel_format,
            profile.audio.sample_rate,
            profile.audio.channels,
            profile.audio.bit_depth,
            sink_count
        );
        Ok(())
    }

    /// Stop streaming and close all sinks.
    ///
    /// Transitions: streaming → stopping → idle. Blocks until any in-flight
    /// frame delivery has finished. No-op when not streaming. Teardown always
    /// completes; the first device or sink error is returned afterwards.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.is_streaming() {
            return Ok(());
        }

        self.set_state(SessionState::Stopping);
        let mut first_error = None;

        {
            let mut sinks = self.shared.delivery.lock();
            self.shared.streaming.store(false, Ordering::Release);

            let results = [
                self.device.stop_streams(),
                self.device.disable_video_input(),
                self.device.disable_audio_input(),
            ];
            for result in results {
                if let Err(e) = result {
                    log::error!("Device teardown failed: {}", e);
                    first_error.get_or_insert(as_device_config(e));
                }
            }
            self.device.detach();

            if let Err(e) = sinks.close_all() {
                first_error.get_or_insert(e);
            }
            // Drops can only happen while this lock is held, so their count
            // is kept for the caller until the next start.
            self.shared.counters.reset_keeping_drops();
        }

        self.completed_cycles += 1;
        self.set_state(SessionState::Idle);
        log::info!("Stream stopped (cycle {})", self.completed_cycles);

        match first_error {
            Some(e) => {
                self.record_error(&e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    // --- Internal helpers ---

    fn enable_and_start(&mut self, profile: &CaptureProfile) -> Result<(), CaptureError> {
        self.device
            .enable_video_input(profile.display_mode, profile.pixel_format, profile.input_flags)
            .map_err(as_device_config)?;
        self.device
            .enable_audio_input(profile.audio)
            .map_err(as_device_config)?;
        self.device.start_streams().map_err(as_device_config)?;
        Ok(())
    }

    /// Undo a partially completed start. Errors here are logged only.
    fn rollback_start(&mut self) {
        if let Err(e) = self.device.disable_video_input() {
            log::warn!("Rollback: disable video input failed: {}", e);
        }
        if let Err(e) = self.device.disable_audio_input() {
            log::warn!("Rollback: disable audio input failed: {}", e);
        }
        self.device.detach();

        let mut sinks = std::mem::replace(&mut *self.shared.delivery.lock(), SinkSet::empty());
        if let Err(e) = sinks.close_all() {
            log::warn!("Rollback: closing sinks failed: {}", e);
        }
    }

    fn fail_start(&self, error: CaptureError) -> CaptureError {
        log::error!("Start failed: {}", error);
        self.set_state(SessionState::Idle);
        self.record_error(&error);
        error
    }

    fn set_state(&self, new_state: SessionState) {
        self.shared.status.lock().state = new_state;
        log::debug!("Session state: {}", new_state);
        self.shared.events.publish(SessionEvent::StateChanged(new_state));
    }

    fn record_error(&self, error: &CaptureError) {
        self.shared.status.lock().last_error = Some(error.to_string());
        self.shared.events.publish(SessionEvent::Error(error.clone()));
    }
}

impl<D: CaptureDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        if self.is_streaming() {
            log::warn!("Capture session dropped while streaming; stopping");
            let _ = self.stop();
        }
    }
}

fn as_device_config(error: CaptureError) -> CaptureError {
    match error {
        CaptureError::DeviceConfig(_) => error,
        other => CaptureError::DeviceConfig(other.to_string()),
    }
}

/// Read-only view of a session for reporting threads.
#[derive(Clone)]
pub struct SessionMonitor {
    shared: Arc<SessionShared>,
}

impl SessionMonitor {
    pub fn state(&self) -> SessionState {
        self.shared.status.lock().state
    }

    pub fn is_streaming(&self) -> bool {
        self.shared.is_streaming()
    }

    pub fn counters(&self) -> CountersSnapshot {
        self.shared.counters.snapshot()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.status.lock().last_error.clone()
    }

    /// Bounded event queue; see [`EventBus`](crate::session::events::EventBus).
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }
}
