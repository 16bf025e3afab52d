use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::media::DisplayMode;
use crate::models::state::SessionState;

/// Notifications published by a capture session.
///
/// Events are sent from whichever thread caused them, including the
/// device's real-time callback thread. Subscribers are responsible for
/// moving them onto their own (e.g. UI) thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    FrameDelivered { frame_count: u64 },
    PreviewDrawn { preview_count: u64 },
    FrameDropped { dropped_frames: u64 },
    SinkFailed(CaptureError),
    InputFormatChanged(DisplayMode),
    Error(CaptureError),
}

/// Events a subscriber may leave unread before new ones are discarded.
pub const EVENT_QUEUE_DEPTH: usize = 1024;

/// Fan-out of session events to any number of channel subscribers.
///
/// Sends never block. Each subscriber has a queue of
/// [`EVENT_QUEUE_DEPTH`] events; while it is full, events for that
/// subscriber are dropped. Subscribers whose receiver has been dropped are
/// pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<SyncSender<SessionEvent>>>,
}

impl EventBus {
    /// A new bounded event queue. Drain it; a full queue loses events.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::sync_channel(EVENT_QUEUE_DEPTH);
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn publish(&self, event: SessionEvent) {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            return;
        }
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
