use crate::models::error::CaptureError;
use crate::models::frame::{Frame, FrameKind};

/// A destination that persists or forwards captured frame bytes.
///
/// Sinks are owned by the session and only touched while the delivery
/// lock is held, so implementations need no internal synchronization.
pub trait FrameSink: Send {
    /// Short identifier used in logs and error values.
    fn name(&self) -> &str;

    /// Whether frames of `kind` should be dispatched to this sink.
    fn accepts(&self, kind: FrameKind) -> bool;

    /// Persist or forward one frame, in arrival order.
    ///
    /// Fails with `CaptureError::SinkClosed` after [`FrameSink::close`].
    fn accept(&mut self, frame: &Frame) -> Result<(), CaptureError>;

    /// Flush and release the underlying resource. Idempotent.
    fn close(&mut self) -> Result<(), CaptureError>;
}
