use thiserror::Error;

/// Errors that can occur while capturing, writing, or finalizing a recording.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("unsupported capture mode: {0}")]
    UnsupportedMode(String),

    #[error("device configuration failed: {0}")]
    DeviceConfig(String),

    #[error("failed to open sink {sink}: {reason}")]
    SinkOpen { sink: String, reason: String },

    #[error("write to sink {sink} failed: {reason}")]
    SinkWrite { sink: String, reason: String },

    #[error("sink {0} is closed")]
    SinkClosed(String),

    #[error("mux failed: {0}")]
    Mux(String),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("streaming is active; stop the stream before closing")]
    CloseRefused,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),
}
