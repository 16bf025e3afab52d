//! # framecap-core
//!
//! Platform-agnostic capture core library.
//!
//! Provides the capture session state machine, its frame-arrival path, the
//! raw-file and live-encode sinks, WAV container synthesis, and the final
//! mux step. Device backends (vendor SDK adapters, the synthetic generator)
//! implement `DeviceCapability` + `FrameSource` and plug into the generic
//! `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! framecap-core (this crate)
//! ├── traits/       ← DeviceCapability, FrameSource, FrameSink, EncoderLauncher
//! ├── models/       ← CaptureError, SessionState, CaptureProfile, Frame, etc.
//! ├── session/      ← CaptureSession, FrameHandler, CaptureController
//! ├── storage/      ← RawFileSink, checksum, metadata sidecar
//! ├── encode/       ← LiveEncodeSink, ffmpeg live encoder
//! ├── processing/   ← WAV header generation
//! └── finalize/     ← FinalizeMuxer
//! ```

pub mod encode;
pub mod finalize;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use encode::ffmpeg::FfmpegLauncher;
pub use encode::live_encode::LiveEncodeSink;
pub use finalize::muxer::FinalizeMuxer;
pub use models::error::CaptureError;
pub use models::frame::{AudioInputPacket, Frame, FrameKind, VideoInputFrame};
pub use models::media::{DeviceInfo, DisplayMode, ModeSupport, PixelFormat, VideoInputFlags};
pub use models::profile::{AudioFormat, CaptureProfile, FinalizeArtifacts};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::SessionState;
pub use processing::wav_format::build_wav;
pub use session::capture::{CaptureSession, SessionMonitor};
pub use session::controller::{CaptureController, ControllerOptions, ControllerStatus};
pub use session::counters::CountersSnapshot;
pub use session::events::SessionEvent;
pub use session::frame_path::FrameHandler;
pub use session::sink_plan::{LiveEncodePlan, RawCapturePaths, SinkPlan};
pub use storage::raw_file::RawFileSink;
pub use traits::device::{CaptureDevice, DeviceCapability, FrameSource};
pub use traits::frame_sink::FrameSink;
pub use traits::live_encoder::{EncoderLauncher, LiveEncodeProcess};
