//! # framecap-synthetic
//!
//! Software capture backend for framecap.
//!
//! Provides:
//! - `SyntheticDevice`: a `CaptureDevice` that generates video frames and a
//!   test tone on its own thread at the selected mode's frame rate
//! - `Pacing::Manual`: frame-by-frame delivery for deterministic tests
//! - `FailurePoint`: fault injection for each device control call
//!
//! ## Usage
//! ```ignore
//! use framecap_core::{CaptureProfile, CaptureSession, SinkPlan};
//! use framecap_synthetic::SyntheticDevice;
//!
//! let mut session = CaptureSession::new(SyntheticDevice::new());
//! session.start(CaptureProfile::default(), &SinkPlan::default())?;
//! ```

pub mod device;
mod generator;

pub use device::{FailurePoint, Pacing, SyntheticDevice};
