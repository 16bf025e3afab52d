use std::fs::File;

use crate::models::error::CaptureError;
use crate::models::profile::CaptureProfile;

/// A running external transcoder fed with raw video bytes.
pub trait LiveEncodeProcess: Send {
    /// Feed raw frame bytes. Blocks while the encoder's input is full.
    fn write(&mut self, data: &[u8]) -> Result<(), CaptureError>;

    /// Signal end of input and wait for the encoder to finish its output.
    fn stop(&mut self) -> Result<(), CaptureError>;
}

/// Starts live encoders for a capture profile.
///
/// `output` receives the compressed elementary stream.
pub trait EncoderLauncher: Send + Sync {
    fn launch(&self, profile: &CaptureProfile, output: File) -> Result<Box<dyn LiveEncodeProcess>, CaptureError>;
}
