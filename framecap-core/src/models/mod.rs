pub mod error;
pub mod frame;
pub mod media;
pub mod profile;
pub mod recording_result;
pub mod state;
