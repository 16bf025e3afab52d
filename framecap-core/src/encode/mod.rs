pub mod ffmpeg;
pub mod live_encode;
