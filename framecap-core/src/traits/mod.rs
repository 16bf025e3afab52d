pub mod device;
pub mod frame_sink;
pub mod live_encoder;
