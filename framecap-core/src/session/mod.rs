pub mod capture;
pub mod controller;
pub mod counters;
pub mod events;
pub mod frame_path;
pub mod sink_plan;

#[cfg(test)]
pub(crate) mod test_support;
