use std::sync::atomic::{AtomicU64, Ordering};

/// Frame and preview counters shared between the callback thread and readers.
#[derive(Debug, Default)]
pub struct FrameCounters {
    frame_count: AtomicU64,
    preview_count: AtomicU64,
    dropped_frames: AtomicU64,
    sink_failures: AtomicU64,
}

/// Point-in-time copy of [`FrameCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub frame_count: u64,
    pub preview_count: u64,
    /// Arrivals discarded because a stop held the delivery lock. Survives
    /// that stop and is cleared by the next start.
    pub dropped_frames: u64,
    pub sink_failures: u64,
}

impl FrameCounters {
    /// Returns the new frame count.
    pub fn increment_frames(&self) -> u64 {
        self.frame_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the new preview count.
    pub fn increment_previews(&self) -> u64 {
        self.preview_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn record_drop(&self) -> u64 {
        self.dropped_frames.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Acquire)
    }

    pub fn preview_count(&self) -> u64 {
        self.preview_count.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.reset_keeping_drops();
        self.dropped_frames.store(0, Ordering::Release);
    }

    /// Zero every counter except `dropped_frames`.
    pub fn reset_keeping_drops(&self) {
        self.frame_count.store(0, Ordering::Release);
        self.preview_count.store(0, Ordering::Release);
        self.sink_failures.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            frame_count: self.frame_count.load(Ordering::Acquire),
            preview_count: self.preview_count.load(Ordering::Acquire),
            dropped_frames: self.dropped_frames.load(Ordering::Acquire),
            sink_failures: self.sink_failures.load(Ordering::Acquire),
        }
    }
}
