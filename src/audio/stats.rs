// Engine stats - Real-time fault counters
//
// The audio callback never throws, logs or blocks when something goes
// wrong; it records the fault in one of these counters and continues with
// best effort. A dropped notification or a stolen voice is preferable to
// a stalled output. Thread-safe via atomics, readable from any thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct StatsInner {
    /// Trigger events dropped because the observer queue was full
    dropped_events: AtomicU64,
    /// Voices stolen because the pool was exhausted
    voice_steals: AtomicU64,
    /// Replaced heap values freed on the audio thread because the reclaim
    /// queue was full
    reclaim_overflow: AtomicU64,
}

/// Shared fault counters
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    inner: Arc<StatsInner>,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_dropped_event(&self) {
        self.inner.dropped_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_voice_steal(&self) {
        self.inner.voice_steals.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reclaim_overflow(&self) {
        self.inner.reclaim_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_events(&self) -> u64 {
        self.inner.dropped_events.load(Ordering::Relaxed)
    }

    pub fn voice_steals(&self) -> u64 {
        self.inner.voice_steals.load(Ordering::Relaxed)
    }

    pub fn reclaim_overflow(&self) -> u64 {
        self.inner.reclaim_overflow.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dropped_events: self.dropped_events(),
            voice_steals: self.voice_steals(),
            reclaim_overflow: self.reclaim_overflow(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub dropped_events: u64,
    pub voice_steals: u64,
    pub reclaim_overflow: u64,
}
