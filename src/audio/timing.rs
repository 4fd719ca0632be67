// Engine clock - The monotonic engine-time reference
//
// Engine time is a sample count since stream start, advanced by the audio
// callback and readable from any thread. Trigger events carry absolute
// engine times; observers use this clock to convert them to wall-clock
// lead times ("fires in X seconds from now").

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Shared engine-time state
#[derive(Clone)]
pub struct EngineClock {
    /// Current sample position (incremented by the audio callback)
    sample_position: Arc<AtomicU64>,
    /// Sample rate, for time conversions
    sample_rate: f64,
}

impl EngineClock {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    /// Current engine time in samples (readable from any thread)
    pub fn now(&self) -> u64 {
        self.sample_position.load(Ordering::Relaxed)
    }

    /// Advance engine time (called from the audio callback)
    pub fn advance(&self, frames: usize) {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Convert a span of engine samples to wall-clock duration
    pub fn samples_to_duration(&self, samples: u64) -> Duration {
        Duration::from_secs_f64(samples as f64 / self.sample_rate)
    }

    /// Time remaining until an absolute engine time, zero if already past
    pub fn duration_until(&self, fire_at: u64) -> Duration {
        let now = self.now();
        self.samples_to_duration(fire_at.saturating_sub(now))
    }
}
