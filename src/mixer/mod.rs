// Track mixer - Voice pool, summing and the master output stage
//
// Triggered buffers play through a pre-allocated pool of voices; the pool
// never grows after construction, so triggering and rendering are
// allocation-free. Summed output goes through a smoothed master volume,
// denormal flushing and a tanh soft clip, in that order.

use std::sync::Arc;

use crate::audio::dsp_utils::{OnePoleSmoother, flush_denormals_to_zero, soft_clip};
use crate::audio::format_conversion::StereoFrame;
use crate::audio::parameters::AtomicF32;
use crate::audio::stats::EngineStats;
use crate::sampler::store::SampleBuffer;
use crate::sampler::voice::Voice;

/// Size of the voice pool. With one-shot drum samples this comfortably
/// covers a full 64-track grid firing on the same step.
pub const MAX_VOICES: usize = 64;

/// Master volume smoothing time constant (avoids zipper noise)
const MASTER_SMOOTHING_MS: f32 = 10.0;

pub struct TrackMixer {
    voices: Vec<Voice>,
    master: AtomicF32,
    master_smoother: OnePoleSmoother,
    stats: EngineStats,
}

impl TrackMixer {
    /// `master` is the shared volume cell written by the control side.
    pub fn new(master: AtomicF32, stats: EngineStats, sample_rate: f32) -> Self {
        let initial_master = master.get();
        Self {
            voices: (0..MAX_VOICES).map(|_| Voice::idle()).collect(),
            master,
            master_smoother: OnePoleSmoother::new(initial_master, MASTER_SMOOTHING_MS, sample_rate),
            stats,
        }
    }

    /// Start playback of `buffer` at `offset` frames into the next render
    /// call, with gain/pan captured now.
    ///
    /// When the pool is exhausted the oldest voice is stolen and the fault
    /// is counted; triggering never blocks or allocates.
    pub fn trigger(
        &mut self,
        buffer: Arc<SampleBuffer>,
        gain: f32,
        pan: f32,
        offset: usize,
        started_at: u64,
    ) {
        let slot = match self.voices.iter_mut().position(|v| !v.is_active()) {
            Some(free) => free,
            None => {
                self.stats.record_voice_steal();
                self.voices
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, v)| v.started_at())
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            }
        };
        self.voices[slot].start(buffer, gain, pan, offset, started_at);
    }

    /// Sum all active voices into `out` and apply the master stage.
    ///
    /// `out` is expected to be silence on entry (the engine core clears
    /// the quantum before scheduling).
    pub fn render(&mut self, out: &mut [StereoFrame]) {
        for voice in self.voices.iter_mut() {
            voice.render_into(out);
        }

        for frame in out.iter_mut() {
            let master = self.master_smoother.process(self.master.get());

            let left = flush_denormals_to_zero(frame.left) * master;
            let right = flush_denormals_to_zero(frame.right) * master;

            frame.left = soft_clip(left);
            frame.right = soft_clip(right);
        }
    }

    /// Number of voices currently sounding
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }
}
