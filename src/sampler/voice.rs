// Voice - One playing instance of a sample buffer
//
// A voice is a fixed slot in the mixer's pool. Triggering captures gain
// and pan once (snapshot-at-schedule rule: later control changes do not
// affect a voice that is already sounding) and converts them to left/right
// coefficients with the equal-power pan law. Rendering accumulates into
// the output frames; starting inside a quantum is handled by an initial
// frame delay so triggers land sample-accurately.

use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;

use crate::audio::format_conversion::StereoFrame;
use crate::sampler::store::SampleBuffer;

/// Equal-power pan: `pan` in [-1, 1] maps onto a quarter sine/cosine
/// cycle, so center sits at -3 dB per side and the power sum is constant
/// across the field.
#[inline]
pub fn equal_power_gains(gain: f32, pan: f32) -> (f32, f32) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (gain * angle.cos(), gain * angle.sin())
}

#[derive(Debug, Clone, Default)]
pub struct Voice {
    buffer: Option<Arc<SampleBuffer>>,
    /// Read position in the buffer
    pos: usize,
    /// Frames to skip before the first sample (in-quantum trigger offset)
    delay: usize,
    gain_left: f32,
    gain_right: f32,
    /// Engine time of the trigger, used for oldest-voice stealing
    started_at: u64,
    active: bool,
}

impl Voice {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// (Re)start this slot with a buffer and a gain/pan snapshot.
    ///
    /// `delay` is the number of frames into the next `render_into` call at
    /// which the first sample must sound.
    pub fn start(
        &mut self,
        buffer: Arc<SampleBuffer>,
        gain: f32,
        pan: f32,
        delay: usize,
        started_at: u64,
    ) {
        let (gain_left, gain_right) = equal_power_gains(gain, pan);
        self.buffer = Some(buffer);
        self.pos = 0;
        self.delay = delay;
        self.gain_left = gain_left;
        self.gain_right = gain_right;
        self.started_at = started_at;
        self.active = true;
    }

    /// Accumulate this voice into `out`. Deactivates itself when the
    /// buffer is exhausted.
    pub fn render_into(&mut self, out: &mut [StereoFrame]) {
        if !self.active {
            return;
        }
        let Some(buffer) = self.buffer.as_ref() else {
            self.active = false;
            return;
        };

        if self.delay >= out.len() {
            self.delay -= out.len();
            return;
        }
        let start = self.delay;
        self.delay = 0;

        let data = buffer.data();
        for frame in out[start..].iter_mut() {
            let Some(&sample) = data.get(self.pos) else {
                self.active = false;
                break;
            };
            frame.left += sample * self.gain_left;
            frame.right += sample * self.gain_right;
            self.pos += 1;
        }
    }
}
