// Step clock - Tempo and step-interval arithmetic
//
// Converts a tempo (BPM) and a step resolution (steps per musical beat)
// into a step length in samples. The length is kept as f64 so the
// fractional part survives accumulation across step boundaries.

use std::fmt;

use crate::error::ConfigError;

/// Tempo in BPM (beats per minute)
///
/// Always positive and finite; construction validates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo. BPM must be positive and finite.
    pub fn new(bpm: f64) -> Result<Self, ConfigError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ConfigError::InvalidTempo(bpm));
        }
        Ok(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one beat in samples at given sample rate
    pub fn beat_duration_samples(&self, sample_rate: f64) -> f64 {
        self.beat_duration_seconds() * sample_rate
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Step clock
///
/// Owns the (tempo, steps-per-beat, sample-rate) triple and the step
/// length derived from it. Lives on the audio side; tempo and resolution
/// changes arrive as commands and take effect at the next step boundary
/// because the scheduler reads the length only when advancing.
#[derive(Debug, Clone)]
pub struct StepClock {
    sample_rate: f64,
    tempo: Tempo,
    steps_per_beat: u32,
    step_len: f64,
}

impl StepClock {
    pub fn new(sample_rate: f64, tempo: Tempo, steps_per_beat: u32) -> Self {
        let mut clock = Self {
            sample_rate,
            tempo,
            steps_per_beat: steps_per_beat.max(1),
            step_len: 0.0,
        };
        clock.recompute();
        clock
    }

    /// Step length in samples (fractional)
    ///
    /// Invariant: never shorter than one sample, so the scheduler always
    /// makes progress through a render quantum.
    pub fn step_len_samples(&self) -> f64 {
        self.step_len
    }

    /// Step length in seconds
    pub fn step_len_seconds(&self) -> f64 {
        self.step_len / self.sample_rate
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
        self.recompute();
    }

    pub fn steps_per_beat(&self) -> u32 {
        self.steps_per_beat
    }

    pub fn set_steps_per_beat(&mut self, steps_per_beat: u32) {
        self.steps_per_beat = steps_per_beat.max(1);
        self.recompute();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn recompute(&mut self) {
        let steps_per_second = self.tempo.bpm() * self.steps_per_beat as f64 / 60.0;
        self.step_len = (self.sample_rate / steps_per_second).max(1.0);
    }
}
