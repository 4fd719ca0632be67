// Engine configuration - Topology and initial musical settings

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::messaging::event::MAX_TRACKS;

/// Topology and initial settings the engine is constructed with.
///
/// `num_tracks` is fixed for the engine's lifetime; tempo, the step count
/// and the step resolution can be changed live.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of independent tracks, 1..=64
    pub num_tracks: usize,
    /// Number of steps in the grid, at least 1
    pub num_steps: usize,
    /// Steps per musical beat, at least 1
    pub steps_per_beat: u32,
    /// Initial tempo in BPM, positive and finite
    pub tempo_bpm: f64,
}

impl EngineConfig {
    pub fn new(num_tracks: usize, num_steps: usize, steps_per_beat: u32) -> Self {
        Self {
            num_tracks,
            num_steps,
            steps_per_beat,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tracks == 0 || self.num_tracks > MAX_TRACKS {
            return Err(ConfigError::InvalidTrackCount {
                requested: self.num_tracks,
            });
        }
        if self.num_steps == 0 {
            return Err(ConfigError::InvalidNumSteps);
        }
        if self.steps_per_beat == 0 {
            return Err(ConfigError::InvalidStepsPerBeat);
        }
        if !self.tempo_bpm.is_finite() || self.tempo_bpm <= 0.0 {
            return Err(ConfigError::InvalidTempo(self.tempo_bpm));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_tracks: 4,
            num_steps: 16,
            steps_per_beat: 1,
            tempo_bpm: 120.0,
        }
    }
}
