// Command types - Communication control surface → audio thread
//
// Every control-surface mutation travels as one of these values and is
// applied whole by the audio thread at the next buffer boundary, never
// mid-step. Commands that replace heap data (patterns, the grid, the sound
// set) hand the old value back through the reclaim channel so the
// real-time path never frees memory.

use crate::sampler::store::TrackSounds;
use crate::sequencer::clock::Tempo;
use crate::sequencer::grid::{StepGrid, StepPattern};

#[derive(Debug)]
pub enum Command {
    /// Start the transport at step 0
    Start,
    /// Stop the transport, cancelling boundaries not yet scheduled
    Stop,
    /// Change tempo; applies to boundaries not yet scheduled
    SetTempo(Tempo),
    /// Change the step resolution; applies to boundaries not yet scheduled
    SetStepsPerBeat(u32),
    /// Replace one track's pattern (validated on the control side)
    SetPattern { track: usize, pattern: StepPattern },
    /// Turn every flag of one track off (in place, no allocation)
    ClearPattern { track: usize },
    /// Replace the whole grid (used when the step count changes)
    SetGrid(StepGrid),
    /// Replace the per-track sound set
    SetSounds(TrackSounds),
}

/// Heap values replaced on the audio thread, returned to the control side
/// for deallocation.
#[derive(Debug)]
pub enum Reclaimed {
    Pattern(StepPattern),
    Grid(StepGrid),
    Sounds(TrackSounds),
}
