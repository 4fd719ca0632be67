// Engine facade - The control-surface half of the engine
//
// `StepEngine` is what callers hold: it validates every input
// synchronously (invalid calls leave the engine unchanged), keeps the
// canonical grid/config mirror for read-back, and publishes changes to the
// audio-thread `EngineCore` through the lock-free command ring. Continuous
// controls (gain, pan, master volume) bypass the ring and go through
// shared atomic cells, clamped rather than rejected.

pub mod core;

use log::{debug, info};
use ringbuf::traits::{Consumer, Producer};

use crate::audio::parameters::AtomicF32;
use crate::audio::stats::{EngineStats, StatsSnapshot};
use crate::audio::timing::EngineClock;
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError};
use crate::messaging::channels::{
    CommandProducer, ReclaimConsumer, create_command_channel, create_event_channel,
    create_reclaim_channel,
};
use crate::messaging::command::Command;
use crate::messaging::event::TriggerReceiver;
use crate::mixer::TrackMixer;
use crate::sampler::store::SampleStore;
use crate::sequencer::clock::{StepClock, Tempo};
use crate::sequencer::grid::{StepGrid, StepPattern};

pub use self::core::EngineCore;

// Channel capacities. Commands and reclaims are bounded by how fast a
// caller can realistically mutate the engine between quanta; events need
// headroom for fast tempos with small grids (a 10ms quantum at extreme
// settings still stays well under one hundred boundaries).
const COMMAND_CHANNEL_CAPACITY: usize = 256;
const EVENT_CHANNEL_CAPACITY: usize = 1024;
const RECLAIM_CHANNEL_CAPACITY: usize = 256;

pub struct StepEngine {
    config: EngineConfig,
    tempo: Tempo,
    grid: StepGrid,
    gains: Box<[AtomicF32]>,
    pans: Box<[AtomicF32]>,
    master: AtomicF32,
    commands: CommandProducer,
    reclaim: ReclaimConsumer,
    receiver: Option<TriggerReceiver>,
    engine_clock: EngineClock,
    stats: EngineStats,
}

impl StepEngine {
    /// Build an engine with the given topology.
    ///
    /// Returns the control-side facade and the audio-side core; hand the
    /// core to `audio::output::AudioOutput::start` (or drive its
    /// `process` directly in tests).
    pub fn new(config: EngineConfig, sample_rate: f64) -> Result<(Self, EngineCore), ConfigError> {
        config.validate()?;
        let tempo = Tempo::new(config.tempo_bpm)?;

        let (command_tx, command_rx) = create_command_channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = create_event_channel(EVENT_CHANNEL_CAPACITY);
        let (reclaim_tx, reclaim_rx) = create_reclaim_channel(RECLAIM_CHANNEL_CAPACITY);

        let gains: Box<[AtomicF32]> = (0..config.num_tracks)
            .map(|_| AtomicF32::new(1.0))
            .collect();
        let pans: Box<[AtomicF32]> = (0..config.num_tracks)
            .map(|_| AtomicF32::new(0.0))
            .collect();
        let master = AtomicF32::new(1.0);

        let grid = StepGrid::new(config.num_tracks, config.num_steps);
        let engine_clock = EngineClock::new(sample_rate);
        let stats = EngineStats::new();

        let mixer = TrackMixer::new(master.clone(), stats.clone(), sample_rate as f32);
        let clock = StepClock::new(sample_rate, tempo, config.steps_per_beat);

        let core = EngineCore::new(
            command_rx,
            event_tx,
            reclaim_tx,
            clock,
            grid.clone(),
            mixer,
            gains.iter().cloned().collect(),
            pans.iter().cloned().collect(),
            engine_clock.clone(),
            stats.clone(),
        );

        info!(
            "engine configured: {} tracks x {} steps, {} steps/beat, {}",
            config.num_tracks, config.num_steps, config.steps_per_beat, tempo
        );

        let engine = Self {
            config,
            tempo,
            grid,
            gains,
            pans,
            master,
            commands: command_tx,
            reclaim: reclaim_rx,
            receiver: Some(TriggerReceiver::new(event_rx)),
            engine_clock,
            stats,
        };
        Ok((engine, core))
    }

    // ---- transport -------------------------------------------------

    /// Start the transport at step 0. Idempotent while running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.drain_reclaim();
        self.send(Command::Start)?;
        debug!("transport start requested");
        Ok(())
    }

    /// Stop the transport, cancelling steps not yet scheduled. Voices
    /// already sounding play to completion. Idempotent while stopped.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.drain_reclaim();
        self.send(Command::Stop)?;
        debug!("transport stop requested");
        Ok(())
    }

    // ---- musical configuration -------------------------------------

    pub fn tempo(&self) -> f64 {
        self.tempo.bpm()
    }

    /// Change tempo. Steps already scheduled keep their fire times; the
    /// new interval applies from the next boundary on.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), EngineError> {
        let tempo = Tempo::new(bpm)?;
        self.drain_reclaim();
        self.send(Command::SetTempo(tempo))?;
        self.tempo = tempo;
        self.config.tempo_bpm = bpm;
        Ok(())
    }

    pub fn steps_per_beat(&self) -> u32 {
        self.config.steps_per_beat
    }

    /// Change the step resolution, same boundary semantics as tempo.
    pub fn set_steps_per_beat(&mut self, steps_per_beat: u32) -> Result<(), EngineError> {
        if steps_per_beat == 0 {
            return Err(ConfigError::InvalidStepsPerBeat.into());
        }
        self.drain_reclaim();
        self.send(Command::SetStepsPerBeat(steps_per_beat))?;
        self.config.steps_per_beat = steps_per_beat;
        Ok(())
    }

    pub fn num_steps(&self) -> usize {
        self.grid.num_steps()
    }

    /// Reshape the grid to a new step count: shrinking discards the tail,
    /// growing appends "off" steps on every track.
    pub fn set_num_steps(&mut self, num_steps: usize) -> Result<(), EngineError> {
        if num_steps == 0 {
            return Err(ConfigError::InvalidNumSteps.into());
        }
        if num_steps == self.grid.num_steps() {
            return Ok(());
        }
        let new_grid = self.grid.resized(num_steps);
        self.drain_reclaim();
        self.send(Command::SetGrid(new_grid.clone()))?;
        self.grid = new_grid;
        self.config.num_steps = num_steps;
        Ok(())
    }

    pub fn num_tracks(&self) -> usize {
        self.config.num_tracks
    }

    // ---- sounds and patterns ----------------------------------------

    /// Assign one sound per track, resolved against `store`. The count
    /// must equal the track count; any unknown identifier fails the whole
    /// call without side effects.
    pub fn set_sounds(&mut self, store: &SampleStore, ids: &[&str]) -> Result<(), EngineError> {
        let sounds = store.resolve_set(ids, self.config.num_tracks)?;
        self.drain_reclaim();
        self.send(Command::SetSounds(sounds))?;
        Ok(())
    }

    /// Replace one track's on/off flags. The length must equal the step
    /// count (rejected, never truncated or padded); on failure the
    /// previous pattern stays in place.
    pub fn set_step_sequence(&mut self, flags: &[bool], track: usize) -> Result<(), EngineError> {
        self.check_track(track)?;
        if flags.len() != self.grid.num_steps() {
            return Err(ConfigError::StepCountMismatch {
                expected: self.grid.num_steps(),
                got: flags.len(),
            }
            .into());
        }
        let pattern = StepPattern::from_flags(flags);
        self.drain_reclaim();
        self.send(Command::SetPattern {
            track,
            pattern: pattern.clone(),
        })?;
        self.grid.set_pattern(track, pattern);
        Ok(())
    }

    /// Turn every flag of one track off.
    pub fn clear_sequence(&mut self, track: usize) -> Result<(), EngineError> {
        self.check_track(track)?;
        self.drain_reclaim();
        self.send(Command::ClearPattern { track })?;
        self.grid.clear_track(track);
        Ok(())
    }

    /// Read back the flags last submitted for `track`.
    pub fn pattern(&self, track: usize) -> Result<&[bool], EngineError> {
        self.check_track(track)?;
        Ok(self.grid.pattern(track).as_flags())
    }

    // ---- continuous controls (clamped, never fail on range) ---------

    /// Amplifier gain for one track: 0.0 mute, 1.0 unity, 2.0 +6dB.
    /// Out-of-range values are clamped. Affects voices triggered after
    /// the call, not ones already sounding.
    pub fn set_amp_gain(&self, gain: f32, track: usize) -> Result<(), EngineError> {
        self.check_track(track)?;
        self.gains[track].set(gain.clamp(0.0, 2.0));
        Ok(())
    }

    pub fn amp_gain(&self, track: usize) -> Result<f32, EngineError> {
        self.check_track(track)?;
        Ok(self.gains[track].get())
    }

    /// Pan position for one track: -1.0 left, 0.0 center, 1.0 right.
    /// Out-of-range values are clamped; same snapshot semantics as gain.
    pub fn set_pan_position(&self, pan: f32, track: usize) -> Result<(), EngineError> {
        self.check_track(track)?;
        self.pans[track].set(pan.clamp(-1.0, 1.0));
        Ok(())
    }

    pub fn pan_position(&self, track: usize) -> Result<f32, EngineError> {
        self.check_track(track)?;
        Ok(self.pans[track].get())
    }

    /// Master output volume in [0, 1], clamped and smoothed.
    pub fn set_master_volume(&self, volume: f32) {
        self.master.set(volume.clamp(0.0, 1.0));
    }

    pub fn master_volume(&self) -> f32 {
        self.master.get()
    }

    // ---- observer and introspection ----------------------------------

    /// Take the trigger-event receiver. Single slot: the first call gets
    /// it, later calls return None.
    pub fn trigger_receiver(&mut self) -> Option<TriggerReceiver> {
        self.receiver.take()
    }

    /// Shared engine clock, for converting event times to lead durations.
    pub fn clock(&self) -> EngineClock {
        self.engine_clock.clone()
    }

    /// Real-time fault counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Free heap values the audio thread replaced; returns how many were
    /// released. Called implicitly by every mutator.
    pub fn drain_reclaim(&mut self) -> usize {
        let mut freed = 0;
        while self.reclaim.try_pop().is_some() {
            freed += 1;
        }
        freed
    }

    fn check_track(&self, track: usize) -> Result<(), ConfigError> {
        if track >= self.config.num_tracks {
            return Err(ConfigError::TrackOutOfRange {
                track,
                num_tracks: self.config.num_tracks,
            });
        }
        Ok(())
    }

    fn send(&mut self, command: Command) -> Result<(), EngineError> {
        self.commands
            .try_push(command)
            .map_err(|_| EngineError::CommandChannelFull)
    }
}
