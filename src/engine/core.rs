// Engine core - The audio-thread half of the engine
//
// Owns everything the render callback touches: the published grid and
// clock, the scheduler, the mixer and the channel endpoints. One call to
// `process` handles one render quantum:
//
//   1. drain pending commands (configuration applies at the quantum
//      boundary, never mid-step)
//   2. fire every step boundary inside the quantum (trigger voices at
//      exact offsets, push trigger events)
//   3. render and advance engine time
//
// ========== SACRED ZONE ==========
// Nothing called from `process` may allocate, free, lock or perform I/O.
// Replaced heap values leave through the reclaim ring; if that ring is
// full they are dropped here and the fault is counted.

use std::sync::Arc;

use ringbuf::traits::{Consumer, Producer};

use crate::audio::format_conversion::StereoFrame;
use crate::audio::parameters::AtomicF32;
use crate::audio::stats::EngineStats;
use crate::audio::timing::EngineClock;
use crate::messaging::channels::{CommandConsumer, EventProducer, ReclaimProducer};
use crate::messaging::command::{Command, Reclaimed};
use crate::messaging::event::TriggerEvent;
use crate::mixer::TrackMixer;
use crate::sampler::store::TrackSounds;
use crate::sequencer::clock::StepClock;
use crate::sequencer::grid::StepGrid;
use crate::sequencer::scheduler::StepScheduler;

pub struct EngineCore {
    commands: CommandConsumer,
    events: EventProducer,
    reclaim: ReclaimProducer,
    clock: StepClock,
    grid: StepGrid,
    scheduler: StepScheduler,
    mixer: TrackMixer,
    sounds: TrackSounds,
    gains: Box<[AtomicF32]>,
    pans: Box<[AtomicF32]>,
    engine_clock: EngineClock,
    stats: EngineStats,
}

impl EngineCore {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        commands: CommandConsumer,
        events: EventProducer,
        reclaim: ReclaimProducer,
        clock: StepClock,
        grid: StepGrid,
        mixer: TrackMixer,
        gains: Box<[AtomicF32]>,
        pans: Box<[AtomicF32]>,
        engine_clock: EngineClock,
        stats: EngineStats,
    ) -> Self {
        let num_tracks = grid.num_tracks();
        Self {
            commands,
            events,
            reclaim,
            clock,
            grid,
            scheduler: StepScheduler::new(),
            mixer,
            sounds: vec![None; num_tracks].into_boxed_slice(),
            gains,
            pans,
            engine_clock,
            stats,
        }
    }

    /// Render one quantum of stereo audio.
    ///
    /// Drivable from a cpal callback or directly from tests/benches; the
    /// core itself is device-independent.
    pub fn process(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            *frame = StereoFrame::SILENCE;
        }

        let quantum_start = self.engine_clock.now();
        self.drain_commands(quantum_start);

        let Self {
            scheduler,
            clock,
            grid,
            mixer,
            sounds,
            gains,
            pans,
            events,
            stats,
            ..
        } = self;

        scheduler.process(clock, grid, quantum_start, out.len(), &mut |fire| {
            for track in fire.tracks.iter() {
                if let Some(buffer) = sounds.get(track).and_then(Option::as_ref) {
                    // Gain/pan snapshot: read once here, never again for
                    // this voice.
                    mixer.trigger(
                        Arc::clone(buffer),
                        gains[track].get(),
                        pans[track].get(),
                        fire.offset,
                        fire.fire_at,
                    );
                }
            }

            let event = TriggerEvent {
                tracks: fire.tracks,
                step: fire.step,
                fire_at: fire.fire_at,
            };
            if events.try_push(event).is_err() {
                stats.record_dropped_event();
            }
        });

        self.mixer.render(out);
        self.engine_clock.advance(out.len());
    }

    /// Current engine time in samples
    pub fn now(&self) -> u64 {
        self.engine_clock.now()
    }

    fn drain_commands(&mut self, now: u64) {
        while let Some(command) = self.commands.try_pop() {
            match command {
                Command::Start => self.scheduler.start(now),
                Command::Stop => self.scheduler.stop(),
                Command::SetTempo(tempo) => self.clock.set_tempo(tempo),
                Command::SetStepsPerBeat(steps_per_beat) => {
                    self.clock.set_steps_per_beat(steps_per_beat);
                }
                Command::SetPattern { track, pattern } => {
                    if track < self.grid.num_tracks() && pattern.len() == self.grid.num_steps() {
                        let old = self.grid.set_pattern(track, pattern);
                        self.push_reclaimed(Reclaimed::Pattern(old));
                    }
                }
                Command::ClearPattern { track } => {
                    if track < self.grid.num_tracks() {
                        self.grid.clear_track(track);
                    }
                }
                Command::SetGrid(new_grid) => {
                    let old = std::mem::replace(&mut self.grid, new_grid);
                    self.scheduler.grid_resized(self.grid.num_steps());
                    self.push_reclaimed(Reclaimed::Grid(old));
                }
                Command::SetSounds(new_sounds) => {
                    let old = std::mem::replace(&mut self.sounds, new_sounds);
                    self.push_reclaimed(Reclaimed::Sounds(old));
                }
            }
        }
    }

    fn push_reclaimed(&mut self, value: Reclaimed) {
        if self.reclaim.try_push(value).is_err() {
            self.stats.record_reclaim_overflow();
        }
    }
}
