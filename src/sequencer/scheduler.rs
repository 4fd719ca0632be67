// Step scheduler - Transport state machine and lookahead scheduling
//
// The scheduler walks the step grid at the clock's rate. Each render
// quantum it fires every step boundary whose time falls inside
// [quantum_start, quantum_start + frames): the grid flags are read at that
// moment (snapshot-at-schedule rule), the mixer is triggered at the exact
// in-buffer offset, and one trigger event per boundary is handed to the
// caller. Boundary times accumulate in an f64 sample count (`next_fire +=
// step_len`), so the fractional carry is preserved and long runs do not
// drift; tempo changes replace the increment, never the accumulated time.

use crate::messaging::event::TrackMask;
use crate::sequencer::clock::StepClock;
use crate::sequencer::grid::StepGrid;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Running,
}

impl TransportState {
    pub fn is_running(&self) -> bool {
        matches!(self, TransportState::Running)
    }
}

/// One fired step boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepFire {
    /// Tracks whose flag is on at this step
    pub tracks: TrackMask,
    /// Step index in `[0, num_steps)`
    pub step: usize,
    /// Absolute engine time of the boundary, in samples
    pub fire_at: u64,
    /// Offset of the boundary inside the current render quantum
    pub offset: usize,
}

/// The core transport/scheduling state machine
#[derive(Debug)]
pub struct StepScheduler {
    state: TransportState,
    current_step: usize,
    /// Absolute time of the next unscheduled boundary, in samples.
    /// Fractional carry lives here; only meaningful while Running.
    next_fire: f64,
}

impl StepScheduler {
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            current_step: 0,
            next_fire: 0.0,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Step index of the next boundary to fire
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Start the transport. Idempotent: a start while running is a no-op.
    ///
    /// Resets the position to step 0; step 0 fires at `now`, the first
    /// frame processed after the command is drained.
    pub fn start(&mut self, now: u64) {
        if self.state.is_running() {
            return;
        }
        self.state = TransportState::Running;
        self.current_step = 0;
        self.next_fire = now as f64;
    }

    /// Stop the transport. Idempotent.
    ///
    /// Boundaries not yet scheduled are cancelled with the transition;
    /// voices the mixer already started are not touched here.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
    }

    /// Keep the step position valid after a grid reshape.
    pub fn grid_resized(&mut self, num_steps: usize) {
        if num_steps > 0 && self.current_step >= num_steps {
            self.current_step %= num_steps;
        }
    }

    /// Fire every boundary inside `[quantum_start, quantum_start + frames)`.
    ///
    /// Each boundary is visited exactly once: `next_fire` advances past it
    /// in the same iteration that reports it, so double-scheduling cannot
    /// occur across quanta of any size.
    pub fn process(
        &mut self,
        clock: &StepClock,
        grid: &StepGrid,
        quantum_start: u64,
        frames: usize,
        on_step: &mut impl FnMut(StepFire),
    ) {
        if !self.state.is_running() || grid.num_steps() == 0 {
            return;
        }

        let quantum_end = quantum_start + frames as u64;
        while (self.next_fire as u64) < quantum_end {
            // A boundary is never scheduled before the quantum that
            // discovers it.
            let fire_at = (self.next_fire as u64).max(quantum_start);
            let offset = (fire_at - quantum_start) as usize;

            on_step(StepFire {
                tracks: grid.tracks_on_at(self.current_step),
                step: self.current_step,
                fire_at,
                offset,
            });

            self.next_fire += clock.step_len_samples();
            self.current_step += 1;
            if self.current_step >= grid.num_steps() {
                self.current_step = 0;
            }
        }
    }
}

impl Default for StepScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::clock::Tempo;
    use crate::sequencer::grid::StepPattern;

    fn clock_120bpm() -> StepClock {
        // 24000 samples per step at 48 kHz
        StepClock::new(48000.0, Tempo::new(120.0).unwrap(), 1)
    }

    fn collect_fires(
        scheduler: &mut StepScheduler,
        clock: &StepClock,
        grid: &StepGrid,
        start: u64,
        frames: usize,
    ) -> Vec<StepFire> {
        let mut fires = Vec::new();
        scheduler.process(clock, grid, start, frames, &mut |fire| fires.push(fire));
        fires
    }

    #[test]
    fn test_stopped_scheduler_fires_nothing() {
        let clock = clock_120bpm();
        let grid = StepGrid::new(2, 8);
        let mut scheduler = StepScheduler::new();

        let fires = collect_fires(&mut scheduler, &clock, &grid, 0, 48000);
        assert!(fires.is_empty());
    }

    #[test]
    fn test_step_zero_fires_immediately_on_start() {
        let clock = clock_120bpm();
        let grid = StepGrid::new(2, 8);
        let mut scheduler = StepScheduler::new();

        scheduler.start(512);
        let fires = collect_fires(&mut scheduler, &clock, &grid, 512, 256);
        assert_eq!(fires.len(), 1);
        assert_eq!(fires[0].step, 0);
        assert_eq!(fires[0].fire_at, 512);
        assert_eq!(fires[0].offset, 0);
    }

    #[test]
    fn test_boundaries_accumulate_without_drift() {
        let clock = clock_120bpm();
        let grid = StepGrid::new(1, 4);
        let mut scheduler = StepScheduler::new();
        scheduler.start(0);

        // Walk 10 steps in odd-sized quanta; fire times must be exact
        // multiples of 24000 regardless of quantum boundaries.
        let mut fires = Vec::new();
        let mut pos = 0u64;
        while fires.len() < 10 {
            let frames = 1000;
            scheduler.process(&clock, &grid, pos, frames, &mut |f| fires.push(f));
            pos += frames as u64;
        }
        for (i, fire) in fires.iter().take(10).enumerate() {
            assert_eq!(fire.fire_at, i as u64 * 24000);
            assert_eq!(fire.step, i % 4);
        }
    }

    #[test]
    fn test_fractional_carry() {
        // 44100 Hz at 141 BPM: step = 44100 * 60 / 141 = 18765.957... samples
        let clock = StepClock::new(44100.0, Tempo::new(141.0).unwrap(), 1);
        let grid = StepGrid::new(1, 16);
        let mut scheduler = StepScheduler::new();
        scheduler.start(0);

        let mut fires = Vec::new();
        let mut pos = 0u64;
        while fires.len() < 100 {
            scheduler.process(&clock, &grid, pos, 4096, &mut |f| fires.push(f));
            pos += 4096;
        }

        // The 100th boundary must sit at floor(99 * exact_len): the carry
        // accumulates instead of flooring per step.
        let exact = 44100.0 * 60.0 / 141.0;
        assert_eq!(fires[99].fire_at, (99.0 * exact) as u64);
    }

    #[test]
    fn test_tempo_change_is_not_retroactive() {
        let mut clock = clock_120bpm();
        let grid = StepGrid::new(1, 8);
        let mut scheduler = StepScheduler::new();
        scheduler.start(0);

        // First two boundaries at the old tempo
        let fires = collect_fires(&mut scheduler, &clock, &grid, 0, 30000);
        assert_eq!(fires.len(), 2);
        assert_eq!(fires[1].fire_at, 24000);

        // Change tempo between quanta: the pending boundary keeps its
        // accumulated time, only the spacing after it changes.
        clock.set_tempo(Tempo::new(60.0).unwrap());
        let fires = collect_fires(&mut scheduler, &clock, &grid, 30000, 120000);
        assert_eq!(fires[0].fire_at, 48000); // scheduled before the change
        assert_eq!(fires[1].fire_at, 96000); // 48000 apart at 60 BPM
    }

    #[test]
    fn test_steps_wrap_modulo_num_steps() {
        let clock = clock_120bpm();
        let grid = StepGrid::new(1, 3);
        let mut scheduler = StepScheduler::new();
        scheduler.start(0);

        let fires = collect_fires(&mut scheduler, &clock, &grid, 0, 24000 * 7);
        let steps: Vec<usize> = fires.iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_start_is_idempotent() {
        let clock = clock_120bpm();
        let grid = StepGrid::new(1, 8);
        let mut scheduler = StepScheduler::new();

        scheduler.start(0);
        collect_fires(&mut scheduler, &clock, &grid, 0, 30000);
        assert_eq!(scheduler.current_step(), 2);

        // start while running must not rewind the transport
        scheduler.start(30000);
        assert_eq!(scheduler.current_step(), 2);
    }

    #[test]
    fn test_stop_start_resets_to_step_zero() {
        let clock = clock_120bpm();
        let grid = StepGrid::new(1, 8);
        let mut scheduler = StepScheduler::new();

        scheduler.start(0);
        collect_fires(&mut scheduler, &clock, &grid, 0, 60000);

        scheduler.stop();
        scheduler.stop(); // idempotent

        scheduler.start(100000);
        let fires = collect_fires(&mut scheduler, &clock, &grid, 100000, 512);
        assert_eq!(fires[0].step, 0);
        assert_eq!(fires[0].fire_at, 100000);
    }

    #[test]
    fn test_grid_flags_read_at_schedule_time() {
        let clock = clock_120bpm();
        let mut grid = StepGrid::new(1, 4);
        grid.set_pattern(0, StepPattern::from_flags(&[true, false, false, false]));

        let mut scheduler = StepScheduler::new();
        scheduler.start(0);

        let fires = collect_fires(&mut scheduler, &clock, &grid, 0, 24000);
        assert!(fires[0].tracks.contains(0));

        // Flag turned off before the next cycle's step 0 is honored there
        grid.clear_track(0);
        let fires = collect_fires(&mut scheduler, &clock, &grid, 24000, 24000 * 4);
        assert!(fires.iter().all(|f| f.tracks.is_empty()));
    }

    #[test]
    fn test_grid_resized_clamps_step() {
        let clock = clock_120bpm();
        let grid = StepGrid::new(1, 8);
        let mut scheduler = StepScheduler::new();
        scheduler.start(0);
        collect_fires(&mut scheduler, &clock, &grid, 0, 24000 * 6);
        assert_eq!(scheduler.current_step(), 6);

        scheduler.grid_resized(4);
        assert_eq!(scheduler.current_step(), 2);
    }
}
