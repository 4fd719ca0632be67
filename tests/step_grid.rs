//! Step grid and control-surface validation tests
//!
//! Everything here is about the facade's contract: exact read-back,
//! reject-don't-coerce validation, clamped continuous controls.

use gridbeat::{ConfigError, EngineConfig, EngineError, SampleBuffer, SampleStore, StepEngine};

fn engine(num_tracks: usize, num_steps: usize) -> StepEngine {
    let config = EngineConfig {
        num_tracks,
        num_steps,
        steps_per_beat: 1,
        tempo_bpm: 120.0,
    };
    let (engine, _core) = StepEngine::new(config, 48000.0).unwrap();
    engine
}

#[test]
fn test_read_back_returns_exact_flags_for_all_tracks() {
    let mut engine = engine(4, 8);

    for track in 0..4 {
        let flags: Vec<bool> = (0..8).map(|s| (s + track) % 3 == 0).collect();
        engine.set_step_sequence(&flags, track).unwrap();
    }
    for track in 0..4 {
        let expected: Vec<bool> = (0..8).map(|s| (s + track) % 3 == 0).collect();
        assert_eq!(engine.pattern(track).unwrap(), &expected);
    }
}

#[test]
fn test_mismatched_length_is_rejected_not_coerced() {
    let mut engine = engine(2, 8);
    let original = [true, false, true, false, true, false, true, false];
    engine.set_step_sequence(&original, 0).unwrap();

    // Too short
    let err = engine.set_step_sequence(&[true; 4], 0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Config(ConfigError::StepCountMismatch {
            expected: 8,
            got: 4
        })
    ));

    // Too long
    let err = engine.set_step_sequence(&[true; 9], 0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Config(ConfigError::StepCountMismatch {
            expected: 8,
            got: 9
        })
    ));

    // The previous sequence is intact in both cases
    assert_eq!(engine.pattern(0).unwrap(), &original);
}

#[test]
fn test_track_index_validation() {
    let mut engine = engine(2, 4);

    let err = engine.set_step_sequence(&[false; 4], 2).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Config(ConfigError::TrackOutOfRange {
            track: 2,
            num_tracks: 2
        })
    ));
    assert!(engine.clear_sequence(2).is_err());
    assert!(engine.set_amp_gain(1.0, 2).is_err());
    assert!(engine.set_pan_position(0.0, 2).is_err());
    assert!(engine.pattern(2).is_err());
    assert!(engine.amp_gain(2).is_err());
}

#[test]
fn test_clear_sequence() {
    let mut engine = engine(2, 4);
    engine.set_step_sequence(&[true; 4], 1).unwrap();
    engine.clear_sequence(1).unwrap();
    assert_eq!(engine.pattern(1).unwrap(), &[false; 4]);
}

#[test]
fn test_num_steps_reshape_preserves_prefix() {
    let mut engine = engine(2, 8);
    engine
        .set_step_sequence(&[true, false, true, true, false, false, false, true], 0)
        .unwrap();

    // Shrink: tail discarded
    engine.set_num_steps(4).unwrap();
    assert_eq!(engine.num_steps(), 4);
    assert_eq!(engine.pattern(0).unwrap(), &[true, false, true, true]);

    // Grow: new steps default to off for every track
    engine.set_num_steps(10).unwrap();
    assert_eq!(
        engine.pattern(0).unwrap(),
        &[true, false, true, true, false, false, false, false, false, false]
    );
    assert_eq!(engine.pattern(1).unwrap(), &[false; 10]);

    // Sequences must now match the new length
    assert!(engine.set_step_sequence(&[true; 4], 0).is_err());
    assert!(engine.set_step_sequence(&[true; 10], 0).is_ok());
}

#[test]
fn test_continuous_controls_clamp_instead_of_failing() {
    let engine = engine(1, 4);

    // Gain clamps to [0, 2]
    engine.set_amp_gain(2.7, 0).unwrap();
    assert_eq!(engine.amp_gain(0).unwrap(), 2.0);
    engine.set_amp_gain(-0.3, 0).unwrap();
    assert_eq!(engine.amp_gain(0).unwrap(), 0.0);
    engine.set_amp_gain(1.5, 0).unwrap();
    assert_eq!(engine.amp_gain(0).unwrap(), 1.5);

    // Pan clamps to [-1, 1]
    engine.set_pan_position(2.0, 0).unwrap();
    assert_eq!(engine.pan_position(0).unwrap(), 1.0);
    engine.set_pan_position(-2.0, 0).unwrap();
    assert_eq!(engine.pan_position(0).unwrap(), -1.0);
}

#[test]
fn test_sound_assignment_is_all_or_nothing() {
    let mut engine = engine(3, 4);
    let mut store = SampleStore::new();
    store.register("a", SampleBuffer::new("A", vec![0.1; 10], 48000));
    store.register("b", SampleBuffer::new("B", vec![0.2; 10], 48000));

    assert!(engine.set_sounds(&store, &["a", "b"]).is_err());
    assert!(engine.set_sounds(&store, &["a", "b", "nope"]).is_err());
    assert!(engine.set_sounds(&store, &["a", "b", "a"]).is_ok());
}

#[test]
fn test_defaults() {
    let engine = engine(4, 16);
    assert_eq!(engine.num_tracks(), 4);
    assert_eq!(engine.num_steps(), 16);
    assert_eq!(engine.tempo(), 120.0);
    assert_eq!(engine.steps_per_beat(), 1);

    for track in 0..4 {
        assert_eq!(engine.amp_gain(track).unwrap(), 1.0);
        assert_eq!(engine.pan_position(track).unwrap(), 0.0);
        assert!(engine.pattern(track).unwrap().iter().all(|f| !f));
    }
    assert_eq!(engine.master_volume(), 1.0);
}
