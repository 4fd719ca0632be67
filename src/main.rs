// Demo binary - Four synthesized drum tracks on a 16-step grid
//
// Exercises the engine against the default output device: registers
// synthesized percussion buffers, programs a basic beat, runs the
// transport for a few bars while printing trigger notifications, then
// stops.

use std::f32::consts::PI;
use std::time::Duration;

use gridbeat::{AudioOutput, EngineConfig, SampleBuffer, SampleStore, StepEngine};

/// Synthesize a short percussive hit: a sine burst with exponential decay.
fn percussion_hit(sample_rate: u32, duration_ms: f32, frequency: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = ((duration_ms / 1000.0) * sample_rate as f32) as usize;
    let phase_increment = 2.0 * PI * frequency / sample_rate as f32;

    (0..num_samples)
        .map(|i| {
            let t = i as f32 / num_samples as f32;
            let envelope = (-t * 8.0).exp();
            (i as f32 * phase_increment).sin() * envelope * amplitude
        })
        .collect()
}

fn main() {
    println!("=== gridbeat demo ===\n");

    let sample_rate = match AudioOutput::default_sample_rate() {
        Ok(rate) => rate,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return;
        }
    };
    println!("Output device sample rate: {sample_rate} Hz");

    let mut store = SampleStore::new();
    let sr = sample_rate as u32;
    store.register("kick", SampleBuffer::new("Kick", percussion_hit(sr, 180.0, 60.0, 0.9), sr));
    store.register("snare", SampleBuffer::new("Snare", percussion_hit(sr, 120.0, 220.0, 0.6), sr));
    store.register("hat", SampleBuffer::new("Hat", percussion_hit(sr, 40.0, 3200.0, 0.3), sr));
    store.register("clave", SampleBuffer::new("Clave", percussion_hit(sr, 60.0, 1200.0, 0.4), sr));

    let config = EngineConfig {
        num_tracks: 4,
        num_steps: 16,
        steps_per_beat: 4,
        tempo_bpm: 120.0,
    };
    let (mut engine, core) = match StepEngine::new(config, sample_rate) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return;
        }
    };

    if let Err(e) = engine.set_sounds(&store, &["kick", "snare", "hat", "clave"]) {
        eprintln!("ERROR: {e}");
        return;
    }

    // A basic house beat
    let kick: Vec<bool> = (0..16).map(|s| s % 4 == 0).collect();
    let snare: Vec<bool> = (0..16).map(|s| s % 8 == 4).collect();
    let hat: Vec<bool> = (0..16).map(|s| s % 2 == 1).collect();
    let clave: Vec<bool> = (0..16).map(|s| matches!(s, 3 | 10)).collect();

    engine.set_step_sequence(&kick, 0).unwrap();
    engine.set_step_sequence(&snare, 1).unwrap();
    engine.set_step_sequence(&hat, 2).unwrap();
    engine.set_step_sequence(&clave, 3).unwrap();

    engine.set_amp_gain(1.2, 0).unwrap();
    engine.set_amp_gain(0.9, 1).unwrap();
    engine.set_pan_position(0.4, 2).unwrap();
    engine.set_pan_position(-0.4, 3).unwrap();

    let mut receiver = engine.trigger_receiver().expect("receiver not yet taken");
    let clock = engine.clock();

    let output = match AudioOutput::start(core) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return;
        }
    };
    println!(
        "Audio running ({} channels). Playing 4 bars at {} BPM...\n",
        output.channels(),
        engine.tempo()
    );

    engine.start().unwrap();

    // 4 bars of 4/4 at 120 BPM = 8 seconds
    let run_for = Duration::from_secs(8);
    let started = std::time::Instant::now();
    while started.elapsed() < run_for {
        while let Some(event) = receiver.poll() {
            if event.tracks.is_empty() {
                continue;
            }
            let tracks: Vec<usize> = event.tracks.iter().collect();
            println!(
                "step {:2} fires tracks {:?} in {:>6.1} ms",
                event.step,
                tracks,
                clock.duration_until(event.fire_at).as_secs_f64() * 1000.0
            );
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    engine.stop().unwrap();
    println!("\nStopped. Stats: {:?}", engine.stats());
}
