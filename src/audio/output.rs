// Audio output - CPAL stream driving the engine core
//
// # Format support
//
// The engine processes audio in f32 internally; the stream is built for
// whatever sample format the device prefers (F32, I16, U16) and frames are
// converted as they are written into the interleaved output buffer.
//
// The callback owns the EngineCore outright: no sharing, no locks. Output
// buffers larger than the pre-allocated scratch are processed in chunks,
// so the callback never allocates regardless of device buffer size.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{error, info};

use crate::audio::format_conversion::{StereoFrame, write_frame_to_interleaved};
use crate::engine::EngineCore;
use crate::error::AudioError;

/// Scratch capacity in frames. Device buffers are typically 128-2048
/// frames; anything larger is processed in chunks of this size.
const SCRATCH_FRAMES: usize = 4096;

pub struct AudioOutput {
    _device: Device,
    _stream: Stream,
    sample_rate: f64,
    channels: usize,
}

impl AudioOutput {
    /// Sample rate of the default output device.
    ///
    /// Query this before building the engine so the core's clock matches
    /// the stream it will be driven by.
    pub fn default_sample_rate() -> Result<f64, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let supported = device.default_output_config()?;
        Ok(supported.sample_rate().0 as f64)
    }

    /// Open the default output device and start rendering `core`.
    pub fn start(core: EngineCore) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let sample_rate = supported.sample_rate().0 as f64;
        let channels = supported.channels() as usize;
        let config: StreamConfig = supported.into();

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, channels, core),
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, channels, core),
            SampleFormat::U16 => Self::build_stream::<u16>(&device, &config, channels, core),
            other => return Err(AudioError::UnsupportedFormat(other)),
        }?;

        stream.play()?;
        info!(
            "audio output started: {} Hz, {} channels, {:?}",
            sample_rate, channels, sample_format
        );

        Ok(Self {
            _device: device,
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Build an output stream for one sample format.
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut core: EngineCore,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let mut scratch = vec![StereoFrame::SILENCE; SCRATCH_FRAMES];

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // ========== SACRED ZONE ==========
                // No allocations, no I/O, no blocking locks
                for chunk in data.chunks_mut(SCRATCH_FRAMES * channels) {
                    let frames = chunk.len() / channels;
                    let quantum = &mut scratch[..frames];
                    core.process(quantum);

                    for (frame, out) in quantum.iter().zip(chunk.chunks_mut(channels)) {
                        write_frame_to_interleaved(*frame, out);
                    }
                }
                // ========== SACRED ZONE END ==========
            },
            move |err| {
                // Runs outside the audio callback, so logging is safe here
                error!("audio stream error: {err}");
            },
            None,
        )?;

        Ok(stream)
    }
}
