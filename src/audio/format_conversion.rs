// Format conversion for CPAL audio streams
//
// The engine processes audio as f32 stereo frames internally; conversion
// to the device's sample format (f32, i16, u16, ...) happens at the moment
// the frame is written into the interleaved output buffer. All conversions
// are allocation-free and suitable for real-time audio callbacks.

use cpal::{FromSample, Sample};

/// One stereo frame of f32 audio
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub const SILENCE: StereoFrame = StereoFrame {
        left: 0.0,
        right: 0.0,
    };
}

/// Write a stereo frame to the first two channels of an interleaved output
/// frame (e.g., [L, R] for stereo), converting to the device format.
///
/// Extra channels get silence; a mono output gets the L/R average.
#[inline]
pub fn write_frame_to_interleaved<T>(frame: StereoFrame, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    if output_frame.len() >= 2 {
        output_frame[0] = Sample::from_sample::<f32>(frame.left);
        output_frame[1] = Sample::from_sample::<f32>(frame.right);
        for channel_sample in output_frame.iter_mut().skip(2) {
            *channel_sample = Sample::from_sample::<f32>(0.0);
        }
    } else if let Some(channel_sample) = output_frame.first_mut() {
        let mono = (frame.left + frame.right) * 0.5;
        *channel_sample = Sample::from_sample::<f32>(mono);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_frame_stereo_f32() {
        let mut output = [0.0f32; 2];
        write_frame_to_interleaved(
            StereoFrame {
                left: 0.25,
                right: -0.5,
            },
            &mut output,
        );
        assert_eq!(output, [0.25, -0.5]);
    }

    #[test]
    fn test_write_frame_i16_conversion() {
        let mut output = [0i16; 2];
        write_frame_to_interleaved(
            StereoFrame {
                left: 1.0,
                right: -1.0,
            },
            &mut output,
        );
        assert!(output[0] > 32000);
        assert!(output[1] < -32000);
    }

    #[test]
    fn test_write_frame_extra_channels_are_silent() {
        let mut output = [1.0f32; 4];
        write_frame_to_interleaved(
            StereoFrame {
                left: 0.5,
                right: 0.5,
            },
            &mut output,
        );
        assert_eq!(output[2], 0.0);
        assert_eq!(output[3], 0.0);
    }

    #[test]
    fn test_write_frame_mono_downmix() {
        let mut output = [0.0f32; 1];
        write_frame_to_interleaved(
            StereoFrame {
                left: 0.4,
                right: 0.8,
            },
            &mut output,
        );
        assert!((output[0] - 0.6).abs() < 1e-6);
    }
}
