// Sampler module - Decoded sample buffers and playback voices

pub mod store;
pub mod voice;

pub use store::{SampleBuffer, SampleStore, TrackSounds};
pub use voice::Voice;
