// Error types - Configuration, audio backend and engine-level errors

/// Configuration errors
///
/// Surfaced synchronously at the point of the offending call; the engine
/// state is left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("track index {track} out of range (engine has {num_tracks} tracks)")]
    TrackOutOfRange { track: usize, num_tracks: usize },

    #[error("sequence length {got} does not match the step count {expected}")]
    StepCountMismatch { expected: usize, got: usize },

    #[error("tempo must be a positive, finite BPM value (got {0})")]
    InvalidTempo(f64),

    #[error("steps per beat must be at least 1")]
    InvalidStepsPerBeat,

    #[error("number of steps must be at least 1")]
    InvalidNumSteps,

    #[error("number of tracks must be between 1 and 64 (requested {requested})")]
    InvalidTrackCount { requested: usize },

    #[error("expected {expected} sound identifiers, one per track (got {got})")]
    SoundCountMismatch { expected: usize, got: usize },

    #[error("unknown sound identifier: {0:?}")]
    UnknownSound(String),
}

/// Audio backend errors (device discovery, stream creation)
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("unsupported sample format: {0:?} (supported: F32, I16, U16)")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to query the default stream config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build the output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start the output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Top-level engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    /// The control→audio command ring is full. This means the audio thread
    /// is not draining (stream stalled or not yet started); the call left
    /// the engine unchanged and can be retried.
    #[error("command channel is full; the audio thread is not draining commands")]
    CommandChannelFull,
}
