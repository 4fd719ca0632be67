// Sample store - Registry of decoded PCM buffers
//
// Owns the immutable mono buffers the mixer plays. Sounds are registered
// pre-decoded (file decoding is the caller's concern) and resolved to
// Arc references when a sound set is assigned to the tracks. Replacing a
// sound swaps the Arc; buffers are never mutated in place, so the audio
// thread can hold references without any synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigError;

/// The per-track sound assignment published to the audio thread.
/// `None` means no sound assigned; the track still participates in
/// trigger events but produces no audio.
pub type TrackSounds = Box<[Option<Arc<SampleBuffer>>]>;

/// An immutable decoded sample
///
/// Mono f32 PCM; stereo placement comes from the pan law at playback time.
#[derive(Debug)]
pub struct SampleBuffer {
    name: String,
    data: Box<[f32]>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(name: impl Into<String>, data: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            data: data.into_boxed_slice(),
            sample_rate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Length in frames
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Identifier → buffer registry
#[derive(Debug, Default)]
pub struct SampleStore {
    samples: HashMap<String, Arc<SampleBuffer>>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded buffer under an identifier, replacing any
    /// previous buffer with that identifier. Returns the shared reference.
    pub fn register(&mut self, id: impl Into<String>, buffer: SampleBuffer) -> Arc<SampleBuffer> {
        let arc = Arc::new(buffer);
        self.samples.insert(id.into(), Arc::clone(&arc));
        arc
    }

    /// Look up a buffer by identifier
    pub fn resolve(&self, id: &str) -> Result<Arc<SampleBuffer>, ConfigError> {
        self.samples
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownSound(id.to_string()))
    }

    /// Resolve an ordered list of identifiers, one per track.
    ///
    /// Fails without side effects if the count does not match the track
    /// count or any identifier is unknown.
    pub fn resolve_set(&self, ids: &[&str], num_tracks: usize) -> Result<TrackSounds, ConfigError> {
        if ids.len() != num_tracks {
            return Err(ConfigError::SoundCountMismatch {
                expected: num_tracks,
                got: ids.len(),
            });
        }
        ids.iter()
            .map(|id| self.resolve(id).map(Some))
            .collect::<Result<Vec<_>, _>>()
            .map(Vec::into_boxed_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.samples.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(name: &str, frames: usize) -> SampleBuffer {
        SampleBuffer::new(name, vec![0.5; frames], 48000)
    }

    #[test]
    fn test_register_and_resolve() {
        let mut store = SampleStore::new();
        store.register("kick", buffer("Kick", 1000));

        let resolved = store.resolve("kick").unwrap();
        assert_eq!(resolved.name(), "Kick");
        assert_eq!(resolved.len(), 1000);
        assert_eq!(resolved.sample_rate(), 48000);
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let store = SampleStore::new();
        let err = store.resolve("ghost").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSound(id) if id == "ghost"));
    }

    #[test]
    fn test_register_replaces_by_swapping() {
        let mut store = SampleStore::new();
        let first = store.register("kick", buffer("Kick v1", 100));
        store.register("kick", buffer("Kick v2", 200));

        // The old Arc stays valid for anyone still holding it
        assert_eq!(first.name(), "Kick v1");
        assert_eq!(store.resolve("kick").unwrap().name(), "Kick v2");
    }

    #[test]
    fn test_resolve_set() {
        let mut store = SampleStore::new();
        store.register("kick", buffer("Kick", 10));
        store.register("snare", buffer("Snare", 20));

        let sounds = store.resolve_set(&["kick", "snare"], 2).unwrap();
        assert_eq!(sounds.len(), 2);
        assert_eq!(sounds[0].as_ref().unwrap().name(), "Kick");
        assert_eq!(sounds[1].as_ref().unwrap().name(), "Snare");
    }

    #[test]
    fn test_resolve_set_count_mismatch() {
        let mut store = SampleStore::new();
        store.register("kick", buffer("Kick", 10));

        let err = store.resolve_set(&["kick"], 4).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SoundCountMismatch {
                expected: 4,
                got: 1
            }
        ));
    }

    #[test]
    fn test_resolve_set_unknown_id() {
        let mut store = SampleStore::new();
        store.register("kick", buffer("Kick", 10));

        let err = store.resolve_set(&["kick", "missing"], 2).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSound(_)));
    }
}
