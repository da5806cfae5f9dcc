//! Audio playback boundary.
//!
//! The core never owns audio devices; it only asks a backend to play the
//! posed note and learns whether playback actually started.

use crate::model::note::Note;

/// Playback backend implemented by the host (web audio, native synth, ...).
pub trait AudioBackend {
    fn is_audio_initialized(&self) -> bool;

    /// Attempts lazy initialization, typically after a user gesture.
    ///
    /// Returns whether audio is usable afterwards.
    fn initialize_audio(&mut self) -> bool {
        self.is_audio_initialized()
    }

    /// Starts playing `note`; returns whether playback was initiated.
    fn play_note(&mut self, note: &Note) -> bool;
}

/// Backend for hosts without sound output; every request "plays".
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioBackend for SilentAudio {
    fn is_audio_initialized(&self) -> bool {
        true
    }

    fn play_note(&mut self, _note: &Note) -> bool {
        true
    }
}
