//! Contract with the external playback service.

use tracing::debug;

use crate::event::Track;

/// Implemented by the sequencer service that actually renders audio. The
/// engine hands over the live track and its resolution; every channel plays
/// regardless of the editor's visibility filter.
pub trait Sequencer {
    fn start(&mut self, track: &Track, resolution: u16);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Drives a [`Sequencer`] and reports completion exactly once through a
/// registered callback. The host decides when to poll; the engine runs no
/// thread of its own, so edits and playback control stay serialized in the
/// caller.
pub struct Transport<S: Sequencer> {
    backend: S,
    playing: bool,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl<S: Sequencer> Transport<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            playing: false,
            on_complete: None,
        }
    }

    /// Register the function called when playback runs off the end of the
    /// track. Stopping explicitly does not count as completion.
    pub fn on_complete(&mut self, f: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    pub fn play(&mut self, track: &Track, resolution: u16) {
        self.backend.start(track, resolution);
        self.playing = true;
        debug!(events = track.len(), "playback started");
    }

    /// Stop the sequencer. Idempotent.
    pub fn stop(&mut self) {
        if self.playing {
            self.backend.stop();
            self.playing = false;
            debug!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Check whether the sequencer ran out of events since the last call,
    /// firing the completion callback if so.
    pub fn poll(&mut self) {
        if self.playing && !self.backend.is_running() {
            self.playing = false;
            if let Some(f) = &mut self.on_complete {
                f();
            }
        }
    }
}
