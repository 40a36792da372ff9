//! Suppression of competing media playback during a break.
//!
//! The engine pauses whatever is playing when a break starts and resumes it
//! when the break ends, but only if it was the one that paused it.
//!
//! - [`MediaSuppressor`]: the capability the engine invokes
//! - [`TrackingSuppressor`]: self-tracking implementation over a [`PlaybackControl`]
//! - [`NullPlayback`]: reports nothing playing, never toggles
//! - [`MockPlaybackControl`], [`MockMediaSuppressor`]: test doubles

mod error;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

pub use error::MediaError;

/// Capability invoked by the engine at break start and end.
///
/// Both calls are idempotent.
pub trait MediaSuppressor: Send {
    /// Pauses system playback if something is playing.
    fn pause_if_playing(&mut self);

    /// Resumes playback, only if `pause_if_playing` actually paused it.
    fn resume_if_needed(&mut self);
}

/// Low-level control over the system's now-playing session.
pub trait PlaybackControl: Send + Sync {
    /// Returns true if some application is currently playing media.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::QueryFailed` if the state cannot be read.
    fn is_playing(&self) -> Result<bool, MediaError>;

    /// Sends a play/pause toggle.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::ToggleFailed` if the toggle cannot be delivered.
    fn toggle(&self) -> Result<(), MediaError>;
}

impl<P: PlaybackControl + ?Sized> PlaybackControl for Arc<P> {
    fn is_playing(&self) -> Result<bool, MediaError> {
        (**self).is_playing()
    }

    fn toggle(&self) -> Result<(), MediaError> {
        (**self).toggle()
    }
}

// ============================================================================
// TrackingSuppressor
// ============================================================================

/// Suppressor that remembers whether it paused anything.
#[derive(Debug)]
pub struct TrackingSuppressor<P> {
    control: P,
    paused_by_us: bool,
}

impl<P: PlaybackControl> TrackingSuppressor<P> {
    pub fn new(control: P) -> Self {
        Self {
            control,
            paused_by_us: false,
        }
    }

    /// Returns true if playback is currently held paused by this suppressor.
    #[must_use]
    pub fn is_suppressing(&self) -> bool {
        self.paused_by_us
    }
}

impl<P: PlaybackControl> MediaSuppressor for TrackingSuppressor<P> {
    fn pause_if_playing(&mut self) {
        if self.paused_by_us {
            return;
        }
        match self.control.is_playing() {
            Ok(true) => match self.control.toggle() {
                Ok(()) => {
                    debug!("Paused system media playback");
                    self.paused_by_us = true;
                }
                Err(e) => warn!("{} ({})", e, e.suggestion()),
            },
            Ok(false) => {}
            Err(e) => warn!("{} ({})", e, e.suggestion()),
        }
    }

    fn resume_if_needed(&mut self) {
        if !self.paused_by_us {
            return;
        }
        self.paused_by_us = false;
        match self.control.toggle() {
            Ok(()) => debug!("Resumed system media playback"),
            Err(e) => warn!("{} ({})", e, e.suggestion()),
        }
    }
}

/// Playback control for systems with no now-playing integration.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayback;

impl PlaybackControl for NullPlayback {
    fn is_playing(&self) -> Result<bool, MediaError> {
        Ok(false)
    }

    fn toggle(&self) -> Result<(), MediaError> {
        Ok(())
    }
}

/// Returns the suppressor used by the daemon.
pub fn default_suppressor() -> Box<dyn MediaSuppressor> {
    Box::new(TrackingSuppressor::new(NullPlayback))
}

// ============================================================================
// Mocks
// ============================================================================

/// Mock playback control for testing.
///
/// Toggling flips the simulated playing state.
#[derive(Debug, Default)]
pub struct MockPlaybackControl {
    playing: AtomicBool,
    toggle_calls: AtomicUsize,
    fail_toggle: AtomicBool,
}

impl MockPlaybackControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn set_fail_toggle(&self, fail: bool) {
        self.fail_toggle.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn toggle_count(&self) -> usize {
        self.toggle_calls.load(Ordering::SeqCst)
    }
}

impl PlaybackControl for MockPlaybackControl {
    fn is_playing(&self) -> Result<bool, MediaError> {
        Ok(self.playing())
    }

    fn toggle(&self) -> Result<(), MediaError> {
        if self.fail_toggle.load(Ordering::SeqCst) {
            return Err(MediaError::ToggleFailed("Mock failure".to_string()));
        }
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        self.playing.fetch_xor(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock suppressor for testing. Counts calls through shared counters.
#[derive(Debug, Default, Clone)]
pub struct MockMediaSuppressor {
    pause_calls: Arc<AtomicUsize>,
    resume_calls: Arc<AtomicUsize>,
}

impl MockMediaSuppressor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pause_count(&self) -> usize {
        self.pause_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn resume_count(&self) -> usize {
        self.resume_calls.load(Ordering::SeqCst)
    }
}

impl MediaSuppressor for MockMediaSuppressor {
    fn pause_if_playing(&mut self) {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn resume_if_needed(&mut self) {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
    }
}
