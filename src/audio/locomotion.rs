//! Looping footstep sounds, one per direction key.
//!
//! Each direction owns a [`LoopToken`]. Starting a loop installs a fresh,
//! active token and hands a clone to the playback task; releasing the key
//! cancels it. At most one direction is active at a time, and loops only
//! start while the player is grounded.
use super::SoundService;
use bevy::prelude::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation token shared between the frame thread and one loop task.
#[derive(Clone, Debug, Default)]
pub struct LoopToken(Arc<AtomicBool>);

impl LoopToken {
    /// A token in the active state.
    #[must_use]
    pub fn started() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Direction key that owns a footstep loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stride {
    Forward,
    Left,
    Back,
    Right,
}

impl Stride {
    pub const ALL: [Stride; 4] = [Stride::Forward, Stride::Left, Stride::Back, Stride::Right];

    fn index(self) -> usize {
        match self {
            Stride::Forward => 0,
            Stride::Left => 1,
            Stride::Back => 2,
            Stride::Right => 3,
        }
    }
}

#[derive(Debug, Default)]
pub struct LocomotionSounds {
    tokens: [LoopToken; 4],
}

impl LocomotionSounds {
    #[must_use]
    pub fn is_playing(&self, stride: Stride) -> bool {
        self.tokens[stride.index()].is_active()
    }

    /// The direction whose loop is currently running, if any.
    #[must_use]
    pub fn active(&self) -> Option<Stride> {
        Stride::ALL.into_iter().find(|s| self.is_playing(*s))
    }

    /// Start the loop for `stride` unless the player is airborne or another
    /// loop (including this one) is already running.
    ///
    /// Returns whether a loop was started. Nothing is marked playing when the
    /// sound service drops the request.
    pub fn try_start(&mut self, stride: Stride, grounded: bool, audio: &SoundService, clip: &str) -> bool {
        if !grounded || self.active().is_some() {
            return false;
        }
        let token = LoopToken::started();
        if !audio.start_loop(clip, token.clone()) {
            return false;
        }
        self.tokens[stride.index()] = token;
        debug!("footstep loop started for {stride:?}");
        true
    }

    /// The key for `stride` went up.
    pub fn release(&mut self, stride: Stride) {
        let token = &self.tokens[stride.index()];
        if token.is_active() {
            token.cancel();
            debug!("footstep loop released for {stride:?}");
        }
    }

    pub fn cancel_all(&mut self) {
        for token in &self.tokens {
            token.cancel();
        }
    }

    /// Cancel every loop and cut off whatever is playing (jump, landing).
    pub fn interrupt(&mut self, audio: &SoundService) {
        self.cancel_all();
        if let Err(e) = audio.stop_all() {
            debug!("stop_all during interrupt: {e}");
        }
    }
}

#[cfg(test)]
impl LocomotionSounds {
    pub(crate) fn token(&self, stride: Stride) -> LoopToken {
        self.tokens[stride.index()].clone()
    }
}

impl Drop for LocomotionSounds {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
