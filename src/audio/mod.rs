//! Sound playback service.
//!
//! The player never talks to an audio device directly. It goes through
//! [`SoundService`], a single owned resource that wraps a thread-safe
//! [`SoundBackend`] and a small task pool dedicated to playback. Playback
//! calls on the backend block until the clip finishes, so every trigger is
//! moved onto the pool:
//!
//! - one-shots are fire-and-forget (`play_detached`), except the jump clip,
//!   which the caller waits on (`play_and_wait`);
//! - locomotion loops replay a clip until their [`LoopToken`] is cancelled.
//!
//! Failures are returned as [`SoundError`] and logged; none of them stop the
//! simulation.
pub mod locomotion;
pub mod mixer;

pub use locomotion::{LocomotionSounds, LoopToken, Stride};
pub use mixer::{resolve_clip_path, HeadlessMixer};

use crate::settings::AudioSettings;
use bevy::prelude::*;
use bevy::tasks::{Task, TaskPool, TaskPoolBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoundError {
    #[error("sound engine is not initialized")]
    NotInitialized,

    #[error("unknown clip '{0}'")]
    UnknownClip(String),

    #[error("clip '{clip}' not found at '{path}'")]
    ClipNotFound { clip: String, path: String },

    #[error("sound engine failure: {0}")]
    Engine(String),
}

/// Playback engine surface. Implementations must be callable from several
/// playback threads at once.
pub trait SoundBackend: Send + Sync + 'static {
    /// Bring the engine up. Calls made before a successful initialize fail
    /// with [`SoundError::NotInitialized`].
    fn initialize(&self) -> Result<(), SoundError>;

    /// Play `clip` to completion. Blocks the calling thread until the clip
    /// ends or `stop_all` interrupts it.
    fn play(&self, clip: &str) -> Result<(), SoundError>;

    /// Interrupt everything currently playing.
    fn stop_all(&self) -> Result<(), SoundError>;

    /// Clips playing right now, when the backend can tell.
    fn active_voices(&self) -> usize {
        0
    }
}

#[derive(Resource)]
pub struct SoundService {
    backend: Arc<dyn SoundBackend>,
    pool: TaskPool,
    shutdown: Arc<AtomicBool>,
    ready: bool,
}

impl SoundService {
    /// Wrap `backend` with a playback pool of `threads` worker threads.
    ///
    /// The engine is not initialized yet; call [`SoundService::initialize`].
    pub fn new(backend: Arc<dyn SoundBackend>, threads: usize) -> Self {
        let pool = TaskPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name("ppo-sound".to_string())
            .build();
        Self {
            backend,
            pool,
            shutdown: Arc::new(AtomicBool::new(false)),
            ready: false,
        }
    }

    /// Initialize the backend. On failure the service stays usable but every
    /// playback request is dropped.
    ///
    /// # Errors
    /// Propagates the backend's initialization error.
    pub fn initialize(&mut self) -> Result<(), SoundError> {
        self.backend.initialize()?;
        self.ready = true;
        info!("sound engine initialized");
        Ok(())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.backend.active_voices()
    }

    /// Start `clip` in the background and return immediately.
    pub fn play_detached(&self, clip: &str) {
        if let Some(task) = self.spawn_play(clip) {
            task.detach();
        }
    }

    /// Start `clip` in the background and block until it has finished.
    ///
    /// # Errors
    /// Returns the playback error, or [`SoundError::NotInitialized`] when the
    /// engine never came up.
    pub fn play_and_wait(&self, clip: &str) -> Result<(), SoundError> {
        match self.spawn_play(clip) {
            Some(task) => futures::executor::block_on(task),
            None => Err(SoundError::NotInitialized),
        }
    }

    /// Replay `clip` back to back until `token` is cancelled or the service
    /// shuts down. A clip already playing when the token is cancelled runs to
    /// its end. A playback error ends the loop and cancels `token`.
    ///
    /// Returns `false`, without spawning anything, when the engine is not ready.
    pub fn start_loop(&self, clip: &str, token: LoopToken) -> bool {
        if !self.ready {
            debug!("sound engine not ready, loop '{clip}' dropped");
            return false;
        }
        let backend = self.backend.clone();
        let shutdown = self.shutdown.clone();
        let clip = clip.to_string();
        self.pool
            .spawn(async move {
                while token.is_active() && !shutdown.load(Ordering::Acquire) {
                    if let Err(e) = backend.play(&clip) {
                        warn!("loop '{clip}' stopped: {e}");
                        token.cancel();
                        break;
                    }
                }
                debug!("loop '{clip}' ended");
            })
            .detach();
        true
    }

    /// Interrupt all playback.
    ///
    /// # Errors
    /// Propagates the backend error; callers in the frame path log and ignore it.
    pub fn stop_all(&self) -> Result<(), SoundError> {
        if !self.ready {
            return Err(SoundError::NotInitialized);
        }
        self.backend.stop_all()
    }

    fn spawn_play(&self, clip: &str) -> Option<Task<Result<(), SoundError>>> {
        if !self.ready {
            debug!("sound engine not ready, '{clip}' dropped");
            return None;
        }
        let backend = self.backend.clone();
        let clip = clip.to_string();
        Some(self.pool.spawn(async move {
            let result = backend.play(&clip);
            if let Err(e) = &result {
                warn!("playing '{clip}' failed: {e}");
            }
            result
        }))
    }
}

/// What state hooks and the input mapper need to trigger sounds: the service
/// plus the clip names configured for each cue.
#[derive(Clone, Copy)]
pub struct SoundCues<'a> {
    pub service: &'a SoundService,
    pub clips: &'a AudioSettings,
}

impl Drop for SoundService {
    fn drop(&mut self) {
        // Loops must see the flag before playback is interrupted, otherwise
        // they start the next repetition and the pool join waits on it.
        self.shutdown.store(true, Ordering::Release);
        if self.ready
            && let Err(e) = self.backend.stop_all()
        {
            warn!("stopping sounds on shutdown failed: {e}");
        }
    }
}

/// Stop every sound once the player entity is gone.
///
/// The player's loop tokens are cancelled when its component drops; this
/// system cuts off whatever is still mid-clip.
#[allow(clippy::needless_pass_by_value)]
pub fn stop_sounds_on_player_removed(
    mut removed: RemovedComponents<crate::player::Player>,
    audio: Res<SoundService>,
) {
    if removed.read().next().is_none() {
        return;
    }
    match audio.stop_all() {
        Ok(()) => info!("player removed, playback stopped"),
        Err(e) => debug!("player removed, stop_all skipped: {e}"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend that records every call. `play` holds for a couple of
    /// milliseconds so loops do not spin.
    #[derive(Default)]
    pub struct RecordingBackend {
        pub calls: Mutex<Vec<String>>,
        pub fail_init: bool,
        pub fail_play: bool,
    }

    impl RecordingBackend {
        pub fn plays(&self, clip: &str) -> usize {
            let wanted = format!("play:{clip}");
            self.calls.lock().unwrap().iter().filter(|c| **c == wanted).count()
        }

        pub fn stops(&self) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == "stop_all").count()
        }
    }

    impl SoundBackend for RecordingBackend {
        fn initialize(&self) -> Result<(), SoundError> {
            if self.fail_init {
                return Err(SoundError::Engine("no device".to_string()));
            }
            self.calls.lock().unwrap().push("initialize".to_string());
            Ok(())
        }

        fn play(&self, clip: &str) -> Result<(), SoundError> {
            self.calls.lock().unwrap().push(format!("play:{clip}"));
            if self.fail_play {
                return Err(SoundError::ClipNotFound { clip: clip.to_string(), path: clip.to_string() });
            }
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        }

        fn stop_all(&self) -> Result<(), SoundError> {
            self.calls.lock().unwrap().push("stop_all".to_string());
            Ok(())
        }
    }

    pub fn service() -> (Arc<RecordingBackend>, SoundService) {
        let backend = Arc::new(RecordingBackend::default());
        let mut service = SoundService::new(backend.clone(), 2);
        service.initialize().unwrap();
        (backend, service)
    }

    /// Poll `cond` for up to a second.
    pub fn eventually(cond: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }
}
