//! Headless clip mixer and clip-file search.
//!
//! `HeadlessMixer` has no output device. It knows each clip's length from the
//! settings and holds a `play` call for that long, checking every 10 ms
//! whether `stop_all` was issued. That gives the rest of the game the same
//! timing a device-backed engine would, and makes the blocking and
//! interruption behaviour observable in tests.
use super::{SoundBackend, SoundError};
use crate::settings::{AudioSettings, ClipSettings};
use bevy::prelude::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Locate a clip file.
///
/// Tries `path` as given first, then walks from `search_root` up through every
/// ancestor, trying `<dir>/<path>` and `<dir>/<exe-stem>/<path>` at each level.
#[must_use]
pub fn resolve_clip_path(path: &str, search_root: &Path) -> Option<PathBuf> {
    let leaf = Path::new(path);
    if path.is_empty() {
        return None;
    }
    if leaf.is_file() {
        return Some(leaf.to_path_buf());
    }

    let exe_stem = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_os_string()));
    let start = std::fs::canonicalize(search_root).unwrap_or_else(|_| search_root.to_path_buf());

    for dir in start.ancestors() {
        let direct = dir.join(leaf);
        if direct.is_file() {
            return Some(direct);
        }
        if let Some(stem) = &exe_stem {
            let nested = dir.join(stem).join(leaf);
            if nested.is_file() {
                return Some(nested);
            }
        }
    }
    None
}

pub struct HeadlessMixer {
    clips: HashMap<String, ClipSettings>,
    search_root: PathBuf,
    resolved: RwLock<HashMap<String, PathBuf>>,
    initialized: AtomicBool,
    stop_epoch: AtomicU64,
    voices: AtomicUsize,
}

impl HeadlessMixer {
    pub fn new(clips: HashMap<String, ClipSettings>, search_root: impl Into<PathBuf>) -> Self {
        Self {
            clips,
            search_root: search_root.into(),
            resolved: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            stop_epoch: AtomicU64::new(0),
            voices: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &AudioSettings) -> Self {
        Self::new(settings.clips.clone(), &settings.search_root)
    }

    /// Number of clips currently being held by `play`.
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.voices.load(Ordering::Acquire)
    }
}

impl SoundBackend for HeadlessMixer {
    fn initialize(&self) -> Result<(), SoundError> {
        let mut resolved = self
            .resolved
            .write()
            .map_err(|_| SoundError::Engine("clip table lock poisoned".to_string()))?;
        resolved.clear();
        for (name, clip) in &self.clips {
            match resolve_clip_path(&clip.path, &self.search_root) {
                Some(found) => {
                    debug!("clip '{name}' -> {}", found.display());
                    resolved.insert(name.clone(), found);
                }
                None => warn!("clip '{name}' not found ({})", clip.path),
            }
        }
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn play(&self, clip: &str) -> Result<(), SoundError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(SoundError::NotInitialized);
        }
        let entry = self
            .clips
            .get(clip)
            .ok_or_else(|| SoundError::UnknownClip(clip.to_string()))?;
        let found = self
            .resolved
            .read()
            .map_err(|_| SoundError::Engine("clip table lock poisoned".to_string()))?
            .contains_key(clip);
        if !found {
            return Err(SoundError::ClipNotFound {
                clip: clip.to_string(),
                path: entry.path.clone(),
            });
        }

        let epoch = self.stop_epoch.load(Ordering::Acquire);
        let deadline = Instant::now()
            + Duration::try_from_secs_f32(entry.seconds.max(0.0)).unwrap_or(Duration::ZERO);
        self.voices.fetch_add(1, Ordering::AcqRel);
        loop {
            let now = Instant::now();
            if now >= deadline || self.stop_epoch.load(Ordering::Acquire) != epoch {
                break;
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
        self.voices.fetch_sub(1, Ordering::AcqRel);
        Ok(())
    }

    fn stop_all(&self) -> Result<(), SoundError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(SoundError::NotInitialized);
        }
        self.stop_epoch.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn active_voices(&self) -> usize {
        HeadlessMixer::active_voices(self)
    }
}
