//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are hot-reloadable
//! using the RON watcher utilities (see `ron::setup_ron_watcher`). Every field
//! carries a serde default so a settings file only needs the values it changes.
use bevy::math::Vec3;
use bevy::prelude::{KeyCode, Resource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::player::camera::CameraMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Enable vertical sync to cap FPS to the display refresh rate.
    #[serde(default = "GraphicsSettings::default_present_mode")]
    pub present_mode: String, // Window present mode used when vsync is off.
}

impl GraphicsSettings {
    fn default_vsync() -> bool { true }
    fn default_present_mode() -> String { "AutoNoVsync".to_string() }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            vsync: Self::default_vsync(),
            present_mode: Self::default_present_mode(),
        }
    }
}

/// Controls / input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default)]
    pub invert_y: bool, // Invert mouse Y axis
    #[serde(default)]
    pub invert_x: bool, // Invert mouse X axis
    #[serde(default = "ControlsSettings::default_sensitivity")]
    pub mouse_sensitivity: f32, // Radians of yaw/pitch per mouse count
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>, // Map of action names to key identifiers (editable by user)
}

impl ControlsSettings {
    fn default_sensitivity() -> f32 { 0.003 }

    fn default_keybinds() -> HashMap<String, String> {
        [
            ("forward", "W"),
            ("back", "S"),
            ("left", "A"),
            ("right", "D"),
            ("jump", "Space"),
            ("run", "LShift"),
            ("zoom_in", "I"),
            ("zoom_out", "O"),
            ("third_person", "T"),
            ("first_person", "Z"),
            ("pause", "Escape"),
            ("toggle_debug", "F1"),
            ("toggle_grid", "F2"),
        ]
        .into_iter()
        .map(|(action, key)| (action.to_string(), key.to_string()))
        .collect()
    }

    /// Resolve the key bound to `action`, falling back to `default` when the
    /// binding is missing or names an unknown key.
    #[must_use]
    pub fn key_for(&self, action: &str, default: KeyCode) -> KeyCode {
        self.keybinds
            .get(action)
            .and_then(|s| Settings::keycode_from_str(s))
            .unwrap_or(default)
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            invert_y: false,
            invert_x: false,
            mouse_sensitivity: Self::default_sensitivity(),
            keybinds: Self::default_keybinds(),
        }
    }
}

/// Tuning for the player motion integrator and input impulses.
///
/// Velocities are per-frame displacements; `acceleration` is scaled by the
/// frame delta when turned into an impulse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSettings {
    #[serde(default = "MovementSettings::default_acceleration")]
    pub acceleration: [f32; 3], // Per-axis input acceleration (y is normally 0)
    #[serde(default = "MovementSettings::default_jump_force")]
    pub jump_force: f32, // Upward velocity added by a jump
    #[serde(default = "MovementSettings::default_gravity")]
    pub gravity: f32, // Downward velocity change per second
    #[serde(default = "MovementSettings::default_walk_speed_cap")]
    pub walk_speed_cap: f32, // Horizontal speed cap while walking
    #[serde(default = "MovementSettings::default_run_speed_cap")]
    pub run_speed_cap: f32, // Horizontal speed cap while the run key is held
    #[serde(default = "MovementSettings::default_max_fall_speed")]
    pub max_fall_speed: f32, // Terminal downward speed
    #[serde(default = "MovementSettings::default_friction")]
    pub friction: f32, // Horizontal deceleration per second
    #[serde(default = "MovementSettings::default_idle_speed_threshold")]
    pub idle_speed_threshold: f32, // Horizontal speed at or below which the player is idle
}

impl MovementSettings {
    fn default_acceleration() -> [f32; 3] { [30.0, 0.0, 30.0] }
    fn default_jump_force() -> f32 { 10.0 }
    fn default_gravity() -> f32 { 10.0 }
    fn default_walk_speed_cap() -> f32 { 3.0 }
    fn default_run_speed_cap() -> f32 { 6.0 }
    fn default_max_fall_speed() -> f32 { 10.0 }
    fn default_friction() -> f32 { 10.0 }
    fn default_idle_speed_threshold() -> f32 { 0.1 }

    #[must_use]
    pub fn acceleration(&self) -> Vec3 {
        Vec3::from_array(self.acceleration)
    }

    /// Horizontal cap for the current run flag.
    #[must_use]
    pub fn speed_cap(&self, running: bool) -> f32 {
        if running { self.run_speed_cap } else { self.walk_speed_cap }
    }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            acceleration: Self::default_acceleration(),
            jump_force: Self::default_jump_force(),
            gravity: Self::default_gravity(),
            walk_speed_cap: Self::default_walk_speed_cap(),
            run_speed_cap: Self::default_run_speed_cap(),
            max_fall_speed: Self::default_max_fall_speed(),
            friction: Self::default_friction(),
            idle_speed_threshold: Self::default_idle_speed_threshold(),
        }
    }
}

/// Bounds and step for one camera mode's zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub initial: f32,
}

impl ZoomBounds {
    #[must_use]
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default)]
    pub default_mode: CameraMode, // Mode the player spawns with
    #[serde(default = "CameraSettings::default_offset")]
    pub offset: [f32; 3], // Camera offset added to the player position
    #[serde(default = "CameraSettings::default_vertical_offset")]
    pub vertical_offset: f32, // Extra height of the camera anchor above the offset
    #[serde(default = "CameraSettings::default_max_pitch_degrees")]
    pub max_pitch_degrees: f32, // Pitch is clamped to +/- this angle
    #[serde(default = "CameraSettings::default_third_person")]
    pub third_person: ZoomBounds, // Boom length behind the anchor
    #[serde(default = "CameraSettings::default_first_person")]
    pub first_person: ZoomBounds, // Eye distance in front of the anchor
}

impl CameraSettings {
    fn default_offset() -> [f32; 3] { [0.0, 100.0, 0.0] }
    fn default_vertical_offset() -> f32 { 50.0 }
    fn default_max_pitch_degrees() -> f32 { 85.0 }
    fn default_third_person() -> ZoomBounds {
        ZoomBounds { min: 100.0, max: 510.0, step: 5.0, initial: 100.0 }
    }
    fn default_first_person() -> ZoomBounds {
        ZoomBounds { min: 0.0, max: 50.0, step: 1.0, initial: 0.0 }
    }

    #[must_use]
    pub fn offset(&self) -> Vec3 {
        Vec3::from_array(self.offset)
    }

    #[must_use]
    pub fn max_pitch(&self) -> f32 {
        self.max_pitch_degrees.to_radians()
    }

    #[must_use]
    pub fn zoom_bounds(&self, mode: CameraMode) -> &ZoomBounds {
        match mode {
            CameraMode::FirstPerson => &self.first_person,
            CameraMode::ThirdPerson => &self.third_person,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            default_mode: CameraMode::default(),
            offset: Self::default_offset(),
            vertical_offset: Self::default_vertical_offset(),
            max_pitch_degrees: Self::default_max_pitch_degrees(),
            third_person: Self::default_third_person(),
            first_person: Self::default_first_person(),
        }
    }
}

/// A named clip known to the sound engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSettings {
    pub path: String, // File searched for by the mixer (relative paths walk up from `search_root`)
    pub seconds: f32, // Playback length held by the headless mixer
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(default = "AudioSettings::default_enabled")]
    pub enabled: bool, // Initialize the sound engine at startup
    #[serde(default = "AudioSettings::default_playback_threads")]
    pub playback_threads: usize, // Threads in the playback pool owned by the sound service
    #[serde(default = "AudioSettings::default_search_root")]
    pub search_root: String, // Directory the clip search starts from
    #[serde(default = "AudioSettings::default_footstep_clip")]
    pub footstep_clip: String, // Looping clip while a direction key is held
    #[serde(default = "AudioSettings::default_jump_clip")]
    pub jump_clip: String, // One-shot clip on entering Jump
    #[serde(default = "AudioSettings::default_landing_clip")]
    pub landing_clip: String, // One-shot clip on entering Land
    #[serde(default = "AudioSettings::default_clips")]
    pub clips: HashMap<String, ClipSettings>,
}

impl AudioSettings {
    fn default_enabled() -> bool { true }
    fn default_playback_threads() -> usize { 4 }
    fn default_search_root() -> String { ".".to_string() }
    fn default_footstep_clip() -> String { "walk1".to_string() }
    fn default_jump_clip() -> String { "jump".to_string() }
    fn default_landing_clip() -> String { "landing".to_string() }

    fn default_clips() -> HashMap<String, ClipSettings> {
        [
            ("walk1", "Sound/walk1.wav", 0.45),
            ("jump", "Sound/JumpSound.wav", 0.40),
            ("landing", "Sound/landingSound.wav", 0.30),
        ]
        .into_iter()
        .map(|(name, path, seconds)| {
            (name.to_string(), ClipSettings { path: path.to_string(), seconds })
        })
        .collect()
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            playback_threads: Self::default_playback_threads(),
            search_root: Self::default_search_root(),
            footstep_clip: Self::default_footstep_clip(),
            jump_clip: Self::default_jump_clip(),
            landing_clip: Self::default_landing_clip(),
            clips: Self::default_clips(),
        }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub audio: AudioSettings,
}

const LETTER_KEYS: [KeyCode; 26] = [
    KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
    KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
    KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
    KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
    KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
    KeyCode::KeyZ,
];

const DIGIT_KEYS: [KeyCode; 10] = [
    KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
    KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
];

const FUNCTION_KEYS: [KeyCode; 12] = [
    KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
    KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
];

// Upper-cased aliases accepted in `controls.keybinds`.
const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("SPACE", KeyCode::Space),
    ("TAB", KeyCode::Tab),
    ("ESC", KeyCode::Escape),
    ("ESCAPE", KeyCode::Escape),
    ("ENTER", KeyCode::Enter),
    ("RETURN", KeyCode::Enter),
    ("BACKSPACE", KeyCode::Backspace),
    ("LSHIFT", KeyCode::ShiftLeft),
    ("SHIFT", KeyCode::ShiftLeft),
    ("RSHIFT", KeyCode::ShiftRight),
    ("LCTRL", KeyCode::ControlLeft),
    ("CTRL", KeyCode::ControlLeft),
    ("RCTRL", KeyCode::ControlRight),
    ("LALT", KeyCode::AltLeft),
    ("ALT", KeyCode::AltLeft),
    ("RALT", KeyCode::AltRight),
    ("UP", KeyCode::ArrowUp),
    ("DOWN", KeyCode::ArrowDown),
    ("LEFT", KeyCode::ArrowLeft),
    ("RIGHT", KeyCode::ArrowRight),
    ("PAGEUP", KeyCode::PageUp),
    ("PAGEDOWN", KeyCode::PageDown),
    ("HOME", KeyCode::Home),
    ("END", KeyCode::End),
    ("-", KeyCode::Minus),
    ("MINUS", KeyCode::Minus),
    ("=", KeyCode::Equal),
    ("PLUS", KeyCode::Equal),
    ("[", KeyCode::BracketLeft),
    ("]", KeyCode::BracketRight),
    (",", KeyCode::Comma),
    (".", KeyCode::Period),
    ("/", KeyCode::Slash),
];

impl Settings {
    /// Convert a key identifier from `controls.keybinds` (e.g. "W", "Space",
    /// "F1", "LShift") into a `KeyCode`. Matching is case-insensitive.
    ///
    /// # Returns
    /// `None` when the string does not name a supported key.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        let s = name.trim().to_ascii_uppercase();
        let bytes = s.as_bytes();

        if bytes.len() == 1 {
            match bytes[0] {
                b @ b'A'..=b'Z' => return Some(LETTER_KEYS[usize::from(b - b'A')]),
                b @ b'0'..=b'9' => return Some(DIGIT_KEYS[usize::from(b - b'0')]),
                _ => {}
            }
        }

        if let Some(n) = s.strip_prefix('F').and_then(|n| n.parse::<usize>().ok())
            && (1..=FUNCTION_KEYS.len()).contains(&n)
        {
            return Some(FUNCTION_KEYS[n - 1]);
        }

        NAMED_KEYS
            .iter()
            .find(|(alias, _)| *alias == s)
            .map(|(_, key)| *key)
    }
}

pub mod loader;
