//! Player components and systems (input, physics, locomotion state, camera).
//!
//! One frame runs `player_input` (input snapshot -> impulses, look, zoom,
//! jump, footstep loops), then `player_physics` (gravity, caps, friction,
//! ground plane, camera rig, state machine, animation clock), then
//! `sync_player_camera` to move the render camera onto the rig.
//!
//! # Example:
//!
//! ```ignore
//! commands.spawn((
//!     SpatialBundle::default(),
//!     Player::new(&settings.camera),
//!     CameraRig::default(),
//! ));
//! app.add_systems(Update, (player_input, player_physics, sync_player_camera).chain());
//! ```
pub mod camera;
pub mod movement;
pub mod physics;
pub mod state;

use bevy::prelude::*;

pub use camera::*;
pub use movement::*;
pub use physics::*;
pub use state::*;

use crate::audio::LocomotionSounds;
use crate::settings::CameraSettings;

/// Everything the player owns besides its pose (the entity's `Transform`).
#[derive(Component, Debug)]
pub struct Player {
    /// Per-frame displacement applied by the integrator.
    pub velocity: Vec3,
    /// Airborne flag; cleared only by contact with the ground plane.
    pub falling: bool,
    /// Run modifier held this frame.
    pub running: bool,
    /// Camera pitch in radians, clamped by the input mapper.
    pub pitch: f32,
    pub camera_mode: CameraMode,
    pub zoom: ZoomFactors,
    pub sounds: LocomotionSounds,
    state: LocomotionState,
    clock: AnimationClock,
}

impl Player {
    #[must_use]
    pub fn new(camera: &CameraSettings) -> Self {
        Self {
            velocity: Vec3::ZERO,
            falling: false,
            running: false,
            pitch: 0.0,
            camera_mode: camera.default_mode,
            zoom: ZoomFactors::from_settings(camera),
            sounds: LocomotionSounds::default(),
            state: LocomotionState::Idle,
            clock: AnimationClock::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LocomotionState {
        self.state
    }

    #[must_use]
    pub fn state_id(&self) -> u32 {
        self.state.id()
    }

    /// Clip index the animation layer should play for the current state.
    #[must_use]
    pub fn animation_index(&self) -> u32 {
        self.state.animation_index()
    }

    #[must_use]
    pub fn animation_time(&self) -> f32 {
        self.clock.elapsed()
    }

    pub fn reset_animation_time(&mut self) {
        self.clock.reset();
    }

    #[must_use]
    pub fn is_grounded(&self) -> bool {
        !self.falling
    }

    #[must_use]
    pub fn horizontal_speed(&self) -> f32 {
        Vec2::new(self.velocity.x, self.velocity.z).length()
    }

    /// Zoom factor of the active camera mode.
    #[must_use]
    pub fn active_zoom(&self) -> f32 {
        self.zoom.get(self.camera_mode)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}
