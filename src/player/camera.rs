//! Camera rig, mouse look and cursor helpers.
//!
//! The [`CameraRig`] lives on the player entity and is recomputed by the
//! integrator every tick from the player pose, the camera mode, pitch and
//! zoom. `sync_player_camera` then copies the rig onto the render camera.
//!
//! Third person aims at a point (the anchor above the player) and builds its
//! view with look-at; first person aims along a direction and uses look-to.

use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::settings::{CameraSettings, ControlsSettings, Settings, ZoomBounds};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraMode {
    FirstPerson,
    #[default]
    ThirdPerson,
}

/// What the rig is pointed at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Aim {
    /// A world-space point (look-at).
    Target(Vec3),
    /// A world-space direction (look-to).
    Direction(Vec3),
}

/// View pose derived from the player each tick.
#[derive(Component, Clone, Debug)]
pub struct CameraRig {
    eye: Vec3,
    aim: Aim,
    up: Vec3,
    view: Mat4,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            eye: Vec3::ZERO,
            aim: Aim::Direction(Vec3::NEG_Z),
            up: Vec3::Y,
            view: Mat4::IDENTITY,
        }
    }
}

impl CameraRig {
    /// Place the eye at `eye` looking at the point `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.eye = eye;
        self.aim = Aim::Target(target);
        self.up = up;
    }

    /// Place the eye at `eye` looking along `direction`.
    pub fn set_pose(&mut self, eye: Vec3, direction: Vec3, up: Vec3) {
        self.eye = eye;
        self.aim = Aim::Direction(direction);
        self.up = up;
    }

    /// Rebuild the view matrix from the current pose.
    pub fn update_view_matrix(&mut self) {
        self.view = match self.aim {
            Aim::Target(target) => Mat4::look_at_rh(self.eye, target, self.up),
            Aim::Direction(direction) => Mat4::look_to_rh(self.eye, direction, self.up),
        };
    }

    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    #[must_use]
    pub fn aim(&self) -> Aim {
        self.aim
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Unit view direction, whichever way the rig was aimed.
    #[must_use]
    pub fn look_direction(&self) -> Vec3 {
        match self.aim {
            Aim::Target(target) => (target - self.eye).normalize_or_zero(),
            Aim::Direction(direction) => direction.normalize_or_zero(),
        }
    }

    /// Derive the view pose from the player pose.
    ///
    /// `zoom` is used as given; bounds are enforced by the input mapper.
    pub fn recompute(
        &mut self,
        pose: &Transform,
        mode: CameraMode,
        pitch: f32,
        zoom: f32,
        settings: &CameraSettings,
    ) {
        let look = pitched_look(pose, pitch);
        let anchor = pose.translation + Vec3::Y * settings.vertical_offset + settings.offset();

        match mode {
            CameraMode::ThirdPerson => self.look_at(anchor - look * zoom, anchor, Vec3::Y),
            CameraMode::FirstPerson => self.set_pose(anchor + look * zoom, look, Vec3::Y),
        }
        self.update_view_matrix();
    }

    /// Transform for a bevy camera entity showing this rig's view.
    #[must_use]
    pub fn camera_transform(&self) -> Transform {
        Transform::from_translation(self.eye).looking_to(self.look_direction(), self.up)
    }
}

/// The player's forward vector tilted about its right axis by `pitch`.
#[must_use]
pub fn pitched_look(pose: &Transform, pitch: f32) -> Vec3 {
    let forward = Vec3::from(pose.forward());
    let right = Vec3::from(pose.right());
    (Quat::from_axis_angle(right, pitch) * forward).normalize_or_zero()
}

/// Zoom factor per camera mode, so switching modes never leaks one mode's
/// distance into the other.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomFactors {
    pub first_person: f32,
    pub third_person: f32,
}

impl ZoomFactors {
    #[must_use]
    pub fn from_settings(camera: &CameraSettings) -> Self {
        Self {
            first_person: camera.first_person.clamp(camera.first_person.initial),
            third_person: camera.third_person.clamp(camera.third_person.initial),
        }
    }

    #[must_use]
    pub fn get(&self, mode: CameraMode) -> f32 {
        match mode {
            CameraMode::FirstPerson => self.first_person,
            CameraMode::ThirdPerson => self.third_person,
        }
    }

    /// Step the zoom of `mode` one notch in or out, staying within `bounds`.
    ///
    /// Zooming in shortens the third-person boom and pushes the first-person
    /// eye forward.
    pub fn step(&mut self, mode: CameraMode, zoom_in: bool, bounds: &ZoomBounds) {
        let sign = match (mode, zoom_in) {
            (CameraMode::ThirdPerson, true) | (CameraMode::FirstPerson, false) => -1.0,
            (CameraMode::ThirdPerson, false) | (CameraMode::FirstPerson, true) => 1.0,
        };
        let slot = match mode {
            CameraMode::FirstPerson => &mut self.first_person,
            CameraMode::ThirdPerson => &mut self.third_person,
        };
        *slot = bounds.clamp(*slot + sign * bounds.step);
    }
}

/// Apply a raw mouse delta: X turns the player about world up, Y tilts the
/// camera pitch, clamped to +/- `camera.max_pitch()`.
pub fn apply_mouse_look(
    pose: &mut Transform,
    pitch: &mut f32,
    delta: Vec2,
    controls: &ControlsSettings,
    camera: &CameraSettings,
) {
    let mut axis = delta;
    if controls.invert_x {
        axis.x = -axis.x;
    }
    if controls.invert_y {
        axis.y = -axis.y;
    }

    let max_pitch = camera.max_pitch();
    pose.rotate_y(-axis.x * controls.mouse_sensitivity);
    *pitch = (*pitch - axis.y * controls.mouse_sensitivity).clamp(-max_pitch, max_pitch);
}

/// Marker for the render camera that follows the player's rig.
#[derive(Component, Default)]
pub struct PlayerCamera;

/// Copy the player's rig onto the render camera.
///
/// # Arguments
/// * `rigs` - the player's `CameraRig`, recomputed by `player_physics`
/// * `cameras` - transforms of entities tagged with `PlayerCamera`
#[allow(clippy::needless_pass_by_value)]
pub fn sync_player_camera(
    rigs: Query<&CameraRig, With<Player>>,
    mut cameras: Query<&mut Transform, (With<PlayerCamera>, Without<Player>)>,
) {
    let Ok(rig) = rigs.get_single() else { return };
    for mut tf in &mut cameras {
        *tf = rig.camera_transform();
    }
}

/// Toggle cursor grab and visibility: left click locks the cursor, the
/// `pause` binding releases it. Mouse look only applies while it is locked.
///
/// # Arguments
/// * `wq` - query for the primary window whose cursor is toggled
/// * `mb` - mouse button input (left click grabs)
/// * `kb` - keyboard input (the `pause` binding releases)
/// * `settings` - keybinds
#[allow(clippy::needless_pass_by_value)]
pub fn cursor_grab(
    mut wq: Query<&mut Window, With<PrimaryWindow>>,
    mb: Res<ButtonInput<MouseButton>>,
    kb: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
) {
    let Ok(mut w) = wq.get_single_mut() else { return };
    if mb.just_pressed(MouseButton::Left) {
        w.cursor.grab_mode = CursorGrabMode::Locked;
        w.cursor.visible = false;
    }

    if kb.just_pressed(settings.controls.key_for("pause", KeyCode::Escape)) {
        w.cursor.grab_mode = CursorGrabMode::None;
        w.cursor.visible = true;
    }
}
