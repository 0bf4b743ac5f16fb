//! Input mapping: keyboard and mouse state to player intent.
//!
//! `player_input` captures an [`InputSnapshot`] from the keybinds in
//! [`Settings`] and hands it to [`apply_input`], which turns it into
//! impulses, look, zoom, camera mode, jumps and footstep loops. Physics runs
//! afterwards in `player_physics`.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::audio::{SoundCues, SoundService, Stride};
use crate::player::{apply_mouse_look, CameraMode, Player};
use crate::settings::{ControlsSettings, Settings};

/// Held keys and mouse motion for one frame. `jump` is an edge, not a hold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
    pub jump: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub first_person: bool,
    pub third_person: bool,
    pub mouse_delta: Vec2,
}

impl InputSnapshot {
    /// Read the bound keys from `keys`.
    #[must_use]
    pub fn capture(keys: &ButtonInput<KeyCode>, mouse_delta: Vec2, controls: &ControlsSettings) -> Self {
        let held = |action: &str, default: KeyCode| keys.pressed(controls.key_for(action, default));
        Self {
            forward: held("forward", KeyCode::KeyW),
            back: held("back", KeyCode::KeyS),
            left: held("left", KeyCode::KeyA),
            right: held("right", KeyCode::KeyD),
            run: held("run", KeyCode::ShiftLeft),
            jump: keys.just_pressed(controls.key_for("jump", KeyCode::Space)),
            zoom_in: held("zoom_in", KeyCode::KeyI),
            zoom_out: held("zoom_out", KeyCode::KeyO),
            first_person: held("first_person", KeyCode::KeyZ),
            third_person: held("third_person", KeyCode::KeyT),
            mouse_delta,
        }
    }

    /// Whether the key that owns `stride` is held.
    #[must_use]
    pub fn holds(&self, stride: Stride) -> bool {
        match stride {
            Stride::Forward => self.forward,
            Stride::Left => self.left,
            Stride::Back => self.back,
            Stride::Right => self.right,
        }
    }
}

/// Apply one frame of input to the player.
///
/// Impulses follow the player's heading flattened onto the ground, scaled
/// per axis by the configured acceleration and by `dt`: halved while
/// airborne, doubled while running.
pub fn apply_input(
    input: &InputSnapshot,
    tf: &mut Transform,
    player: &mut Player,
    settings: &Settings,
    dt: f32,
    cues: &SoundCues<'_>,
) {
    player.running = input.run;

    if input.mouse_delta != Vec2::ZERO {
        apply_mouse_look(tf, &mut player.pitch, input.mouse_delta, &settings.controls, &settings.camera);
    }

    let forward = flatten(Vec3::from(tf.forward()));
    let right = flatten(Vec3::from(tf.right()));
    let mut wish = Vec3::ZERO;
    if input.forward {
        wish += forward;
    }
    if input.back {
        wish -= forward;
    }
    if input.right {
        wish += right;
    }
    if input.left {
        wish -= right;
    }

    if wish != Vec3::ZERO {
        let scale = if player.falling {
            dt * 0.5
        } else if player.running {
            dt * 2.0
        } else {
            dt
        };
        player.velocity += wish * settings.movement.acceleration() * scale;
    }

    let mode = player.camera_mode;
    let bounds = settings.camera.zoom_bounds(mode);
    if input.zoom_in {
        player.zoom.step(mode, true, bounds);
    }
    if input.zoom_out {
        player.zoom.step(mode, false, bounds);
    }

    if input.first_person && player.camera_mode != CameraMode::FirstPerson {
        player.camera_mode = CameraMode::FirstPerson;
        debug!("camera switched to first person");
    } else if input.third_person && player.camera_mode != CameraMode::ThirdPerson {
        player.camera_mode = CameraMode::ThirdPerson;
        debug!("camera switched to third person");
    }

    if input.jump {
        player.try_jump(settings.movement.jump_force, cues);
    }

    for stride in Stride::ALL {
        if input.holds(stride) {
            let grounded = player.is_grounded();
            player.sounds.try_start(stride, grounded, cues.service, &cues.clips.footstep_clip);
        } else {
            player.sounds.release(stride);
        }
    }
}

fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}

/// Capture input and apply it to every player.
///
/// Mouse motion only counts while the cursor is grabbed (hidden).
///
/// # Arguments
/// * `keys` - keyboard state, read through the keybinds in `settings`
/// * `motion` - mouse motion events for the current update
/// * `windows` - primary window, used to check whether the cursor is grabbed
/// * `time` - delta time used to scale impulses
/// * `settings` - keybinds, movement tuning and clip names
/// * `audio` - sound service for jump and footstep cues
/// * `q` - `(Transform, Player)` pairs to drive
#[allow(clippy::needless_pass_by_value)]
pub fn player_input(
    keys: Res<ButtonInput<KeyCode>>,
    motion: Res<Events<MouseMotion>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time>,
    settings: Res<Settings>,
    audio: Res<SoundService>,
    mut q: Query<(&mut Transform, &mut Player)>,
) {
    let grabbed = windows.get_single().is_ok_and(|w| !w.cursor.visible);
    let mouse_delta = if grabbed {
        motion.iter_current_update_events().map(|ev| ev.delta).sum::<Vec2>()
    } else {
        Vec2::ZERO
    };

    let input = InputSnapshot::capture(&keys, mouse_delta, &settings.controls);
    let cues = SoundCues { service: &audio, clips: &settings.audio };
    let dt = time.delta_seconds();
    for (mut tf, mut player) in &mut q {
        apply_input(&input, &mut tf, &mut player, &settings, dt, &cues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{eventually, service};
    use crate::player::LocomotionState;

    const EPS: f32 = 1e-4;

    #[test]
    fn capture_reads_default_bindings() {
        let controls = ControlsSettings::default();
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::KeyW);
        keys.press(KeyCode::ShiftLeft);
        keys.press(KeyCode::Space);

        let input = InputSnapshot::capture(&keys, Vec2::new(1.0, 2.0), &controls);
        assert!(input.forward && input.run && input.jump);
        assert!(!input.back && !input.left && !input.right);
        assert_eq!(input.mouse_delta, Vec2::new(1.0, 2.0));

        keys.clear();
        let held = InputSnapshot::capture(&keys, Vec2::ZERO, &controls);
        assert!(held.forward);
        assert!(!held.jump);
    }

    #[test]
    fn capture_honours_rebinds() {
        let mut controls = ControlsSettings::default();
        controls.keybinds.insert("forward".to_string(), "Up".to_string());
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::ArrowUp);
        assert!(InputSnapshot::capture(&keys, Vec2::ZERO, &controls).forward);
    }

    #[test]
    fn impulse_scales_with_run_and_air() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let forward = InputSnapshot { forward: true, ..Default::default() };
        let running = InputSnapshot { run: true, ..forward };

        let mut tf = Transform::default();
        let mut walk = Player::new(&settings.camera);
        apply_input(&forward, &mut tf, &mut walk, &settings, 0.1, &cues);
        assert!((walk.velocity.z + 3.0).abs() < EPS);

        let mut run = Player::new(&settings.camera);
        apply_input(&running, &mut tf, &mut run, &settings, 0.1, &cues);
        assert!((run.velocity.z + 6.0).abs() < EPS);
        assert!(run.running);

        let mut air = Player::new(&settings.camera);
        air.falling = true;
        apply_input(&running, &mut tf, &mut air, &settings, 0.1, &cues);
        assert!((air.velocity.z + 1.5).abs() < EPS);
    }

    #[test]
    fn opposite_keys_cancel() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let input = InputSnapshot { forward: true, back: true, left: true, right: true, ..Default::default() };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);
        apply_input(&input, &mut tf, &mut player, &settings, 0.1, &cues);
        assert_eq!(player.velocity, Vec3::ZERO);
    }

    #[test]
    fn jump_edge_applies_exactly_one_impulse() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let jump = InputSnapshot { jump: true, ..Default::default() };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);

        apply_input(&jump, &mut tf, &mut player, &settings, 0.016, &cues);
        assert!(player.falling);
        assert!((player.velocity.y - settings.movement.jump_force).abs() < EPS);
        assert_eq!(player.state(), LocomotionState::Jump);

        apply_input(&jump, &mut tf, &mut player, &settings, 0.016, &cues);
        assert!((player.velocity.y - settings.movement.jump_force).abs() < EPS);
        assert_eq!(player.state(), LocomotionState::Jump);
    }

    #[test]
    fn footsteps_follow_the_held_key() {
        let (backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);

        let both = InputSnapshot { forward: true, left: true, ..Default::default() };
        apply_input(&both, &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.sounds.active(), Some(Stride::Forward));
        assert!(!player.sounds.is_playing(Stride::Left));
        assert!(eventually(|| backend.plays(&settings.audio.footstep_clip) >= 1));

        let left = InputSnapshot { left: true, ..Default::default() };
        apply_input(&left, &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.sounds.active(), Some(Stride::Left));
        assert!(!player.sounds.is_playing(Stride::Forward));

        apply_input(&InputSnapshot::default(), &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.sounds.active(), None);
    }

    #[test]
    fn no_footsteps_while_airborne() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);
        player.falling = true;

        let forward = InputSnapshot { forward: true, ..Default::default() };
        apply_input(&forward, &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.sounds.active(), None);
    }

    #[test]
    fn zoom_and_mode_keys_keep_zoom_per_mode() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);
        assert_eq!(player.camera_mode, CameraMode::ThirdPerson);

        let out = InputSnapshot { zoom_out: true, ..Default::default() };
        apply_input(&out, &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.active_zoom(), 105.0);

        let fp = InputSnapshot { first_person: true, ..Default::default() };
        apply_input(&fp, &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.camera_mode, CameraMode::FirstPerson);
        assert_eq!(player.active_zoom(), 0.0);

        let zoom_in = InputSnapshot { zoom_in: true, ..Default::default() };
        apply_input(&zoom_in, &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.active_zoom(), 1.0);

        let tp = InputSnapshot { third_person: true, ..Default::default() };
        apply_input(&tp, &mut tf, &mut player, &settings, 0.016, &cues);
        assert_eq!(player.camera_mode, CameraMode::ThirdPerson);
        assert_eq!(player.active_zoom(), 105.0);
    }

    #[test]
    fn mouse_turns_the_heading_used_for_impulses() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);

        let quarter = std::f32::consts::FRAC_PI_2 / settings.controls.mouse_sensitivity;
        let input = InputSnapshot { forward: true, mouse_delta: Vec2::new(quarter, 0.0), ..Default::default() };
        apply_input(&input, &mut tf, &mut player, &settings, 0.1, &cues);
        assert!((player.velocity.x - 3.0).abs() < 1e-3);
        assert!(player.velocity.z.abs() < 1e-3);
    }
}
