//! Player physics: gravity, speed caps, friction and the ground plane.
//!
//! Velocity is a per-frame displacement. Forces (gravity, friction) are
//! scaled by the frame delta when they change the velocity; the position
//! step adds the velocity as-is. The only collider is the plane y = 0.
//! Register `player_physics` as a system to run it each frame.

use crate::audio::{SoundCues, SoundService};
use crate::player::{CameraRig, Player};
use crate::settings::{MovementSettings, Settings};
use bevy::prelude::*;

/// Pull the velocity down by gravity and cap the fall speed.
///
/// Upward motion is never clamped, so a jump impulse above the fall cap is
/// kept intact.
pub fn apply_gravity(velocity: &mut Vec3, movement: &MovementSettings, dt: f32) {
    velocity.y -= movement.gravity * dt;
    if velocity.y < -movement.max_fall_speed {
        velocity.y = -movement.max_fall_speed;
    }
}

/// Rescale the horizontal velocity onto `cap` when it exceeds it, keeping its
/// direction.
pub fn clamp_horizontal_speed(velocity: &mut Vec3, cap: f32) {
    let speed = Vec2::new(velocity.x, velocity.z).length();
    if speed > cap && speed > 0.0 {
        let scale = cap / speed;
        velocity.x *= scale;
        velocity.z *= scale;
    }
}

/// Decelerate the horizontal velocity by `friction * dt` against its
/// direction. An axis that would cross zero stops at exactly zero.
pub fn apply_friction(velocity: &mut Vec3, friction: f32, dt: f32) {
    let direction = Vec3::new(velocity.x, 0.0, velocity.z).normalize_or_zero();
    if direction == Vec3::ZERO {
        return;
    }
    let drag = -direction * friction * dt;
    velocity.x = settle_axis(velocity.x, drag.x);
    velocity.z = settle_axis(velocity.z, drag.z);
}

fn settle_axis(value: f32, drag: f32) -> f32 {
    if value >= 0.0 {
        (value + drag).max(0.0)
    } else {
        (value + drag).min(0.0)
    }
}

/// Step the player for one frame.
///
/// Order: gravity, horizontal cap (run or walk), friction, position,
/// ground plane, camera rig, state machine, animation clock.
pub fn physics_step(
    tf: &mut Transform,
    player: &mut Player,
    rig: &mut CameraRig,
    settings: &Settings,
    dt: f32,
    cues: &SoundCues<'_>,
) {
    let movement = &settings.movement;

    apply_gravity(&mut player.velocity, movement, dt);
    clamp_horizontal_speed(&mut player.velocity, movement.speed_cap(player.running));
    apply_friction(&mut player.velocity, movement.friction, dt);

    tf.translation += player.velocity;

    if tf.translation.y < 0.0 {
        tf.translation.y = 0.0;
        player.velocity.y = 0.0;
        player.falling = false;
    }

    rig.recompute(tf, player.camera_mode, player.pitch, player.active_zoom(), &settings.camera);
    player.update_state(tf.translation.y, movement, cues);
    player.clock.advance(dt);
}

/// Run [`physics_step`] for every player.
///
/// # Arguments
/// * `time` - delta time for gravity, friction and the animation clock
/// * `settings` - movement and camera tuning
/// * `audio` - sound service used by state hooks
/// * `q` - `(Transform, Player, CameraRig)` to integrate
#[allow(clippy::needless_pass_by_value)]
pub fn player_physics(
    time: Res<Time>,
    settings: Res<Settings>,
    audio: Res<SoundService>,
    mut q: Query<(&mut Transform, &mut Player, &mut CameraRig)>,
) {
    let cues = SoundCues { service: &audio, clips: &settings.audio };
    let dt = time.delta_seconds();
    for (mut tf, mut player, mut rig) in &mut q {
        physics_step(&mut tf, &mut player, &mut rig, &settings, dt, &cues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::service;
    use crate::player::{apply_input, CameraMode, InputSnapshot, LocomotionState};

    const EPS: f32 = 1e-4;

    #[test]
    fn fall_speed_is_capped_but_jumps_are_not() {
        let movement = MovementSettings::default();
        let mut v = Vec3::new(0.0, -9.5, 0.0);
        apply_gravity(&mut v, &movement, 0.1);
        assert_eq!(v.y, -movement.max_fall_speed);

        let mut v = Vec3::new(0.0, 25.0, 0.0);
        apply_gravity(&mut v, &movement, 0.1);
        assert!((v.y - 24.0).abs() < EPS);
    }

    #[test]
    fn long_falls_never_exceed_the_cap() {
        let movement = MovementSettings::default();
        let mut v = Vec3::ZERO;
        for i in 0..500 {
            apply_gravity(&mut v, &movement, 0.016 + (i % 7) as f32 * 0.01);
            assert!(v.y >= -movement.max_fall_speed);
        }
        assert_eq!(v.y, -movement.max_fall_speed);
    }

    #[test]
    fn horizontal_cap_preserves_direction() {
        let mut v = Vec3::new(6.0, -2.0, 8.0);
        clamp_horizontal_speed(&mut v, 3.0);
        assert!((Vec2::new(v.x, v.z).length() - 3.0).abs() < EPS);
        assert!((v.x / v.z - 0.75).abs() < EPS);
        assert_eq!(v.y, -2.0);

        let mut slow = Vec3::new(1.0, 0.0, 1.0);
        clamp_horizontal_speed(&mut slow, 3.0);
        assert_eq!(slow, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn friction_never_reverses_an_axis() {
        for (x, z) in [(0.05, -0.02), (-3.0, 0.001), (2.0, 2.0), (-0.3, -4.0), (0.0, 5.0)] {
            let mut v = Vec3::new(x, 0.0, z);
            apply_friction(&mut v, 10.0, 0.1);
            assert!(x < 0.0 || v.x >= 0.0, "x flipped from {x} to {}", v.x);
            assert!(x > 0.0 || v.x <= 0.0, "x flipped from {x} to {}", v.x);
            assert!(z < 0.0 || v.z >= 0.0, "z flipped from {z} to {}", v.z);
            assert!(z > 0.0 || v.z <= 0.0, "z flipped from {z} to {}", v.z);
        }
    }

    #[test]
    fn friction_on_a_resting_player_stays_finite() {
        let mut v = Vec3::new(0.0, -1.0, 0.0);
        apply_friction(&mut v, 10.0, 0.1);
        assert_eq!(v, Vec3::new(0.0, -1.0, 0.0));
        assert!(v.is_finite());
    }

    #[test]
    fn friction_slows_along_the_direction_of_travel() {
        let mut v = Vec3::new(3.0, 0.0, 4.0);
        apply_friction(&mut v, 10.0, 0.1);
        assert!((v.x - 2.4).abs() < EPS);
        assert!((v.z - 3.2).abs() < EPS);
    }

    #[test]
    fn one_forward_tick_from_rest_walks_on_the_ground() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);
        let mut rig = CameraRig::default();

        let input = InputSnapshot { forward: true, ..Default::default() };
        apply_input(&input, &mut tf, &mut player, &settings, 0.1, &cues);
        physics_step(&mut tf, &mut player, &mut rig, &settings, 0.1, &cues);

        assert_eq!(tf.translation.y, 0.0);
        assert_eq!(player.velocity.y, 0.0);
        assert!(!player.falling);
        let speed = player.horizontal_speed();
        assert!(speed > 0.0 && speed <= settings.movement.walk_speed_cap + EPS);
        assert!(matches!(player.state(), LocomotionState::Idle | LocomotionState::Walk));
        assert_eq!(player.state(), LocomotionState::Walk);
        assert!((player.animation_time() - 0.1).abs() < EPS);
    }

    #[test]
    fn horizontal_speed_respects_the_active_cap_every_tick() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);
        let mut rig = CameraRig::default();

        for frame in 0..120 {
            let running = frame >= 60;
            let input = InputSnapshot { forward: true, right: true, run: running, ..Default::default() };
            apply_input(&input, &mut tf, &mut player, &settings, 1.0 / 60.0, &cues);
            let cap = settings.movement.speed_cap(player.running);
            physics_step(&mut tf, &mut player, &mut rig, &settings, 1.0 / 60.0, &cues);
            assert!(player.horizontal_speed() <= cap + EPS);
        }
        assert_eq!(player.state(), LocomotionState::Run);
    }

    #[test]
    fn jump_arc_goes_jump_fall_land_idle() {
        let (backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::default();
        let mut player = Player::new(&settings.camera);
        let mut rig = CameraRig::default();
        let dt = 1.0 / 60.0;

        let jump = InputSnapshot { jump: true, ..Default::default() };
        apply_input(&jump, &mut tf, &mut player, &settings, dt, &cues);
        assert_eq!(player.state(), LocomotionState::Jump);

        let mut seen = vec![player.state()];
        for _ in 0..2000 {
            apply_input(&InputSnapshot::default(), &mut tf, &mut player, &settings, dt, &cues);
            physics_step(&mut tf, &mut player, &mut rig, &settings, dt, &cues);
            assert!(tf.translation.y >= 0.0);
            assert!(player.velocity.y >= -settings.movement.max_fall_speed);
            if seen.last() != Some(&player.state()) {
                seen.push(player.state());
            }
            if player.state() == LocomotionState::Idle {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                LocomotionState::Jump,
                LocomotionState::Fall,
                LocomotionState::Land,
                LocomotionState::Idle
            ]
        );
        assert_eq!(backend.plays("jump"), 1);
    }

    #[test]
    fn rig_follows_the_player_each_tick() {
        let (_backend, audio) = service();
        let settings = Settings::default();
        let cues = SoundCues { service: &audio, clips: &settings.audio };
        let mut tf = Transform::from_xyz(10.0, 0.0, -4.0);
        let mut player = Player::new(&settings.camera);
        let mut rig = CameraRig::default();
        player.camera_mode = CameraMode::ThirdPerson;

        physics_step(&mut tf, &mut player, &mut rig, &settings, 0.016, &cues);

        let anchor = tf.translation + settings.camera.offset() + Vec3::Y * settings.camera.vertical_offset;
        assert!((rig.eye() - (anchor + Vec3::Z * player.active_zoom())).length() < EPS);
    }
}
