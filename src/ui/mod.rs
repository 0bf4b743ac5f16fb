//! User interface helpers: debug overlay, ground grid and crosshair.
//!
//! The overlay (F1 by default) shows FPS plus the player's locomotion state,
//! animation clip and clock, camera mode and zoom, velocity, position and the
//! active footstep loop. The grid (F2) draws the ground plane around the
//! player with gizmos.

use crate::audio::SoundService;
use crate::player::{CameraMode, Player};
use crate::settings::Settings;
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

/// State for the debug overlay visibility.
#[derive(Resource, Default)]
pub struct DebugOverlayState {
    /// Whether the overlay is currently visible.
    pub visible: bool,
}

#[derive(Resource, Default)]
pub struct DebugOverlayTimer(pub Timer);

#[derive(Resource, Default)]
pub struct DebugGridVisible(pub bool);

#[derive(Component)]
pub struct DebugOverlayText;

/// Insert debug overlay resources.
pub fn setup_debug_overlay(mut commands: Commands) {
    commands.insert_resource(DebugOverlayTimer(Timer::from_seconds(
        0.25,
        TimerMode::Repeating,
    )));
    commands.insert_resource(DebugOverlayState::default());
    commands.insert_resource(DebugGridVisible::default());
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    mut state: ResMut<DebugOverlayState>,
    input: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
) {
    if input.just_pressed(settings.controls.key_for("toggle_debug", KeyCode::F1)) {
        state.visible = !state.visible;
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_grid(
    mut grid: ResMut<DebugGridVisible>,
    input: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
) {
    if input.just_pressed(settings.controls.key_for("toggle_grid", KeyCode::F2)) {
        grid.0 = !grid.0;
    }
}

/// Multi-line summary of the player for the overlay.
#[must_use]
pub fn describe_player(player: &Player, position: Vec3) -> String {
    let mode = match player.camera_mode {
        CameraMode::FirstPerson => "first person",
        CameraMode::ThirdPerson => "third person",
    };
    let footsteps = player
        .sounds
        .active()
        .map_or_else(|| "none".to_string(), |s| format!("{s:?}"));

    format!(
        "State: {:?} (id {}, clip {})\nAnim time: {:.2} s\nCamera: {} | zoom {:.1} | pitch {:.1} deg\nVelocity: ({:.2}, {:.2}, {:.2}) | speed {:.2}{}\nPos: ({:.1}, {:.1}, {:.1})\nFootsteps: {}",
        player.state(),
        player.state_id(),
        player.animation_index(),
        player.animation_time(),
        mode,
        player.active_zoom(),
        player.pitch.to_degrees(),
        player.velocity.x,
        player.velocity.y,
        player.velocity.z,
        player.horizontal_speed(),
        if player.running { " | running" } else { "" },
        position.x,
        position.y,
        position.z,
        footsteps,
    )
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DebugOverlayCtx<'w, 's> {
    pub diagnostics: Res<'w, DiagnosticsStore>,
    pub state: Res<'w, DebugOverlayState>,
    pub audio: Res<'w, SoundService>,
    pub time: Res<'w, Time>,
    pub timer: ResMut<'w, DebugOverlayTimer>,
    pub query: Query<'w, 's, &'static mut Text, With<DebugOverlayText>>,
    pub player_query: Query<'w, 's, (&'static Transform, &'static Player)>,
}

/// Refresh the overlay text once per timer interval.
///
/// # Arguments
/// * `ctx` - system parameters grouped into a context struct (diagnostics,
///   overlay state and timer, sound service, overlay text and player query)
pub fn update_debug_overlay(mut ctx: DebugOverlayCtx<'_, '_>) {
    if !ctx.timer.0.tick(ctx.time.delta()).just_finished() {
        return;
    }

    let Ok(mut text) = ctx.query.get_single_mut() else { return };

    if !ctx.state.visible {
        text.sections[0].value = String::new();
        return;
    }

    let fps = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);

    let player = ctx
        .player_query
        .get_single()
        .map_or_else(|_| "Player: N/A".to_string(), |(tf, p)| describe_player(p, tf.translation));

    let sound = if ctx.audio.is_ready() {
        format!("{} voices", ctx.audio.active_voices())
    } else {
        "off".to_string()
    };

    text.sections[0].value = format!("FPS: {fps:.1}\nSound: {sound}\n{player}");
}

#[allow(clippy::needless_pass_by_value)]
pub fn spawn_debug_overlay(mut commands: Commands, asset_server: Res<AssetServer>) {
    let font: Handle<Font> = asset_server.load("fonts/OpenSans.ttf");

    commands.spawn((
        TextBundle {
            text: Text::from_section(
                "",
                TextStyle {
                    font,
                    font_size: 18.0,
                    color: Color::srgb(1.0, 1.0, 0.0),
                },
            ),
            style: Style {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            ..default()
        },
        DebugOverlayText,
    ));
}

const GRID_CELL: f32 = 10.0;
const GRID_HALF_CELLS: i32 = 20;

/// Snap `position` to the grid cell containing it, on the ground plane.
#[must_use]
pub fn grid_origin(position: Vec3) -> Vec3 {
    Vec3::new(
        (position.x / GRID_CELL).floor() * GRID_CELL,
        0.0,
        (position.z / GRID_CELL).floor() * GRID_CELL,
    )
}

/// Draw the ground plane grid around the player.
#[allow(clippy::needless_pass_by_value, clippy::cast_precision_loss)]
pub fn render_ground_grid(
    grid: Res<DebugGridVisible>,
    mut gizmos: Gizmos,
    player_query: Query<&Transform, With<Player>>,
) {
    if !grid.0 {
        return;
    }

    let origin = player_query.get_single().map_or(Vec3::ZERO, |t| grid_origin(t.translation));
    let extent = GRID_CELL * GRID_HALF_CELLS as f32;
    let green = Color::srgba(0.0, 1.0, 0.0, 0.35);

    for i in -GRID_HALF_CELLS..=GRID_HALF_CELLS {
        let d = i as f32 * GRID_CELL;
        gizmos.line(origin + Vec3::new(d, 0.0, -extent), origin + Vec3::new(d, 0.0, extent), green);
        gizmos.line(origin + Vec3::new(-extent, 0.0, d), origin + Vec3::new(extent, 0.0, d), green);
    }

    // player column
    if let Ok(t) = player_query.get_single() {
        let foot = Vec3::new(t.translation.x, 0.0, t.translation.z);
        gizmos.line(foot, t.translation + Vec3::Y * 2.0, Color::srgb(1.0, 1.0, 0.0));
    }
}

/// Spawn a crosshair UI element centered on the screen.
pub fn spawn_crosshair(commands: &mut Commands) {
    commands
        .spawn(NodeBundle {
            style: Style {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            ..default()
        })
        .with_children(|p| {
            for (w, h) in [(20.0, 2.0), (2.0, 20.0)] {
                p.spawn(NodeBundle {
                    style: Style {
                        position_type: PositionType::Absolute,
                        width: Val::Px(w),
                        height: Val::Px(h),
                        ..default()
                    },
                    background_color: Color::WHITE.into(),
                    ..default()
                });
            }
        });
}
