//! Startup scene: the ground plane at y = 0, lights, the player and the
//! render camera that follows the player's rig.
use bevy::prelude::*;
use ppo::player::{CameraRig, Player, PlayerCamera};
use ppo::settings::Settings;

const GROUND_SIZE: f32 = 20_000.0;
const PLAYER_RADIUS: f32 = 10.0;
const PLAYER_HEIGHT: f32 = 40.0;

/// Spawn the scene.
///
/// The player entity carries its pose (`Transform`), the `Player` component
/// and its `CameraRig`; the capsule mesh is a child so its origin sits on the
/// ground while the player's translation stays at foot level.
#[allow(clippy::needless_pass_by_value)]
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<Settings>,
) {
    commands.spawn(PbrBundle {
        mesh: meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE)),
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.32, 0.45, 0.28),
            perceptual_roughness: 0.9,
            ..default()
        }),
        ..default()
    });

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            shadows_enabled: true,
            illuminance: 8000.0,
            ..default()
        },
        transform: Transform::from_xyz(200.0, 600.0, 300.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
    });

    let player = Player::new(&settings.camera);
    let mut rig = CameraRig::default();
    let pose = Transform::default();
    rig.recompute(&pose, player.camera_mode, player.pitch, player.active_zoom(), &settings.camera);
    let camera_transform = rig.camera_transform();

    commands
        .spawn((SpatialBundle::from_transform(pose), player, rig))
        .with_children(|p| {
            p.spawn(PbrBundle {
                mesh: meshes.add(Capsule3d::new(PLAYER_RADIUS, PLAYER_HEIGHT - 2.0 * PLAYER_RADIUS)),
                material: materials.add(StandardMaterial {
                    base_color: Color::srgb(0.85, 0.55, 0.2),
                    ..default()
                }),
                transform: Transform::from_xyz(0.0, PLAYER_HEIGHT * 0.5, 0.0),
                ..default()
            });
        });

    commands.spawn((
        Camera3dBundle {
            transform: camera_transform,
            ..default()
        },
        PlayerCamera,
    ));

    ppo::ui::spawn_crosshair(&mut commands);
    info!("scene ready, camera mode {:?}", settings.camera.default_mode);
}
