use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use ppo::audio::{stop_sounds_on_player_removed, HeadlessMixer, SoundService};
use ppo::player::{cursor_grab, player_input, player_physics, sync_player_camera};
use ppo::settings::loader as settings_loader;
use ppo::ui::{
    render_ground_grid, setup_debug_overlay, spawn_debug_overlay, toggle_debug_grid,
    toggle_debug_overlay, update_debug_overlay,
};
use std::sync::Arc;

mod app;
use app::{setup, stop_sounds_on_exit, sync_vsync_settings};

fn sound_service(settings: &ppo::settings::Settings) -> SoundService {
    let backend = Arc::new(HeadlessMixer::from_settings(&settings.audio));
    let mut service = SoundService::new(backend, settings.audio.playback_threads);
    if !settings.audio.enabled {
        info!("sound disabled in settings");
        return service;
    }
    if let Err(e) = service.initialize() {
        error!("sound engine failed to start, continuing without sound: {e}");
    }
    service
}

fn main() {
    let settings = settings_loader::load_settings_from_dir(settings_loader::SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(settings_loader::SETTINGS_DIR)
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "ppo".to_string(),
                position: WindowPosition::Centered(MonitorSelection::Primary),
                present_mode: PresentMode::AutoNoVsync,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(LogDiagnosticsPlugin::default());

    // After DefaultPlugins: the log subscriber is installed by LogPlugin.
    app.insert_resource(sound_service(&settings));
    app.insert_resource(settings);
    app.insert_resource(settings_watcher);

    app.add_systems(Startup, (setup_debug_overlay, spawn_debug_overlay, setup));
    app.add_systems(
        Update,
        (player_input, player_physics, sync_player_camera).chain(),
    );
    app.add_systems(Update, cursor_grab);
    app.add_systems(Update, settings_loader::check_settings_changes);
    app.add_systems(Update, sync_vsync_settings);
    app.add_systems(Update, (toggle_debug_overlay, toggle_debug_grid, update_debug_overlay));
    app.add_systems(Update, render_ground_grid);
    app.add_systems(PostUpdate, (stop_sounds_on_player_removed, stop_sounds_on_exit));

    app.run();
}
