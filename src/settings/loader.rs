//! Settings loading and hot-reloading.
//!
//! Settings are loaded from RON files in the `data/settings` directory. If multiple
//! RON files are present, the first successfully parsed `Settings` will be used.
//! If no RON files are found or if no parsing succeeds, default settings will be used.
use crate::ron_loader::{load_ron_files, setup_ron_watcher, RonWatcher};
use crate::settings::Settings;
use bevy::prelude::{info, Res, ResMut, Resource};

pub const SETTINGS_DIR: &str = "data/settings";

#[derive(Resource)]
pub struct SettingsWatcher {
    pub watcher: RonWatcher,
    pub dir: String,
}

/// Load settings from `path` (directory). If multiple `.ron` files are present
/// the first parsed `Settings` (by file name) will be used. If none exist the
/// `Default` is used.
///
/// # Example
/// ```no_run
/// let settings = ppo::settings::loader::load_settings_from_dir("data/settings");
/// assert!(settings.movement.gravity > 0.0);
/// ```
#[must_use]
pub fn load_settings_from_dir(path: &str) -> Settings {
    load_ron_files::<Settings>(path)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Create a watcher for the settings directory (hot-reload).
///
/// # Errors
/// Returns a `notify::Error` when the directory cannot be watched.
pub fn setup_settings_watcher(path: &str) -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(path).map(|watcher| SettingsWatcher { watcher, dir: path.to_string() })
}

/// Reload the `Settings` resource when the watcher reports a change.
///
/// The player reads tuning from the resource every frame, so a reload takes
/// effect on the next tick.
///
/// # Arguments
/// * `watcher` - `SettingsWatcher` resource holding the directory watcher
/// * `settings` - mutable `Settings` resource replaced on change
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if watcher.watcher.take_changed() {
        info!("settings changed in {}, reloading", watcher.dir);
        *settings = load_settings_from_dir(&watcher.dir);
    }
}

impl SettingsWatcher {
    /// Watcher that never fires, used when the OS watcher cannot be created.
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher { watcher: RonWatcher::stub(), dir: SETTINGS_DIR.to_string() }
    }
}
