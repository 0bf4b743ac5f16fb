//! Display-related systems: syncing the vsync and present mode settings from
//! the `Settings` resource to the primary window.
use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow};
use ppo::settings::GraphicsSettings;
use ppo::settings::Settings;

/// Present mode named by `graphics`. With vsync on this is always `Fifo`;
/// otherwise `graphics.present_mode` is used, falling back to `AutoNoVsync`.
pub fn present_mode(graphics: &GraphicsSettings) -> PresentMode {
    if graphics.vsync {
        return PresentMode::Fifo;
    }
    match graphics.present_mode.to_ascii_lowercase().as_str() {
        "immediate" => PresentMode::Immediate,
        "mailbox" => PresentMode::Mailbox,
        "fifo" => PresentMode::Fifo,
        "fiforelaxed" => PresentMode::FifoRelaxed,
        "autovsync" => PresentMode::AutoVsync,
        "autonovsync" => PresentMode::AutoNoVsync,
        other => {
            warn!("unknown present mode '{other}', using AutoNoVsync");
            PresentMode::AutoNoVsync
        }
    }
}

/// Apply the graphics settings to the primary window whenever they change,
/// so vsync can be toggled at runtime through the settings file.
///
/// # Example
/// ```ignore
/// app.add_systems(Update, crate::app::sync_vsync_settings);
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn sync_vsync_settings(
    settings: Res<Settings>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut last: Local<Option<PresentMode>>,
) {
    if last.is_some() && !settings.is_changed() {
        return;
    }
    let desired = present_mode(&settings.graphics);
    if *last == Some(desired) {
        return;
    }

    for mut w in &mut windows {
        w.present_mode = desired;
    }
    *last = Some(desired);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_wins_over_present_mode() {
        let graphics = GraphicsSettings { vsync: true, present_mode: "Immediate".to_string() };
        assert_eq!(present_mode(&graphics), PresentMode::Fifo);
    }

    #[test]
    fn present_mode_parses_case_insensitively() {
        let mut graphics = GraphicsSettings { vsync: false, present_mode: "mailBox".to_string() };
        assert_eq!(present_mode(&graphics), PresentMode::Mailbox);
        graphics.present_mode = "bogus".to_string();
        assert_eq!(present_mode(&graphics), PresentMode::AutoNoVsync);
    }
}
