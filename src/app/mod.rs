pub mod display;
pub mod player;
pub mod setup;

pub use display::sync_vsync_settings;
pub use player::stop_sounds_on_exit;
pub use setup::setup;
