//! Player lifecycle systems kept out of the main application file.
use bevy::prelude::*;
use ppo::audio::SoundService;
use ppo::player::Player;

/// Cancel every footstep loop and cut off playback when the app is closing.
///
/// Runs before the world (and the sound service with it) is torn down, so no
/// loop starts another repetition while the playback pool is joined.
#[allow(clippy::needless_pass_by_value)]
pub fn stop_sounds_on_exit(
    mut exits: EventReader<AppExit>,
    mut players: Query<&mut Player>,
    audio: Res<SoundService>,
) {
    if exits.read().next().is_none() {
        return;
    }
    for mut player in &mut players {
        player.sounds.cancel_all();
    }
    if let Err(e) = audio.stop_all() {
        debug!("stop_all on exit: {e}");
    }
    info!("app exiting, playback stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use ppo::audio::{SoundBackend, SoundError, Stride};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingBackend {
        plays: AtomicUsize,
        stops: AtomicUsize,
    }

    impl SoundBackend for CountingBackend {
        fn initialize(&self) -> Result<(), SoundError> {
            Ok(())
        }

        fn play(&self, _clip: &str) -> Result<(), SoundError> {
            self.plays.fetch_add(1, Ordering::AcqRel);
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        }

        fn stop_all(&self) -> Result<(), SoundError> {
            self.stops.fetch_add(1, Ordering::AcqRel);
            Ok(())
        }
    }

    #[test]
    fn exit_cancels_loops_and_stops_playback() {
        let backend = Arc::new(CountingBackend::default());
        let mut audio = SoundService::new(backend.clone(), 1);
        audio.initialize().expect("initialize");

        let mut world = World::new();
        world.insert_resource(audio);
        world.init_resource::<Events<AppExit>>();

        let mut player = Player::default();
        assert!(player.sounds.try_start(Stride::Back, true, world.resource::<SoundService>(), "walk1"));
        let entity = world.spawn(player).id();

        world.run_system_once(stop_sounds_on_exit);
        assert_eq!(backend.stops.load(Ordering::Acquire), 0);
        assert_eq!(world.get::<Player>(entity).and_then(|p| p.sounds.active()), Some(Stride::Back));

        world.send_event(AppExit::Success);
        world.run_system_once(stop_sounds_on_exit);
        assert_eq!(backend.stops.load(Ordering::Acquire), 1);
        assert_eq!(world.get::<Player>(entity).and_then(|p| p.sounds.active()), None);
    }
}
