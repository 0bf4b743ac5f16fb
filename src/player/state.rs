//! Locomotion state machine.
//!
//! The player is always in exactly one [`LocomotionState`]. Transitions go
//! through [`Player::change_state`], which runs the outgoing state's exit
//! hook, swaps the value, then runs the incoming state's enter hook. Hooks get
//! the whole player plus the sound cues and may request further transitions.
//!
//! Grounded states (Idle, Walk, Run) are picked from horizontal speed every
//! tick. Jump, Fall and Land advance on their own: Jump and Land after the
//! animation clock passes [`STATE_HOLD_SECONDS`], Fall once the ground
//! clears the falling flag.
use bevy::prelude::debug;

use super::Player;
use crate::audio::SoundCues;
use crate::settings::MovementSettings;

/// Time Jump and Land hold before moving on.
pub const STATE_HOLD_SECONDS: f32 = 0.85;

// Animation clip index per state identifier; slot 0 is the reserved default id.
const ANIMATION_TABLE: [u32; LocomotionState::COUNT as usize] = [0, 0, 1, 2, 3, 4, 5];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LocomotionState {
    #[default]
    Idle,
    Walk,
    Run,
    Jump,
    Fall,
    Land,
}

impl LocomotionState {
    /// Number of identifier slots, including the reserved id 0.
    pub const COUNT: u32 = 7;

    pub const ALL: [LocomotionState; 6] = [
        LocomotionState::Idle,
        LocomotionState::Walk,
        LocomotionState::Run,
        LocomotionState::Jump,
        LocomotionState::Fall,
        LocomotionState::Land,
    ];

    /// Stable identifier exposed to the animation layer (1..=6).
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            LocomotionState::Idle => 1,
            LocomotionState::Walk => 2,
            LocomotionState::Run => 3,
            LocomotionState::Jump => 4,
            LocomotionState::Fall => 5,
            LocomotionState::Land => 6,
        }
    }

    /// Inverse of [`LocomotionState::id`]. The reserved id 0 and anything at or
    /// past [`LocomotionState::COUNT`] yield `None`.
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    #[must_use]
    pub fn animation_index(self) -> u32 {
        ANIMATION_TABLE[self.id() as usize]
    }

    #[must_use]
    pub fn is_airborne(self) -> bool {
        matches!(self, LocomotionState::Jump | LocomotionState::Fall)
    }

    fn enter(self, player: &mut Player, cues: &SoundCues<'_>) {
        match self {
            LocomotionState::Jump => {
                player.sounds.interrupt(cues.service);
                player.clock.reset();
                // The one trigger that waits for its clip.
                if let Err(e) = cues.service.play_and_wait(&cues.clips.jump_clip) {
                    debug!("jump sound skipped: {e}");
                }
            }
            LocomotionState::Land => {
                player.sounds.interrupt(cues.service);
                player.clock.reset();
                cues.service.play_detached(&cues.clips.landing_clip);
            }
            LocomotionState::Idle
            | LocomotionState::Walk
            | LocomotionState::Run
            | LocomotionState::Fall => {}
        }
    }

    fn update(self, player: &mut Player, cues: &SoundCues<'_>) {
        let next = match self {
            LocomotionState::Jump if player.clock.elapsed() > STATE_HOLD_SECONDS => LocomotionState::Fall,
            LocomotionState::Land if player.clock.elapsed() > STATE_HOLD_SECONDS => LocomotionState::Idle,
            LocomotionState::Fall if !player.falling => LocomotionState::Land,
            _ => return,
        };
        player.clock.reset();
        player.change_state(next, cues);
    }

    // No state holds anything that needs releasing on the way out.
    fn exit(self, _player: &mut Player, _cues: &SoundCues<'_>) {}
}

/// Seconds since the current state was entered or last reset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationClock(f32);

impl AnimationClock {
    #[must_use]
    pub fn elapsed(self) -> f32 {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0.0;
    }

    pub fn advance(&mut self, dt: f32) {
        self.0 += dt.max(0.0);
    }
}

impl Player {
    /// Replace the current state with `next`.
    ///
    /// Returns `false`, with nothing changed, when `next` is already current.
    pub fn change_state(&mut self, next: LocomotionState, cues: &SoundCues<'_>) -> bool {
        let current = self.state;
        if next == current {
            return false;
        }
        current.exit(self, cues);
        self.state = next;
        debug!("locomotion {current:?} -> {next:?}");
        next.enter(self, cues);
        true
    }

    /// [`Player::change_state`] for a raw identifier, as received from the
    /// animation layer or scripts. Unknown identifiers are rejected.
    pub fn change_state_by_id(&mut self, id: u32, cues: &SoundCues<'_>) -> bool {
        match LocomotionState::from_id(id) {
            Some(next) => self.change_state(next, cues),
            None => {
                debug!("rejected transition to unknown state id {id}");
                false
            }
        }
    }

    /// Re-evaluate the locomotion state after the integrator has moved the
    /// player to `height`, then run the current state's update hook.
    pub fn update_state(&mut self, height: f32, movement: &MovementSettings, cues: &SoundCues<'_>) {
        if height > 0.0 && !self.falling {
            self.falling = true;
            self.change_state(LocomotionState::Fall, cues);
        }

        if !self.falling {
            let speed = self.horizontal_speed();
            if speed <= movement.idle_speed_threshold {
                if !matches!(self.state, LocomotionState::Land | LocomotionState::Fall) {
                    self.change_state(LocomotionState::Idle, cues);
                }
            } else if speed > movement.walk_speed_cap {
                self.change_state(LocomotionState::Run, cues);
            } else {
                self.change_state(LocomotionState::Walk, cues);
            }
        }

        let current = self.state;
        current.update(self, cues);
    }

    /// Apply a jump impulse and enter Jump. Ignored while already airborne.
    pub fn try_jump(&mut self, jump_force: f32, cues: &SoundCues<'_>) -> bool {
        if self.falling {
            return false;
        }
        self.sounds.interrupt(cues.service);
        self.velocity.y += jump_force;
        self.falling = true;
        self.change_state(LocomotionState::Jump, cues);
        true
    }
}
