//! Capture-the-flag / oddball (§4.5).
//!
//! Flag state transitions are expressed as pure functions over
//! [`FlagState`](crate::entities::objectives::FlagState) so the pickup,
//! drop-on-death, and capture rules are independently testable.

use bevy::prelude::Vec2;
use std::collections::HashMap;

use crate::common::ids::PlayerId;
use crate::common::layers::TeamId;
use crate::entities::objectives::FlagState;

/// §4.5: "Carry happens when a player from the *opposing* team touches the
/// flag at home or dropped." Returns the new state, or `None` if the touch
/// has no effect (own-team touch, flag already carried).
pub fn try_pickup(state: FlagState, owner_team: TeamId, toucher_team: TeamId, toucher: PlayerId) -> Option<FlagState> {
    if toucher_team == owner_team {
        return None;
    }
    match state {
        FlagState::Home | FlagState::Dropped => Some(FlagState::Carried { by: toucher }),
        FlagState::Carried { .. } => None,
    }
}

/// §4.5: carrier death drops the flag at the death location with a return
/// timer.
pub fn on_carrier_death(state: FlagState, dead_player: PlayerId) -> Option<FlagState> {
    match state {
        FlagState::Carried { by } if by == dead_player => Some(FlagState::Dropped),
        _ => None,
    }
}

/// §4.5: capture scores when the carrier reaches their own team's home flag
/// pedestal. `require_own_flag_home` implements the "own-flag-home-required
/// scoring policy" knob.
pub fn try_capture(
    carried_state: FlagState,
    carrier_team: TeamId,
    own_flag_home: bool,
    require_own_flag_home: bool,
) -> bool {
    matches!(carried_state, FlagState::Carried { .. }) && (!require_own_flag_home || own_flag_home) && carrier_team != 0
}

/// Oddball: points-per-second accrue to the carrying player's team while
/// carried.
#[derive(Debug, Clone, Default)]
pub struct OddballScores {
    pub seconds_held: HashMap<TeamId, f32>,
}

impl OddballScores {
    pub fn accrue(&mut self, carrier_team: TeamId, dt_secs: f32) {
        *self.seconds_held.entry(carrier_team).or_insert(0.0) += dt_secs;
    }
}

pub fn spawn_point_after_return(home: Vec2) -> Vec2 {
    home
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> PlayerId {
        PlayerId::default_for_test()
    }

    #[test]
    fn own_team_cannot_pick_up_their_own_flag() {
        assert_eq!(try_pickup(FlagState::Home, 1, 1, pid()), None);
    }

    #[test]
    fn opposing_team_picks_up_flag_at_home_or_dropped() {
        assert_eq!(try_pickup(FlagState::Home, 1, 2, pid()), Some(FlagState::Carried { by: pid() }));
        assert_eq!(try_pickup(FlagState::Dropped, 1, 2, pid()), Some(FlagState::Carried { by: pid() }));
    }

    #[test]
    fn death_drops_flag_only_for_the_actual_carrier() {
        let other = PlayerId::from_raw_test(2);
        assert_eq!(on_carrier_death(FlagState::Carried { by: pid() }, other), None);
        assert_eq!(on_carrier_death(FlagState::Carried { by: pid() }, pid()), Some(FlagState::Dropped));
    }

    #[test]
    fn capture_requires_own_flag_home_when_policy_enabled() {
        assert!(!try_capture(FlagState::Carried { by: pid() }, 1, false, true));
        assert!(try_capture(FlagState::Carried { by: pid() }, 1, true, true));
        assert!(try_capture(FlagState::Carried { by: pid() }, 1, false, false));
    }
}
