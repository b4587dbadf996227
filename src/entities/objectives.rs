//! Objective entities (§3): flags/oddball, KOTH zones, workshops, HQs.
//! The state machines that drive these live in [`crate::rules`]; this
//! module only defines the data they operate on.

use bevy::prelude::*;

use crate::common::ids::{ObjectiveId, PlayerId};
use crate::common::layers::TeamId;

#[derive(Component, Debug, Clone, Copy)]
pub struct Objective(pub ObjectiveId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum FlagState {
    Home,
    Carried { by: PlayerId },
    Dropped,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Flag {
    pub home_position: Vec2,
    pub position: Vec2,
    pub owner_team: TeamId,
    pub state: FlagState,
    pub capture_count: u32,
    /// Oddball has no owning team: it scores for whoever carries it.
    pub is_oddball: bool,
}

/// Present on a dropped flag; expiry returns it home.
#[derive(Component, Debug, Clone, Copy)]
pub struct DroppedAt {
    pub return_deadline_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum KothZoneState {
    Neutral,
    Capturing { team: TeamId },
    Contested,
    Controlled { team: TeamId },
}

#[derive(Component, Debug, Clone, Copy)]
pub struct KothZone {
    pub number: u32,
    pub position: Vec2,
    pub radius: f32,
    pub state: KothZoneState,
    /// In `[0, 1]`.
    pub progress: f32,
    pub capture_time_secs: f32,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ZonePresence {
    /// Count of players per team currently inside the zone, indexed by team id (0 = FFA slot, unused for KOTH).
    pub counts: [u32; 8],
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Workshop {
    pub position: Vec2,
    pub radius: f32,
    pub max_concurrent_pickups: u32,
    pub active_pickups: u32,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Headquarters {
    pub team: TeamId,
    pub health: i32,
    pub max_health: i32,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_flag_carries_no_carrier() {
        let flag = Flag {
            home_position: Vec2::ZERO,
            position: Vec2::new(50.0, 50.0),
            owner_team: 1,
            state: FlagState::Dropped,
            capture_count: 0,
            is_oddball: false,
        };
        assert_eq!(flag.state, FlagState::Dropped);
    }
}
