//! Tunable gameplay constants.
//!
//! Generalizes the teacher's single `Tunables` resource (three constants) to
//! the full configuration surface enumerated in `spec.md` §6. Values here
//! are the per-match defaults; `crate::config::ServerConfig` overrides the
//! process-wide ones (tick rate, world size, player caps) at lobby-creation
//! time and `crate::weapons` overrides per-weapon presets.

use bevy::prelude::*;
use std::time::Duration;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub world_width: f32,
    pub world_height: f32,
    pub tick_rate_hz: u32,
    /// Bevy's `Time<Fixed>::set_max_delta` cap, expressed as a tick count —
    /// `spec.md` §4.7's "small catch-up cap, e.g. 3".
    pub catch_up_cap_ticks: u32,
    pub broadcast_divisor: u32,
    /// Team count for the initial-state team/spawn-area listing (§6).
    /// Team 0 (FFA) is always implicit and never included here.
    pub max_teams: u8,
    pub respawn_delay: Duration,
    /// §5: "Endpoint operations respect a configurable read and write
    /// deadline; a transport failure closes the endpoint."
    pub read_deadline: Duration,
    pub write_deadline: Duration,
}

impl Tunables {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }

    pub fn max_fixed_delta(&self) -> Duration {
        self.tick_interval() * self.catch_up_cap_ticks
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            world_width: 2400.0,
            world_height: 1350.0,
            tick_rate_hz: 60,
            catch_up_cap_ticks: 3,
            broadcast_divisor: 1,
            max_teams: 2,
            respawn_delay: Duration::from_secs(3),
            read_deadline: Duration::from_secs(30),
            write_deadline: Duration::from_secs(5),
        }
    }
}
