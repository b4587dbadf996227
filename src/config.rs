//! Process configuration surface.
//!
//! `spec.md` §6 enumerates this exactly; grounded in the pack's
//! `echo-session-ws-gateway`, which already reads its listen address and
//! TLS options via `clap::Parser` with env fallbacks rather than hand-rolled
//! `std::env::var` parsing.

use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "arena-server", about = "Authoritative arena shooter match server")]
pub struct ServerConfig {
    /// Simulation tick rate, in Hz.
    #[arg(long, env = "TICK_RATE", default_value_t = 60)]
    pub tick_rate: u32,

    /// Snapshot broadcast cadence as an integer divisor of the tick rate.
    #[arg(long, env = "BROADCAST_DIVISOR", default_value_t = 1)]
    pub broadcast_divisor: u32,

    #[arg(long, env = "WORLD_WIDTH", default_value_t = 2400.0)]
    pub world_width: f32,

    #[arg(long, env = "WORLD_HEIGHT", default_value_t = 1350.0)]
    pub world_height: f32,

    #[arg(long, env = "MAX_PLAYERS_PER_MATCH", default_value_t = 12)]
    pub max_players_per_match: usize,

    #[arg(long, env = "MAX_GLOBAL_PLAYERS", default_value_t = 2000)]
    pub max_global_players: usize,

    /// Lobby cull sweep interval, in seconds.
    #[arg(long, env = "MATCH_CULL_INTERVAL", default_value_t = 60)]
    pub match_cull_interval_secs: u64,

    #[arg(long, env = "RESPAWN_DELAY", default_value_t = 3.0)]
    pub respawn_delay_secs: f32,

    #[arg(long, env = "RELOAD_GRACE", default_value_t = 0.0)]
    pub reload_grace_secs: f32,

    /// Per-endpoint read deadline, in seconds (§5).
    #[arg(long, env = "READ_DEADLINE", default_value_t = 30.0)]
    pub read_deadline_secs: f32,

    /// Per-endpoint write deadline, in seconds (§5).
    #[arg(long, env = "WRITE_DEADLINE", default_value_t = 5.0)]
    pub write_deadline_secs: f32,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:7777")]
    pub listen_addr: String,
}

impl ServerConfig {
    pub fn match_cull_interval(&self) -> Duration {
        Duration::from_secs(self.match_cull_interval_secs)
    }

    pub fn respawn_delay(&self) -> Duration {
        Duration::from_secs_f32(self.respawn_delay_secs)
    }

    pub fn tunables(&self) -> crate::common::tunables::Tunables {
        crate::common::tunables::Tunables {
            world_width: self.world_width,
            world_height: self.world_height,
            tick_rate_hz: self.tick_rate,
            broadcast_divisor: self.broadcast_divisor.max(1),
            respawn_delay: self.respawn_delay(),
            read_deadline: Duration::from_secs_f32(self.read_deadline_secs),
            write_deadline: Duration::from_secs_f32(self.write_deadline_secs),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_parse_with_no_args() {
        let cfg = ServerConfig::parse_from(["arena-server"]);
        assert_eq!(cfg.tick_rate, 60);
        assert_eq!(cfg.broadcast_divisor, 1);
        assert_eq!(cfg.listen_addr, "0.0.0.0:7777");
    }

    #[test]
    fn overrides_from_args() {
        let cfg = ServerConfig::parse_from(["arena-server", "--tick-rate", "30", "--max-players-per-match", "4"]);
        assert_eq!(cfg.tick_rate, 30);
        assert_eq!(cfg.max_players_per_match, 4);
    }

    #[test]
    fn read_write_deadlines_reach_tunables() {
        let cfg = ServerConfig::parse_from(["arena-server", "--read-deadline", "10", "--write-deadline", "2"]);
        let tunables = cfg.tunables();
        assert_eq!(tunables.read_deadline, Duration::from_secs(10));
        assert_eq!(tunables.write_deadline, Duration::from_secs(2));
    }
}
