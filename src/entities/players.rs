//! Player entities (part of Component B / data model §3).

use avian2d::prelude::*;
use bevy::prelude::*;
use std::time::Duration;

use crate::common::ids::PlayerId;
use crate::common::layers::{Layer, TeamId};
use crate::common::tunables::Tunables;
use crate::status::StatusEffects;
use crate::weapons::WeaponState;

/// Collision radius for every player body (§3: "exactly one physics body
/// per active player").
pub const PLAYER_RADIUS: f32 = 24.0;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Player(pub PlayerId);

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsAi(pub bool);

#[derive(Component, Debug, Clone)]
pub struct PlayerMeta {
    pub display_name: String,
    pub team: TeamId,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub hp: i32,
    pub max_hp: i32,
}

impl Health {
    pub fn full(max_hp: i32) -> Self {
        Self { hp: max_hp, max_hp }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn apply_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount).max(0);
    }
}

/// Lives remaining for modes with limited lives (`None` = unlimited).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Lives(pub Option<u32>);

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Eliminated(pub bool);

/// Kill/death/capture counters (§3).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Scoreboard {
    pub kills: u32,
    pub deaths: u32,
    pub captures: u32,
}

/// Present while the player is physically absent from the world (dead,
/// awaiting respawn). §3: "a player is physically absent (no body) between
/// death and respawn." `deadline_tick` is the tick at which `rules::` should
/// attempt a respawn.
#[derive(Component, Debug, Clone, Copy)]
pub struct AwaitingRespawn {
    pub deadline_tick: u64,
}

/// A player currently carrying an objective entity (flag, oddball).
#[derive(Component, Debug, Clone, Copy)]
pub struct CarriedObjective(pub crate::common::ids::ObjectiveId);

/// This tick's resolved intent, written once by tick step 3 (ingest) and
/// read by steps 3-4 (movement application, weapon fire/reload
/// resolution) — the one piece of per-player state both the ingest system
/// and the weapon system need, so it lives on the entity rather than being
/// threaded through system parameters.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerIntent {
    pub move_dir: Vec2,
    pub aim_world: Vec2,
    pub fire: bool,
    pub alt_fire: bool,
    pub reload: bool,
}

/// Everything spawned with a live player body.
#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: Player,
    pub meta: PlayerMeta,
    pub health: Health,
    pub lives: Lives,
    pub eliminated: Eliminated,
    pub intent: PlayerIntent,
    pub scoreboard: Scoreboard,
    pub is_ai: IsAi,
    pub weapon: WeaponState,
    pub status: StatusEffects,
}

pub fn respawn_deadline(now_tick: u64, tick_rate_hz: u32, delay: Duration) -> u64 {
    now_tick + (delay.as_secs_f64() * tick_rate_hz as f64).round() as u64
}

/// Physics body for a live player: a kinematic circle, per §4.1 ("Bodies
/// are one of: kinematic circle (players, projectiles, pickups)").
#[derive(Bundle)]
pub struct PlayerPhysicsBundle {
    pub transform: Transform,
    pub rigid_body: RigidBody,
    pub collider: Collider,
    pub layers: CollisionLayers,
    pub velocity: LinearVelocity,
    pub locked_axes: LockedAxes,
}

pub fn physics_bundle(spawn: Vec2) -> PlayerPhysicsBundle {
    PlayerPhysicsBundle {
        transform: Transform::from_translation(spawn.extend(0.0)),
        rigid_body: RigidBody::Kinematic,
        collider: Collider::circle(PLAYER_RADIUS),
        layers: CollisionLayers::new(
            Layer::Player,
            [Layer::World, Layer::Obstacle, Layer::DestructibleObstacle, Layer::Projectile, Layer::Sensor],
        ),
        velocity: LinearVelocity::ZERO,
        locked_axes: LockedAxes::ROTATION_LOCKED,
    }
}

/// Deterministic per-team spawn point: teams ring the world center,
/// evenly spaced, so two players on the same team never land on the
/// exact same point (§6 "team configuration and spawn areas").
pub fn spawn_point_for_team(team: TeamId, tunables: &Tunables) -> Vec2 {
    if team == crate::common::layers::FFA_TEAM {
        return Vec2::ZERO;
    }
    let slice = std::f32::consts::TAU / 8.0;
    let angle = slice * (team as f32 - 1.0);
    let radius = tunables.world_width.min(tunables.world_height) * 0.4;
    Vec2::new(angle.cos(), angle.sin()) * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_clamps_at_zero() {
        let mut h = Health::full(100);
        h.apply_damage(150);
        assert_eq!(h.hp, 0);
        assert!(h.is_dead());
    }

    #[test]
    fn respawn_deadline_is_in_the_future() {
        assert_eq!(respawn_deadline(100, 60, Duration::from_secs(3)), 280);
    }

    #[test]
    fn ffa_team_spawns_at_world_center() {
        assert_eq!(spawn_point_for_team(0, &Tunables::default()), Vec2::ZERO);
    }

    #[test]
    fn distinct_teams_spawn_at_distinct_points() {
        let tunables = Tunables::default();
        assert_ne!(spawn_point_for_team(1, &tunables), spawn_point_for_team(2, &tunables));
    }
}
