//! Collision layers.
//!
//! One `PhysicsLayer` enum acts as the schema for every category/mask pair in
//! the simulation. Kept centralized so collision intent never drifts between
//! call sites (spawn code for players/projectiles/obstacles/sensors all read
//! from here).

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Obstacle,
    DestructibleObstacle,
    Player,
    Projectile,
    /// Sensors never push: KOTH zones, workshops, pickups, proximity triggers.
    Sensor,
    /// Beams are ray casts, not bodies, but share the mask vocabulary for
    /// `raycast` filters.
    BeamBlocker,
}

pub type TeamId = u8;

/// Team 0 is FFA.
pub const FFA_TEAM: TeamId = 0;
