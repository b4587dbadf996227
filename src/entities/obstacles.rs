//! Obstacle entities (§3).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::ids::{ObstacleId, PlayerId};
use crate::common::layers::Layer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleShape {
    Circular,
    Rectangular,
    Triangular,
    Polygonal,
    Compound,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Obstacle(pub ObstacleId);

#[derive(Component, Debug, Clone, Copy)]
pub struct ObstacleShapeTag(pub ObstacleShape);

/// Static obstacles never move (invariant, §3); destructible variants carry
/// health and may be player-placed (`owner`/`expires_at_tick`).
#[derive(Component, Debug, Clone, Copy)]
pub struct Destructible {
    pub health: i32,
    pub max_health: i32,
    pub active: bool,
    pub owner: Option<PlayerId>,
    pub expires_at_tick: Option<u64>,
}

impl Destructible {
    pub fn apply_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            self.active = false;
        }
    }

    pub fn is_expired(&self, now_tick: u64) -> bool {
        !self.active || self.expires_at_tick.is_some_and(|deadline| now_tick >= deadline)
    }
}

/// Static physics body for an obstacle (§4.1: "static obstacles never
/// move"). Destructible variants still carry this bundle — they just also
/// carry [`Destructible`]; contact resolution despawns them on zero health
/// rather than moving or removing the body mid-step.
#[derive(Bundle)]
pub struct ObstaclePhysicsBundle {
    pub transform: Transform,
    pub rigid_body: RigidBody,
    pub collider: Collider,
    pub layers: CollisionLayers,
}

pub fn physics_bundle(position: Vec2, shape: ObstacleShape, radius: f32, destructible: bool) -> ObstaclePhysicsBundle {
    let collider = match shape {
        ObstacleShape::Circular => Collider::circle(radius),
        ObstacleShape::Rectangular | ObstacleShape::Compound => Collider::rectangle(radius * 2.0, radius * 2.0),
        ObstacleShape::Triangular => {
            let points = vec![Vec2::new(0.0, radius), Vec2::new(-radius, -radius), Vec2::new(radius, -radius)];
            Collider::convex_hull(points).unwrap_or_else(|| Collider::circle(radius))
        }
        ObstacleShape::Polygonal => {
            let sides = 6;
            let points: Vec<Vec2> = (0..sides)
                .map(|i| {
                    let angle = std::f32::consts::TAU * i as f32 / sides as f32;
                    Vec2::new(angle.cos(), angle.sin()) * radius
                })
                .collect();
            Collider::convex_hull(points).unwrap_or_else(|| Collider::circle(radius))
        }
    };
    let layer = if destructible { Layer::DestructibleObstacle } else { Layer::Obstacle };
    ObstaclePhysicsBundle {
        transform: Transform::from_translation(position.extend(0.0)),
        rigid_body: RigidBody::Static,
        collider,
        layers: CollisionLayers::new(layer, [Layer::Player, Layer::Projectile, Layer::World, Layer::Obstacle, Layer::DestructibleObstacle]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructible_deactivates_at_zero_health() {
        let mut d = Destructible { health: 10, max_health: 10, active: true, owner: None, expires_at_tick: None };
        d.apply_damage(10);
        assert!(!d.active);
    }

    #[test]
    fn player_placed_barrier_expires_on_timer() {
        let d = Destructible { health: 10, max_health: 10, active: true, owner: Some(PlayerId::default_for_test()), expires_at_tick: Some(50) };
        assert!(!d.is_expired(49));
        assert!(d.is_expired(50));
    }
}
