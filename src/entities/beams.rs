//! Beam entities (§3, §4.7 step 8).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::ids::{BeamId, PlayerId};
use crate::common::layers::{Layer, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageApplication {
    Instantaneous,
    DamageOverTime,
    Burst,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Beam(pub BeamId);

#[derive(Component, Debug, Clone, Copy)]
pub struct BeamOwner {
    pub player: PlayerId,
    pub team: TeamId,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct BeamGeometry {
    pub origin: Vec2,
    pub aim: Vec2,
    /// Recomputed every tick via `physics::raycast` (§4.7 step 8).
    pub effective_end: Vec2,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct BeamDamage {
    pub application: DamageApplication,
    pub damage_per_tick: i32,
    pub pierces: bool,
}

/// Remaining duration in ticks; expires when it reaches zero.
#[derive(Component, Debug, Clone, Copy)]
pub struct BeamDuration(pub u64);

impl BeamDuration {
    pub fn tick(&mut self) -> bool {
        self.0 = self.0.saturating_sub(1);
        self.0 == 0
    }
}

/// Tick step 8: recomputes each beam's endpoint via a fresh raycast (it
/// can never be cached — the world moves between ticks), applies damage
/// to whatever it hit, and expires beams whose duration has elapsed.
pub fn update_beams(
    mut commands: Commands,
    spatial_query: SpatialQuery,
    mut beams: Query<(Entity, &BeamOwner, &mut BeamGeometry, &BeamDamage, &mut BeamDuration)>,
    mut players: Query<(&crate::entities::players::Player, &mut crate::entities::players::Health)>,
) {
    let filter = crate::physics::filter_excluding([Layer::Player, Layer::Obstacle, Layer::DestructibleObstacle, Layer::World]);
    for (entity, owner, mut geometry, damage, mut duration) in &mut beams {
        let dir = geometry.aim.normalize_or_zero();
        geometry.effective_end = if dir == Vec2::ZERO {
            geometry.origin
        } else {
            match crate::physics::raycast(&spatial_query, geometry.origin, dir, 2000.0, &filter) {
                Some(hit) => {
                    if let Ok((victim, mut health)) = players.get_mut(hit.entity) {
                        if victim.0 != owner.player {
                            health.apply_damage(damage.damage_per_tick);
                        }
                    }
                    hit.point
                }
                None => geometry.origin + dir * 2000.0,
            }
        };

        if duration.tick() {
            commands.entity(entity).insert(crate::entities::PendingDespawn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_reaching_zero_signals_expiry() {
        let mut d = BeamDuration(1);
        assert!(d.tick());
    }
}
