//! Projectile entities (§3, §4.3).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::ids::{IdAllocators, PlayerId, ProjectileId};
use crate::common::layers::{Layer, TeamId, FFA_TEAM};
use crate::common::tunables::Tunables;
use crate::entities::field_effects::{self, FieldEffectKind};
use crate::entities::players::{Player, PlayerMeta};
use crate::entities::registry::Registry;
use crate::weapons::{BulletEffects, OrdinanceKind};

/// Collision radius for every projectile body, regardless of ordinance
/// kind — visual size is a client concern (§1: clients are thin renderers).
pub const PROJECTILE_RADIUS: f32 = 6.0;

#[derive(Component, Debug, Clone, Copy)]
pub struct Projectile(pub ProjectileId);

#[derive(Component, Debug, Clone, Copy)]
pub struct Owner {
    pub player: PlayerId,
    pub team: TeamId,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Ordinance {
    pub kind: OrdinanceKind,
    pub effects: BulletEffects,
    pub damage: i32,
}

/// Remaining lifetime in ticks; reaching zero marks the projectile for
/// deferred removal at flush. Doubles as the "optional fuse timer" §3
/// mentions for explosive-on-timer ordinance: an `EXPLOSIVE` projectile
/// detonates on expiry instead of just despawning (see
/// [`advance_projectiles`]), so a separate fuse countdown would only
/// duplicate this one.
#[derive(Component, Debug, Clone, Copy)]
pub struct Lifetime(pub u64);

impl Lifetime {
    pub fn tick(&mut self) -> bool {
        self.0 = self.0.saturating_sub(1);
        self.0 == 0
    }
}

/// Remaining pierce count for `BulletEffects::PIERCING` projectiles.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PiercesRemaining(pub u8);

/// Ticks until a mine/net/timed projectile arms; zero means armed.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ArmTimer(pub u64);

impl ArmTimer {
    pub fn is_armed(&self) -> bool {
        self.0 == 0
    }

    pub fn tick(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }
}

#[derive(Bundle)]
pub struct ProjectileBundle {
    pub projectile: Projectile,
    pub owner: Owner,
    pub ordinance: Ordinance,
    pub lifetime: Lifetime,
    pub pierces: PiercesRemaining,
    pub arm_timer: ArmTimer,
}

/// Physics body for a spawned projectile: a kinematic circle moving at
/// `velocity`, per §4.1 ("kinematic circle (players, projectiles,
/// pickups)"). Own-team collisions are excluded via `CollisionLayers`
/// filters rather than a per-contact team check, per §4.1's "own-team
/// projectiles may bypass own-team barriers."
#[derive(Bundle)]
pub struct ProjectilePhysicsBundle {
    pub transform: Transform,
    pub rigid_body: RigidBody,
    pub collider: Collider,
    pub layers: CollisionLayers,
    pub velocity: LinearVelocity,
    /// Avian only emits `CollisionStart`/`CollisionEnd` if one collider
    /// opts in; projectiles are the side that always needs the event.
    pub events: CollisionEventsEnabled,
}

pub fn physics_bundle(position: Vec2, velocity: Vec2) -> ProjectilePhysicsBundle {
    ProjectilePhysicsBundle {
        transform: Transform::from_translation(position.extend(0.0)),
        rigid_body: RigidBody::Kinematic,
        collider: Collider::circle(PROJECTILE_RADIUS),
        layers: CollisionLayers::new(Layer::Projectile, [Layer::World, Layer::Obstacle, Layer::DestructibleObstacle, Layer::Player]),
        velocity: LinearVelocity(velocity),
        events: CollisionEventsEnabled,
    }
}

/// Constant downward acceleration applied to arcing ordinance (§4.3:
/// "terminal behavior on first contact... gravity/arc (grenades)"),
/// expressed the same way the teacher mutates pooled-bullet velocity
/// directly rather than reaching for a physics-engine gravity scale.
const ARC_GRAVITY: f32 = 600.0;

/// Per-tick fraction of the way a homing projectile turns toward its
/// target, tuned so a shot curves over several ticks rather than snapping
/// instantly onto the target bearing.
const HOMING_TURN_FRACTION: f32 = 0.12;

/// Radius a mine's sensor field effect detonates within once armed.
const MINE_BLAST_RADIUS: f32 = 90.0;

/// Tick step 4 (§4.3's per-ordinance-kind behaviors, not a named tick step
/// of its own but resolved alongside the other pre-physics actions):
/// decrements each projectile's lifetime (expiring it at zero), applies
/// arc gravity and homing steering to velocity, and converts an armed
/// mine into a proximity-mine field effect.
#[allow(clippy::too_many_arguments)]
pub fn advance_projectiles(
    mut commands: Commands,
    tunables: Res<Tunables>,
    allocators: Res<IdAllocators>,
    mut registry: ResMut<Registry>,
    mut projectiles: Query<
        (Entity, &Owner, &Ordinance, &mut Lifetime, &mut ArmTimer, &Transform, &mut LinearVelocity),
        With<Projectile>,
    >,
    enemies: Query<(&Player, &PlayerMeta, &Transform), Without<Projectile>>,
) {
    let dt = tunables.tick_interval().as_secs_f32();
    let targets: Vec<(TeamId, Vec2)> = enemies.iter().map(|(_, meta, t)| (meta.team, t.translation.truncate())).collect();

    for (entity, owner, ordinance, mut lifetime, mut arm_timer, transform, mut velocity) in &mut projectiles {
        if lifetime.tick() {
            if ordinance.effects.contains(BulletEffects::EXPLOSIVE) {
                field_effects::spawn(
                    &mut commands,
                    &allocators,
                    &mut registry,
                    FieldEffectKind::Explosion,
                    transform.translation.truncate(),
                    90.0,
                    1,
                    owner.team,
                    1.0,
                    true,
                );
            }
            commands.entity(entity).insert(crate::entities::PendingDespawn);
            continue;
        }

        if ordinance.kind.has_arc() {
            velocity.0.y -= ARC_GRAVITY * dt;
        }

        if ordinance.effects.contains(BulletEffects::HOMING) {
            let origin = transform.translation.truncate();
            let nearest = targets
                .iter()
                .filter(|(team, _)| owner.team == FFA_TEAM || *team != owner.team)
                .map(|(_, pos)| *pos)
                .min_by(|a, b| origin.distance(*a).total_cmp(&origin.distance(*b)));
            if let Some(target) = nearest {
                let to_target = (target - origin).normalize_or_zero();
                let current = velocity.0;
                let speed = current.length();
                if to_target != Vec2::ZERO && speed > 0.0 {
                    let steered = (current.normalize_or_zero() + to_target * HOMING_TURN_FRACTION).normalize_or_zero();
                    velocity.0 = steered * speed;
                }
            }
        }

        if ordinance.kind == OrdinanceKind::Mine && !arm_timer.is_armed() {
            arm_timer.tick();
            if arm_timer.is_armed() {
                field_effects::spawn(
                    &mut commands,
                    &allocators,
                    &mut registry,
                    FieldEffectKind::ProximityMine,
                    transform.translation.truncate(),
                    MINE_BLAST_RADIUS,
                    u64::MAX,
                    owner.team,
                    1.0,
                    true,
                );
                commands.entity(entity).insert(crate::entities::PendingDespawn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_reaching_zero_signals_expiry() {
        let mut lifetime = Lifetime(1);
        assert!(lifetime.tick());
        assert_eq!(lifetime.0, 0);
    }

    #[test]
    fn arm_timer_counts_down_to_armed() {
        let mut timer = ArmTimer(2);
        assert!(!timer.is_armed());
        timer.tick();
        timer.tick();
        assert!(timer.is_armed());
    }
}
