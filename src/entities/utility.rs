//! Utility entities (§3): turrets, teleport pads, defense lasers, pickups.
//! Net projectiles are ordinary [`super::projectiles::Projectile`]s with the
//! `Net` ordinance kind, not a separate utility entity.
//!
//! Turrets and defense lasers are pre-placed map furniture, not a
//! player-deployable ability (`spec.md` never defines a deploy operation);
//! each is given a phantom `PlayerId` at seeding time purely so
//! [`Owner`](super::projectiles::Owner)/[`BeamOwner`](super::beams::BeamOwner)
//! friendly-fire checks have something to compare against (see
//! `entities::seeding`).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::ids::{IdAllocators, PlayerId, UtilityId};
use crate::common::layers::{Layer, TeamId};
use crate::common::tick::TickCounter;
use crate::entities::beams::{Beam, BeamDamage, BeamDuration, BeamGeometry, BeamOwner, DamageApplication};
use crate::entities::players::{Eliminated, Player, PlayerMeta};
use crate::entities::projectiles::{self, ArmTimer, Lifetime, Ordinance, Owner, PiercesRemaining, Projectile, ProjectileBundle};
use crate::entities::registry::Registry;
use crate::weapons::OrdinanceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    Turret,
    TeleportPad,
    DefenseLaser,
    Pickup,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct UtilityEntity(pub UtilityId);

#[derive(Component, Debug, Clone, Copy)]
pub struct Turret {
    pub owner: PlayerId,
    pub team: TeamId,
    pub health: i32,
    pub aim: Vec2,
    pub fire_interval_ticks: u64,
    pub last_fire_tick: u64,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct TeleportPad {
    pub linked: UtilityId,
    pub charge_ticks_remaining: u64,
}

impl TeleportPad {
    pub fn is_ready(&self) -> bool {
        self.charge_ticks_remaining == 0
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct DefenseLaser {
    pub owner: PlayerId,
    pub team: TeamId,
    pub rotation_speed_radians: f32,
    pub current_angle: f32,
    pub fire_interval_ticks: u64,
    pub last_fire_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupEffect {
    HealthRestore,
    AmmoRefill,
    SpeedBoost,
    DamageBoost,
    Shield,
    WeaponSwap,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Pickup {
    pub effect: PickupEffect,
    /// The workshop (if any) that produced this pickup, for respawn bookkeeping.
    pub workshop_source: Option<crate::common::ids::ObjectiveId>,
}

const TURRET_RANGE: f32 = 700.0;
const TURRET_DAMAGE: i32 = 8;
const TURRET_PROJECTILE_SPEED: f32 = 900.0;

const TELEPORT_RADIUS: f32 = 35.0;
const TELEPORT_COOLDOWN_TICKS: u64 = 120;

const LASER_DAMAGE_PER_TICK: i32 = 4;
const LASER_BEAM_DURATION_TICKS: u64 = 6;

/// Deadline-based re-arm lockout after a player steps through a pad,
/// following the same "absolute tick, not a countdown" idiom as
/// [`super::players::AwaitingRespawn`]/[`super::objectives::DroppedAt`].
#[derive(Component, Debug, Clone, Copy)]
pub struct TeleportCooldown {
    pub until_tick: u64,
}

struct PadSnapshot {
    position: Vec2,
    ready: bool,
    linked: UtilityId,
}

/// Cache of this tick's pad positions/readiness, written by
/// [`tick_teleport_pads`] and read by [`apply_teleports`] — splitting the
/// work this way means neither system needs to query `Transform` on both
/// pads and players at once, which Bevy's scheduler would reject as a
/// conflicting access.
#[derive(Resource, Default)]
pub struct TeleportPadPositions(std::collections::HashMap<UtilityId, PadSnapshot>);

/// Tick step 4 (§4.3 "advance utility cadences"): each turret aims at the
/// nearest living enemy within line of sight and range, firing a bullet
/// projectile at its configured cadence. Damage resolution happens later,
/// through the ordinary projectile/contact pipeline (step 6) — a turret's
/// shot is in every respect an ordinary bullet once it leaves the barrel.
#[allow(clippy::too_many_arguments)]
pub fn advance_turrets(
    mut commands: Commands,
    tick: Res<TickCounter>,
    tunables: Res<crate::common::tunables::Tunables>,
    spatial_query: SpatialQuery,
    allocators: Res<IdAllocators>,
    mut registry: ResMut<Registry>,
    mut turrets: Query<(&Transform, &mut Turret)>,
    alive: Query<(&Player, &PlayerMeta, &Transform, &Eliminated), Without<crate::entities::players::AwaitingRespawn>>,
) {
    let filter = crate::physics::filter_excluding([Layer::Player, Layer::Obstacle, Layer::DestructibleObstacle, Layer::World]);

    for (transform, mut turret) in &mut turrets {
        let origin = transform.translation.truncate();

        let target = alive
            .iter()
            .filter(|(_, meta, _, eliminated)| !eliminated.0 && (turret.team == crate::common::layers::FFA_TEAM || meta.team != turret.team))
            .map(|(_, _, t, _)| t.translation.truncate())
            .filter(|pos| origin.distance(*pos) <= TURRET_RANGE)
            .min_by(|a, b| origin.distance(*a).total_cmp(&origin.distance(*b)));

        let Some(target) = target else { continue };
        let dir = (target - origin).normalize_or_zero();
        if dir == Vec2::ZERO {
            continue;
        }
        turret.aim = dir;

        let dist = origin.distance(target);
        if crate::physics::raycast(&spatial_query, origin, dir, dist, &filter).is_some() {
            continue; // line of sight blocked
        }

        if tick.0 < turret.last_fire_tick + turret.fire_interval_ticks {
            continue;
        }
        turret.last_fire_tick = tick.0;

        let id = allocators.alloc_projectile();
        let entity = commands
            .spawn((
                ProjectileBundle {
                    projectile: Projectile(id),
                    owner: Owner { player: turret.owner, team: turret.team },
                    ordinance: Ordinance { kind: OrdinanceKind::Bullet, effects: crate::weapons::BulletEffects::empty(), damage: TURRET_DAMAGE },
                    lifetime: Lifetime(OrdinanceKind::Bullet.default_lifetime_ticks(tunables.tick_rate_hz)),
                    pierces: PiercesRemaining(0),
                    arm_timer: ArmTimer(OrdinanceKind::Bullet.arm_delay_ticks(tunables.tick_rate_hz)),
                },
                projectiles::physics_bundle(origin + dir * 20.0, dir * TURRET_PROJECTILE_SPEED),
            ))
            .id();
        registry.insert_projectile(id, entity);
    }
}

/// Tick step 4: ticks charge on every pad and publishes a snapshot for
/// [`apply_teleports`] to read.
pub fn tick_teleport_pads(mut pads: Query<(&UtilityEntity, &Transform, &mut TeleportPad)>, mut positions: ResMut<TeleportPadPositions>) {
    positions.0.clear();
    for (utility, transform, mut pad) in &mut pads {
        pad.charge_ticks_remaining = pad.charge_ticks_remaining.saturating_sub(1);
        positions.0.insert(utility.0, PadSnapshot { position: transform.translation.truncate(), ready: pad.is_ready(), linked: pad.linked });
    }
}

/// Tick step 4: teleports any player standing on a charged pad to its
/// linked partner, per §3's "teleport pad (linked pair, charging state)".
pub fn apply_teleports(
    mut commands: Commands,
    tick: Res<TickCounter>,
    positions: Res<TeleportPadPositions>,
    mut players: Query<
        (Entity, &mut Transform, &Eliminated, Option<&TeleportCooldown>),
        (With<Player>, Without<crate::entities::players::AwaitingRespawn>),
    >,
) {
    for (entity, mut transform, eliminated, cooldown) in &mut players {
        if eliminated.0 {
            continue;
        }
        if let Some(cooldown) = cooldown {
            if tick.0 < cooldown.until_tick {
                continue;
            }
            commands.entity(entity).remove::<TeleportCooldown>();
        }

        let here = transform.translation.truncate();
        if let Some(pad) = positions.0.values().find(|pad| pad.ready && here.distance(pad.position) <= TELEPORT_RADIUS) {
            if let Some(destination) = positions.0.get(&pad.linked) {
                transform.translation = destination.position.extend(transform.translation.z);
                commands.entity(entity).insert(TeleportCooldown { until_tick: tick.0 + TELEPORT_COOLDOWN_TICKS });
            }
        }
    }
}

/// Tick step 4: rotates each defense laser and, at its configured cadence,
/// fires a beam — damage resolution happens through the ordinary beam
/// pipeline (step 8, [`super::beams::update_beams`]), exactly as a turret's
/// shot is resolved through the ordinary projectile pipeline.
pub fn advance_defense_lasers(
    mut commands: Commands,
    tick: Res<TickCounter>,
    tunables: Res<crate::common::tunables::Tunables>,
    allocators: Res<IdAllocators>,
    mut registry: ResMut<Registry>,
    mut lasers: Query<(&Transform, &mut DefenseLaser)>,
) {
    let dt = tunables.tick_interval().as_secs_f32();

    for (transform, mut laser) in &mut lasers {
        laser.current_angle = (laser.current_angle + laser.rotation_speed_radians * dt).rem_euclid(std::f32::consts::TAU);

        if tick.0 < laser.last_fire_tick + laser.fire_interval_ticks {
            continue;
        }
        laser.last_fire_tick = tick.0;

        let origin = transform.translation.truncate();
        let aim = Vec2::new(laser.current_angle.cos(), laser.current_angle.sin());
        let id = allocators.alloc_beam();
        let entity = commands
            .spawn((
                Beam(id),
                BeamOwner { player: laser.owner, team: laser.team },
                BeamGeometry { origin, aim, effective_end: origin },
                BeamDamage { application: DamageApplication::DamageOverTime, damage_per_tick: LASER_DAMAGE_PER_TICK, pierces: false },
                BeamDuration(LASER_BEAM_DURATION_TICKS),
            ))
            .id();
        registry.insert_beam(id, entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teleport_pad_ready_only_at_zero_charge() {
        let pad = TeleportPad { linked: UtilityId::default_for_test(), charge_ticks_remaining: 0 };
        assert!(pad.is_ready());
        let pad = TeleportPad { charge_ticks_remaining: 1, ..pad };
        assert!(!pad.is_ready());
    }
}
