//! Field-effect entities (§3, §4.7 step 7).
//!
//! Each kind applies a typed per-tick contract to everything inside its
//! radius; implemented as a `match` over [`FieldEffectKind`] in the tick's
//! AoE step rather than a trait per kind, consistent with the ordinance
//! design (§4.3, §9).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::ids::{FieldEffectId, IdAllocators};
use crate::common::layers::{Layer, TeamId};
use crate::entities::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEffectKind {
    Explosion,
    Fire,
    Electric,
    Freeze,
    Fragmentation,
    Poison,
    HealZone,
    Smoke,
    Slow,
    Shield,
    Gravity,
    VisionReveal,
    SpeedBoost,
    ProximityMine,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct FieldEffect(pub FieldEffectId);

#[derive(Component, Debug, Clone, Copy)]
pub struct FieldEffectTag(pub FieldEffectKind);

#[derive(Component, Debug, Clone, Copy)]
pub struct FieldEffectGeometry {
    pub position: Vec2,
    pub radius: f32,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct FieldEffectLifecycle {
    pub duration_ticks: u64,
    pub elapsed_ticks: u64,
    pub owner_team: TeamId,
    /// Mines/triggered effects start disarmed.
    pub armed: bool,
}

impl FieldEffectLifecycle {
    pub fn advance(&mut self) {
        self.elapsed_ticks += 1;
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed_ticks >= self.duration_ticks
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct FieldEffectStrength(pub f32);

#[derive(Bundle)]
pub struct FieldEffectBundle {
    pub effect: FieldEffect,
    pub tag: FieldEffectTag,
    pub geometry: FieldEffectGeometry,
    pub lifecycle: FieldEffectLifecycle,
    pub strength: FieldEffectStrength,
}

/// Spawns one field effect and registers it, per the `allocate -> spawn ->
/// registry.insert_*` shape every other entity kind spawns through (e.g.
/// [`super::utility::advance_turrets`]'s projectile spawn). Used for
/// ordinance terminal effects (explosions, armed mines) rather than a
/// bespoke damage path at the contact/lifetime site.
pub fn spawn(
    commands: &mut Commands,
    allocators: &IdAllocators,
    registry: &mut Registry,
    kind: FieldEffectKind,
    position: Vec2,
    radius: f32,
    duration_ticks: u64,
    owner_team: TeamId,
    strength: f32,
    armed: bool,
) -> FieldEffectId {
    let id = allocators.alloc_field_effect();
    let entity = commands
        .spawn(FieldEffectBundle {
            effect: FieldEffect(id),
            tag: FieldEffectTag(kind),
            geometry: FieldEffectGeometry { position, radius },
            lifecycle: FieldEffectLifecycle { duration_ticks, elapsed_ticks: 0, owner_team, armed },
            strength: FieldEffectStrength(strength),
        })
        .id();
    registry.insert_field_effect(id, entity);
    id
}

/// Kinds that detonate once on first overlap rather than applying their
/// contract for their full duration (a proximity mine's "sensor" behavior,
/// §4.3: "mine: arms after short delay and becomes a sensor field-effect").
fn triggers_once(kind: FieldEffectKind) -> bool {
    matches!(kind, FieldEffectKind::ProximityMine)
}

/// Per-kind tick contract (§4.7 step 7): each variant either damages or
/// buffs everything currently inside its radius. Expressed as a `match`
/// rather than a trait per kind, matching the ordinance design.
fn apply_kind(kind: FieldEffectKind, strength: f32, health: Option<&mut crate::entities::players::Health>, effects: &mut crate::status::StatusEffects, expiry_tick: u64) {
    use crate::status::{AttributeKey, ModOp, StatusModifier};

    let push = |effects: &mut crate::status::StatusEffects, key, op, magnitude, source| {
        effects.push(StatusModifier { key, op, magnitude, expiry_tick, source });
    };

    match kind {
        FieldEffectKind::Explosion | FieldEffectKind::Fragmentation => {
            if let Some(health) = health {
                health.apply_damage((10.0 * strength).round() as i32);
            }
        }
        FieldEffectKind::Fire | FieldEffectKind::Poison => {
            if let Some(health) = health {
                health.apply_damage((2.0 * strength).round() as i32);
            }
        }
        FieldEffectKind::Electric => {
            if let Some(health) = health {
                health.apply_damage((3.0 * strength).round() as i32);
            }
        }
        FieldEffectKind::HealZone => {
            if let Some(health) = health {
                health.hp = (health.hp + (6.0 * strength).round() as i32).min(health.max_hp);
            }
        }
        FieldEffectKind::Freeze | FieldEffectKind::Slow => {
            push(effects, AttributeKey::MoveSpeed, ModOp::Multiply, 1.0 - (0.4 * strength).min(0.9), "field_effect");
        }
        FieldEffectKind::SpeedBoost => {
            push(effects, AttributeKey::MoveSpeed, ModOp::Multiply, 1.0 + 0.3 * strength, "field_effect");
        }
        FieldEffectKind::Shield => {
            push(effects, AttributeKey::Invulnerability, ModOp::Set, 1.0, "field_effect");
        }
        FieldEffectKind::VisionReveal => {
            push(effects, AttributeKey::VisionRange, ModOp::Add, 400.0 * strength, "field_effect");
        }
        FieldEffectKind::ProximityMine => {
            if let Some(health) = health {
                health.apply_damage((12.0 * strength).round() as i32);
            }
        }
        FieldEffectKind::Gravity | FieldEffectKind::Smoke => {}
    }
}

/// Tick step 7: applies every armed, unexpired field effect's per-kind
/// contract to players inside its radius, then advances lifecycles and
/// marks expired effects for despawn. A [`triggers_once`] kind (proximity
/// mines) is force-expired the instant it hits something instead of
/// lingering for its full configured duration.
pub fn apply_field_effects(
    mut commands: Commands,
    spatial_query: SpatialQuery,
    tick: Res<crate::common::tick::TickCounter>,
    mut effects_q: Query<(Entity, &FieldEffectTag, &FieldEffectGeometry, &mut FieldEffectLifecycle, &FieldEffectStrength)>,
    mut players: Query<(&mut crate::entities::players::Health, &mut crate::status::StatusEffects)>,
) {
    let filter = crate::physics::filter_excluding([Layer::Player]);
    for (entity, tag, geometry, mut lifecycle, strength) in &mut effects_q {
        let mut triggered = false;
        if lifecycle.armed {
            for hit in crate::physics::overlap_circle(&spatial_query, geometry.position, geometry.radius, &filter) {
                if let Ok((mut health, mut status_effects)) = players.get_mut(hit) {
                    apply_kind(tag.0, strength.0, Some(&mut *health), &mut *status_effects, tick.0 + 1);
                    triggered = true;
                }
            }
        }
        if triggered && triggers_once(tag.0) {
            commands.entity(entity).insert(crate::entities::PendingDespawn);
            continue;
        }
        lifecycle.advance();
        if lifecycle.is_expired() {
            commands.entity(entity).insert(crate::entities::PendingDespawn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_once_elapsed_reaches_duration() {
        let mut lifecycle = FieldEffectLifecycle { duration_ticks: 3, elapsed_ticks: 0, owner_team: 1, armed: true };
        for _ in 0..3 {
            assert!(!lifecycle.is_expired());
            lifecycle.advance();
        }
        assert!(lifecycle.is_expired());
    }
}
