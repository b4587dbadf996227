//! Contact resolution (§4.7 step 6): drains `CollisionStart` and applies
//! damage, pierces, and despawns. Grounded on the teacher's
//! `plugins/projectiles/collision.rs` — per-bullet dedup via a `Local`
//! set, `CollisionLayers` membership checks instead of a team lookup per
//! contact.

use avian2d::prelude::*;
use bevy::prelude::*;
use std::collections::HashSet;

use crate::common::ids::IdAllocators;
use crate::common::layers::Layer;
use crate::entities::field_effects::{self, FieldEffectKind};
use crate::entities::obstacles::Destructible;
use crate::entities::players::{Eliminated, Health, Player, PlayerMeta};
use crate::entities::projectiles::{Owner, PiercesRemaining, Projectile};
use crate::engine::events::MatchEvents;
use crate::entities::PendingDespawn;
use crate::rules::RuleState;
use crate::session::messages::{EventCategory, GameEvent, PlayerKilled, ServerMessage};
use crate::status::{AttributeKey, ModOp, StatusEffects, StatusModifier};
use crate::weapons::{BulletEffects, OrdinanceKind};

/// Radius of the explosion/fragmentation field effect an `EXPLOSIVE`
/// projectile leaves behind on its terminal contact (§4.3: "explosive: spawn
/// explosion field-effect and destroy self").
const EXPLOSION_RADIUS: f32 = 120.0;

/// A net's root holds for long enough to matter but is not a permanent
/// status (§4.3: "net: attach slow/root status to first player hit").
const NET_ROOT_TICKS: u64 = 90;

fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

/// Spawns the explosion field effect left behind by an `EXPLOSIVE` projectile
/// on its terminal contact, whatever that contact was (player, destructible,
/// or world geometry).
fn spawn_explosion(
    commands: &mut Commands,
    allocators: &IdAllocators,
    registry: &mut crate::entities::registry::Registry,
    position: Vec2,
    owner_team: crate::common::layers::TeamId,
) {
    field_effects::spawn(commands, allocators, registry, FieldEffectKind::Explosion, position, EXPLOSION_RADIUS, 1, owner_team, 1.0, true);
}

/// Tick step 6: resolves every projectile/player and projectile/obstacle
/// contact recorded since the last tick. One entry point per bullet per
/// tick — `seen` guards against a bullet appearing twice in the same
/// `CollisionStart` batch (pierce + multi-contact in one step).
#[allow(clippy::too_many_arguments)]
pub fn resolve_contacts(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    q_layers: Query<&CollisionLayers>,
    mut q_projectiles: Query<(&Projectile, &Owner, &crate::entities::projectiles::Ordinance, &mut PiercesRemaining, &Transform)>,
    mut q_players: Query<(&Player, &PlayerMeta, &mut Health, &Eliminated, &mut StatusEffects)>,
    q_names: Query<&PlayerMeta>,
    mut registry: ResMut<crate::entities::registry::Registry>,
    allocators: Res<IdAllocators>,
    tick: Res<crate::common::tick::TickCounter>,
    mut q_destructibles: Query<&mut Destructible>,
    mut rules: ResMut<crate::rules::Rules>,
    mut events: ResMut<MatchEvents>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();
    for CollisionStart { collider1, collider2, .. } in started.read() {
        for (bullet_entity, other_entity) in [(*collider1, *collider2), (*collider2, *collider1)] {
            let Ok((_projectile, owner, ordinance, mut pierces, bullet_transform)) = q_projectiles.get_mut(bullet_entity) else {
                continue;
            };
            if seen.contains(&bullet_entity) {
                continue;
            }
            let Ok(other_layers) = q_layers.get(other_entity) else { continue };
            let bullet_position = bullet_transform.translation.truncate();

            if is_in_layer(other_layers, Layer::Player) {
                if let Ok((victim, victim_meta, mut health, eliminated, mut status_effects)) = q_players.get_mut(other_entity) {
                    if eliminated.0 || victim.0 == owner.player {
                        continue;
                    }
                    health.apply_damage(ordinance.damage);
                    seen.insert(bullet_entity);
                    if ordinance.kind == OrdinanceKind::Net {
                        status_effects.push(StatusModifier {
                            key: AttributeKey::MoveSpeed,
                            op: ModOp::Set,
                            magnitude: 0.0,
                            expiry_tick: tick.0 + NET_ROOT_TICKS,
                            source: "net",
                        });
                    }
                    if health.is_dead() {
                        if let RuleState::TeamDeathmatch(ref mut tdm) = rules.state {
                            tdm.record_kill(owner.team);
                        }
                        if let RuleState::Juggernaut(ref mut state) = rules.state {
                            *state.scores.entry(owner.team).or_insert(0) += crate::rules::juggernaut::JUGGERNAUT_KILL_SCORE;
                        }
                        if let RuleState::LoneWolf(ref mut wolf) = rules.state {
                            if wolf.wolf == Some(victim.0) {
                                wolf.on_hunter_killed_wolf();
                            }
                        }
                        let killer_name = registry.players(owner.player).and_then(|e| q_names.get(e).ok()).map(|m| m.display_name.clone());
                        events.push(ServerMessage::PlayerKilled(PlayerKilled {
                            victim_id: victim.0,
                            killer_id: Some(owner.player),
                            killer_name: killer_name.clone(),
                        }));
                        events.push(ServerMessage::GameEvent(GameEvent {
                            category: EventCategory::Kill,
                            message: format!("{} eliminated {}", killer_name.unwrap_or_else(|| "unknown".to_string()), victim_meta.display_name),
                            display_duration_secs: 4.0,
                        }));
                    }
                    if ordinance.effects.contains(BulletEffects::EXPLOSIVE) {
                        spawn_explosion(&mut commands, &allocators, &mut registry, bullet_position, owner.team);
                    }
                    if !ordinance.effects.contains(BulletEffects::PIERCING) || pierces.0 == 0 || ordinance.effects.contains(BulletEffects::EXPLOSIVE) {
                        commands.entity(bullet_entity).insert(PendingDespawn);
                    } else {
                        pierces.0 -= 1;
                    }
                    continue;
                }
            }

            if is_in_layer(other_layers, Layer::DestructibleObstacle) {
                if let Ok(mut destructible) = q_destructibles.get_mut(other_entity) {
                    if destructible.active {
                        destructible.apply_damage(ordinance.damage);
                        if !destructible.active {
                            commands.entity(other_entity).insert(PendingDespawn);
                        }
                    }
                    seen.insert(bullet_entity);
                    if ordinance.effects.contains(BulletEffects::EXPLOSIVE) {
                        spawn_explosion(&mut commands, &allocators, &mut registry, bullet_position, owner.team);
                    }
                    if ordinance.kind.terminates_on_first_contact() {
                        commands.entity(bullet_entity).insert(PendingDespawn);
                    }
                    continue;
                }
            }

            if is_in_layer(other_layers, Layer::World) || is_in_layer(other_layers, Layer::Obstacle) {
                seen.insert(bullet_entity);
                if ordinance.effects.contains(BulletEffects::EXPLOSIVE) {
                    spawn_explosion(&mut commands, &allocators, &mut registry, bullet_position, owner.team);
                }
                if ordinance.kind.terminates_on_first_contact() || !ordinance.effects.contains(BulletEffects::PIERCING) {
                    commands.entity(bullet_entity).insert(PendingDespawn);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_membership_check_matches_exact_layer() {
        let layers = CollisionLayers::new(Layer::Projectile, [Layer::Player]);
        assert!(is_in_layer(&layers, Layer::Projectile));
        assert!(!is_in_layer(&layers, Layer::Player));
    }
}
