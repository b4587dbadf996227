//! Tick steps 3-4 (§4.7): ingest of human/AI intent into physics, then
//! weapon fire/reload resolution and projectile spawning. These are the
//! systems that wire the pure functions in `ai`/`weapons`/`status` into
//! the `FixedUpdate` schedule `engine::tick` orders.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::ai::{self, AiCtx, AiState};
use crate::common::ids::PlayerId;
use crate::common::tick::TickCounter;
use crate::common::tunables::Tunables;
use crate::entities::players::{Eliminated, Health, Player, PlayerIntent, PlayerMeta};
use crate::entities::projectiles::{self, ArmTimer, Lifetime, Ordinance, Owner, PiercesRemaining, Projectile, ProjectileBundle};
use crate::entities::registry::Registry;
use crate::common::ids::IdAllocators;
use crate::common::rng::MatchSeed;
use crate::session::messages::PlayerInput;
use crate::status::{self, Attributes, StatusEffects};
use crate::weapons::{self, accuracy_jitter_radians, weapon_preset, WeaponState};
use rand::Rng;

/// Drained from every connected player's mailbox once per tick (§4.7 step
/// 3), inserted by [`super::MatchEngine::run_one_tick`] before the
/// schedule runs. AI players never appear here — they're decided inline
/// by [`ingest_inputs`] instead.
#[derive(Resource, Default)]
pub struct PendingInputs(pub Vec<(PlayerId, PlayerInput)>);

struct PlayerSnapshot {
    id: PlayerId,
    team: crate::common::layers::TeamId,
    position: Vec2,
    health_fraction: f32,
}

/// Tick step 3: applies this tick's input (human, via [`PendingInputs`];
/// AI, via [`ai::decide`]) to [`PlayerIntent`], then moves/rotates each
/// live player's physics body. Move speed is the *effective* attribute
/// (status mods composed fresh every tick, never cached on the body) per
/// §4.4's explicit invariant.
#[allow(clippy::too_many_arguments)]
pub fn ingest_inputs(
    pending: Res<PendingInputs>,
    tick: Res<TickCounter>,
    spatial_query: SpatialQuery,
    mut query: Query<(
        Entity,
        &Player,
        &PlayerMeta,
        &Health,
        &Eliminated,
        &mut PlayerIntent,
        &mut Transform,
        &mut LinearVelocity,
        &StatusEffects,
        Option<&mut AiState>,
    )>,
) {
    let snapshot: Vec<PlayerSnapshot> = query
        .iter()
        .filter(|(.., health, eliminated, ..)| !eliminated.0 && health.hp > 0)
        .map(|(_, player, meta, health, _, _, transform, ..)| PlayerSnapshot {
            id: player.0,
            team: meta.team,
            position: transform.translation.truncate(),
            health_fraction: health.hp as f32 / health.max_hp.max(1) as f32,
        })
        .collect();

    for (entity, player, _meta, health, eliminated, mut intent, mut transform, mut velocity, status_effects, ai_state) in &mut query {
        if eliminated.0 || health.hp <= 0 {
            *velocity = LinearVelocity::ZERO;
            continue;
        }

        let input = if let Some(ai_state) = ai_state {
            if ai_state.should_decide(tick.0) {
                let ctx = nearest_enemy_context(player.0, &snapshot, transform.translation.truncate(), &spatial_query, entity);
                ai::decide(ai_state, &ctx)
            } else {
                ai_state.last_decision
            }
        } else {
            pending.0.iter().find(|(id, _)| *id == player.0).map(|(_, input)| *input).unwrap_or_default()
        };

        *intent = PlayerIntent {
            move_dir: Vec2::new(input.move_x, input.move_y),
            aim_world: input.world,
            fire: input.fire,
            alt_fire: input.alt_fire,
            reload: input.reload,
        };

        let base = Attributes::default();
        let effective = status::effective(base, &status_effects.mods);
        let move_dir = intent.move_dir.clamp_length_max(1.0);
        *velocity = LinearVelocity(move_dir * effective.move_speed);

        let aim_dir = (intent.aim_world - transform.translation.truncate()).normalize_or_zero();
        if aim_dir != Vec2::ZERO {
            transform.rotation = Quat::from_rotation_z(aim_dir.y.atan2(aim_dir.x));
        }
    }
}

fn nearest_enemy_context(
    self_id: PlayerId,
    snapshot: &[PlayerSnapshot],
    self_position: Vec2,
    spatial_query: &SpatialQuery,
    self_entity: Entity,
) -> AiCtx {
    let self_team = snapshot.iter().find(|p| p.id == self_id).map(|p| p.team).unwrap_or(0);
    let self_health_fraction = snapshot.iter().find(|p| p.id == self_id).map(|p| p.health_fraction).unwrap_or(1.0);

    let nearest_enemy = snapshot
        .iter()
        .filter(|p| p.id != self_id && (p.team != self_team || self_team == 0))
        .map(|p| (p.position, self_position.distance(p.position)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let has_line_of_sight_to_nearest_enemy = nearest_enemy
        .map(|(pos, dist)| {
            let filter = SpatialQueryFilter::default().with_excluded_entities([self_entity]);
            let dir = (pos - self_position).normalize_or_zero();
            if dir == Vec2::ZERO {
                return true;
            }
            crate::physics::raycast(spatial_query, self_position, dir, dist, &filter).is_none()
        })
        .unwrap_or(false);

    AiCtx { self_position, self_team, self_health_fraction, nearest_enemy, has_line_of_sight_to_nearest_enemy, objective_direction: None }
}

/// Tick step 4: resolves reload starts/completions and weapon firings
/// (spawning projectiles), per §4.3's exact fire/reload preconditions.
pub fn pre_physics_actions(
    mut commands: Commands,
    tick: Res<TickCounter>,
    tunables: Res<Tunables>,
    seed: Res<MatchSeed>,
    mut registry: ResMut<Registry>,
    allocators: Res<IdAllocators>,
    mut query: Query<(&Player, &PlayerMeta, &Transform, &PlayerIntent, &mut WeaponState, &StatusEffects)>,
) {
    for (player, meta, transform, intent, mut weapon, status_effects) in &mut query {
        let def = weapon_preset(weapon.kind);

        if weapon.complete_reload_if_due(def, tick.0) {
            log::debug!("player {} reload complete", player.0);
        }

        if intent.reload {
            weapon.start_reload(def, tick.0);
        }

        if !intent.fire {
            continue;
        }

        let effective = status::effective(Attributes::default(), &status_effects.mods);
        let def = weapons::WeaponDef { fire_rate_hz: def.fire_rate_hz * effective.fire_rate_mult, ..def.clone() };
        let def = &def;

        if !weapon.can_fire(def, tick.0, tunables.tick_rate_hz) {
            continue;
        }
        weapon.consume_shot(tick.0);

        let origin = transform.translation.truncate();
        let base_aim = (intent.aim_world - origin).normalize_or_zero();
        if base_aim == Vec2::ZERO {
            continue;
        }

        let mut rng = crate::common::rng::stream_rng(seed.0, player.0.get() ^ tick.0);
        let shots = def.burst_count.max(1);
        for shot in 0..shots {
            let spread = if shots > 1 { (shot as f32 / (shots - 1).max(1) as f32 - 0.5) * def.burst_spread_radians } else { 0.0 };
            let jitter = accuracy_jitter_radians(def.accuracy, rng.gen_range(0.0..1.0));
            let angle = base_aim.y.atan2(base_aim.x) + spread + jitter;
            let dir = Vec2::new(angle.cos(), angle.sin());
            let velocity = dir * def.projectile_speed;
            let damage = (def.base_damage as f32 * effective.damage_mult).round() as i32;

            let id = allocators.alloc_projectile();
            let entity = commands
                .spawn((
                    ProjectileBundle {
                        projectile: Projectile(id),
                        owner: Owner { player: player.0, team: meta.team },
                        ordinance: Ordinance { kind: def.ordinance, effects: def.effects, damage },
                        lifetime: Lifetime(def.ordinance.default_lifetime_ticks(tunables.tick_rate_hz)),
                        pierces: PiercesRemaining(if def.effects.contains(weapons::BulletEffects::PIERCING) { 2 } else { 0 }),
                        arm_timer: ArmTimer(def.ordinance.arm_delay_ticks(tunables.tick_rate_hz)),
                    },
                    projectiles::physics_bundle(origin + dir * (crate::entities::players::PLAYER_RADIUS + 2.0), velocity),
                ))
                .id();
            registry.insert_projectile(id, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_inputs_defaults_empty() {
        let pending = PendingInputs::default();
        assert!(pending.0.is_empty());
    }
}
