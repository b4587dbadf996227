//! Live per-mode dispatch (§4.5), tick step 9 continued: wires the pure
//! state machines in [`super::koth`], [`super::ctf`], [`super::juggernaut`],
//! [`super::lone_wolf`], and [`super::zombies`] into the running match —
//! zone membership, flag pickup/capture, juggernaut re-selection, wolf
//! growth, and zombie wave spawning.
//!
//! Runs immediately after [`super::rule_step`] in the same
//! [`crate::engine::tick::TickStep::RuleStep`] set, so it can use
//! `Added<AwaitingRespawn>` as the "this player died on this exact tick"
//! signal — `rule_step` is what attaches that component, on the same
//! tick, to everyone whose health reached zero.

use bevy::prelude::*;

use crate::ai::{AiState, BehaviorProfile};
use crate::common::ids::IdAllocators;
use crate::common::layers::TeamId;
use crate::common::rng::MatchSeed;
use crate::common::tick::TickCounter;
use crate::common::tunables::Tunables;
use crate::entities::objectives::{DroppedAt, Flag, FlagState, KothZone};
use crate::entities::players::{
    physics_bundle, AwaitingRespawn, Eliminated, Health, IsAi, Lives, Player, PlayerBundle, PlayerMeta, Scoreboard,
};
use crate::entities::registry::Registry;
use crate::status::{AttributeKey, ModOp, StatusEffects, StatusModifier};
use crate::weapons::{weapon_preset, WeaponKind, WeaponState};

use super::{ctf, juggernaut, koth, zombies, RuleState, Rules};

const PICKUP_RADIUS: f32 = 40.0;
const CAPTURE_RADIUS: f32 = 50.0;
const FLAG_RETURN_TICKS: u64 = 60 * 30;

const HUMAN_TEAM: TeamId = 1;
const ZOMBIE_TEAM: TeamId = 2;

type AlivePlayer<'w> = (Entity, &'w Player, &'w PlayerMeta, &'w Transform, &'w Eliminated);

#[allow(clippy::too_many_arguments)]
pub fn mode_dispatch(
    mut commands: Commands,
    tick: Res<TickCounter>,
    tunables: Res<Tunables>,
    mut rules: ResMut<Rules>,
    mut koth_zones: Query<&mut KothZone>,
    mut flags: Query<(Entity, &mut Flag, Option<&DroppedAt>)>,
    alive: Query<AlivePlayer, Without<AwaitingRespawn>>,
    awaiting_ids: Query<&Player, With<AwaitingRespawn>>,
    newly_eliminated: Query<(&Player, &PlayerMeta, &IsAi), Added<AwaitingRespawn>>,
    mut scoreboards: Query<&mut Scoreboard>,
    mut status_effects: Query<&mut StatusEffects>,
    allocators: Res<IdAllocators>,
    mut registry: ResMut<Registry>,
    seed: Res<MatchSeed>,
) {
    let dt = tunables.tick_interval().as_secs_f32();

    if let RuleState::KingOfTheHill(ref mut state) = rules.state {
        dispatch_koth(&mut koth_zones, &alive, state, dt);
    }

    match rules.state {
        RuleState::CaptureTheFlag(ref mut ctf_state) => {
            dispatch_ctf(&mut commands, &tick, &tunables, &mut flags, &alive, &awaiting_ids, &mut scoreboards, ctf_state);
        }
        RuleState::Oddball(ref mut scores) => {
            dispatch_oddball(&mut commands, &tick, &mut flags, &alive, &awaiting_ids, scores, dt);
        }
        _ => {}
    }

    if let RuleState::Juggernaut(ref mut state) = rules.state {
        dispatch_juggernaut(&alive, &newly_eliminated, state);
    }

    if let RuleState::LoneWolf(ref mut state) = rules.state {
        dispatch_lone_wolf(&alive, &newly_eliminated, &mut status_effects, &registry, tick.0, state);
    }

    if let RuleState::ZombieDefense(ref mut defense) = rules.state {
        dispatch_zombies(&mut commands, &newly_eliminated, &allocators, &mut registry, seed.0, &tunables, defense);
    }
}

fn dispatch_koth(zones: &mut Query<&mut KothZone>, alive: &Query<AlivePlayer, Without<AwaitingRespawn>>, state: &mut super::KothState, dt: f32) {
    for mut zone in zones {
        let mut teams_present: Vec<TeamId> = alive
            .iter()
            .filter(|(_, _, _, transform, eliminated)| !eliminated.0 && transform.translation.truncate().distance(zone.position) <= zone.radius)
            .map(|(_, _, meta, ..)| meta.team)
            .collect();
        teams_present.sort_unstable();
        teams_present.dedup();

        let (next_state, next_progress) = koth::advance_zone(zone.state, zone.progress, &teams_present, dt, zone.capture_time_secs);
        zone.state = next_state;
        zone.progress = next_progress;

        if let Some(team) = koth::score_accrual(zone.state) {
            *state.scores.entry(team).or_insert(0) += 1;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn dispatch_ctf(
    commands: &mut Commands,
    tick: &TickCounter,
    tunables: &Tunables,
    flags: &mut Query<(Entity, &mut Flag, Option<&DroppedAt>)>,
    alive: &Query<AlivePlayer, Without<AwaitingRespawn>>,
    awaiting_ids: &Query<&Player, With<AwaitingRespawn>>,
    scoreboards: &mut Query<&mut Scoreboard>,
    ctf_state: &mut super::CtfState,
) {
    for (flag_entity, mut flag, dropped_at) in flags {
        match flag.state {
            FlagState::Home | FlagState::Dropped => {
                if let Some(dropped_at) = dropped_at {
                    if tick.0 >= dropped_at.return_deadline_tick {
                        flag.state = FlagState::Home;
                        flag.position = flag.home_position;
                        commands.entity(flag_entity).remove::<DroppedAt>();
                        continue;
                    }
                }
                let toucher = alive
                    .iter()
                    .find(|(_, _, meta, transform, eliminated)| {
                        !eliminated.0 && meta.team != flag.owner_team && transform.translation.truncate().distance(flag.position) <= PICKUP_RADIUS
                    })
                    .map(|(_, player, meta, ..)| (player.0, meta.team));
                if let Some((pid, toucher_team)) = toucher {
                    if let Some(new_state) = ctf::try_pickup(flag.state, flag.owner_team, toucher_team, pid) {
                        flag.state = new_state;
                        commands.entity(flag_entity).remove::<DroppedAt>();
                    }
                }
            }
            FlagState::Carried { by } => {
                if let Some((carrier_entity, _, meta, transform, _)) = alive.iter().find(|(_, player, ..)| player.0 == by) {
                    flag.position = transform.translation.truncate();
                    let carrier_team = meta.team;
                    let own_home = crate::entities::players::spawn_point_for_team(carrier_team, tunables);
                    if carrier_team != flag.owner_team
                        && flag.position.distance(own_home) <= CAPTURE_RADIUS
                        && ctf::try_capture(flag.state, carrier_team, true, false)
                    {
                        *ctf_state.captures.entry(carrier_team).or_insert(0) += 1;
                        flag.state = FlagState::Home;
                        flag.position = flag.home_position;
                        flag.capture_count += 1;
                        if let Ok(mut scoreboard) = scoreboards.get_mut(carrier_entity) {
                            scoreboard.captures += 1;
                        }
                    }
                } else if awaiting_ids.iter().any(|p| p.0 == by) {
                    if let Some(new_state) = ctf::on_carrier_death(flag.state, by) {
                        flag.state = new_state;
                        commands.entity(flag_entity).insert(DroppedAt { return_deadline_tick: tick.0 + FLAG_RETURN_TICKS });
                    }
                } else {
                    // §7 rule-state inconsistency: carrier no longer exists at all.
                    flag.state = FlagState::Home;
                    flag.position = flag.home_position;
                    log::warn!("ctf flag carried by missing player {by}; returned home");
                }
            }
        }
    }
}

fn dispatch_oddball(
    commands: &mut Commands,
    tick: &TickCounter,
    flags: &mut Query<(Entity, &mut Flag, Option<&DroppedAt>)>,
    alive: &Query<AlivePlayer, Without<AwaitingRespawn>>,
    awaiting_ids: &Query<&Player, With<AwaitingRespawn>>,
    scores: &mut ctf::OddballScores,
    dt: f32,
) {
    for (flag_entity, mut flag, dropped_at) in flags {
        match flag.state {
            FlagState::Home | FlagState::Dropped => {
                if let Some(dropped_at) = dropped_at {
                    if tick.0 >= dropped_at.return_deadline_tick {
                        flag.state = FlagState::Home;
                        flag.position = flag.home_position;
                        commands.entity(flag_entity).remove::<DroppedAt>();
                        continue;
                    }
                }
                let toucher = alive
                    .iter()
                    .find(|(_, _, _, transform, eliminated)| !eliminated.0 && transform.translation.truncate().distance(flag.position) <= PICKUP_RADIUS)
                    .map(|(_, player, ..)| player.0);
                if let Some(pid) = toucher {
                    flag.state = FlagState::Carried { by: pid };
                    commands.entity(flag_entity).remove::<DroppedAt>();
                }
            }
            FlagState::Carried { by } => {
                if let Some((_, _, meta, transform, _)) = alive.iter().find(|(_, player, ..)| player.0 == by) {
                    flag.position = transform.translation.truncate();
                    scores.accrue(meta.team, dt);
                } else if awaiting_ids.iter().any(|p| p.0 == by) {
                    flag.state = FlagState::Dropped;
                    commands.entity(flag_entity).insert(DroppedAt { return_deadline_tick: tick.0 + FLAG_RETURN_TICKS });
                } else {
                    flag.state = FlagState::Home;
                    flag.position = flag.home_position;
                }
            }
        }
    }
}

fn dispatch_juggernaut(
    alive: &Query<AlivePlayer, Without<AwaitingRespawn>>,
    newly_eliminated: &Query<(&Player, &PlayerMeta, &IsAi), Added<AwaitingRespawn>>,
    state: &mut super::JuggernautState,
) {
    for (player, meta, _is_ai) in newly_eliminated {
        if state.current.get(&meta.team) == Some(&player.0) {
            let roster: Vec<_> = alive.iter().filter(|(_, _, m, ..)| m.team == meta.team).map(|(_, p, ..)| p.0).collect();
            if let Some(next) = juggernaut::select_next_juggernaut(&roster, |_| true, Some(player.0)) {
                state.current.insert(meta.team, next);
            } else {
                state.current.remove(&meta.team);
            }
        }
    }
    // Every team with at least one living player has a designated juggernaut.
    let mut seen_teams: Vec<TeamId> = Vec::new();
    for (_, player, meta, ..) in alive {
        if seen_teams.contains(&meta.team) {
            continue;
        }
        seen_teams.push(meta.team);
        state.current.entry(meta.team).or_insert(player.0);
    }
}

fn dispatch_lone_wolf(
    alive: &Query<AlivePlayer, Without<AwaitingRespawn>>,
    newly_eliminated: &Query<(&Player, &PlayerMeta, &IsAi), Added<AwaitingRespawn>>,
    status_effects: &mut Query<&mut StatusEffects>,
    registry: &Registry,
    now_tick: u64,
    state: &mut super::lone_wolf::LoneWolf,
) {
    if state.wolf.is_none() {
        state.wolf = alive.iter().map(|(_, player, ..)| player.0).min_by_key(|id| id.get());
    }

    for (player, _meta, _is_ai) in newly_eliminated {
        if state.wolf == Some(player.0) {
            state.on_wolf_death();
        }
    }

    let curve = super::lone_wolf::GrowthCurve::default();
    let multiplier = state.current_multiplier(&curve);
    if let Some(wolf_id) = state.wolf {
        if let Some(entity) = registry.players(wolf_id) {
            if let Ok(mut effects) = status_effects.get_mut(entity) {
                let expiry = now_tick + 2;
                effects.push(StatusModifier { key: AttributeKey::MoveSpeed, op: ModOp::Multiply, magnitude: multiplier, expiry_tick: expiry, source: "lone_wolf_growth" });
                effects.push(StatusModifier { key: AttributeKey::DamageMult, op: ModOp::Multiply, magnitude: multiplier, expiry_tick: expiry, source: "lone_wolf_growth" });
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn dispatch_zombies(
    commands: &mut Commands,
    newly_eliminated: &Query<(&Player, &PlayerMeta, &IsAi), Added<AwaitingRespawn>>,
    allocators: &IdAllocators,
    registry: &mut Registry,
    match_seed: u64,
    tunables: &Tunables,
    defense: &mut zombies::ZombieDefense,
) {
    for (_player, _meta, is_ai) in newly_eliminated {
        if is_ai.0 {
            defense.on_zombie_killed();
        }
    }

    let curve = zombies::WaveCurve::default();
    if defense.advance_rest(&curve) {
        defense.start_wave(&curve);
        spawn_zombie_wave(commands, allocators, registry, defense.zombies_alive, match_seed, defense.wave_number, tunables);
    }
}

fn spawn_zombie_wave(commands: &mut Commands, allocators: &IdAllocators, registry: &mut Registry, count: u32, match_seed: u64, wave_number: u32, tunables: &Tunables) {
    let def = weapon_preset(WeaponKind::Rifle);
    for i in 0..count {
        let id = allocators.alloc_player();
        let angle = std::f32::consts::TAU * i as f32 / count.max(1) as f32;
        let radius = tunables.world_width.min(tunables.world_height) * 0.48;
        let spawn = Vec2::new(angle.cos(), angle.sin()) * radius;

        let entity = commands
            .spawn((
                PlayerBundle {
                    player: Player(id),
                    meta: PlayerMeta { display_name: format!("zombie-{wave_number}-{i}"), team: ZOMBIE_TEAM },
                    health: Health::full(60),
                    lives: Lives(None),
                    eliminated: Default::default(),
                    intent: Default::default(),
                    scoreboard: Scoreboard::default(),
                    is_ai: IsAi(true),
                    weapon: WeaponState::new(def),
                    status: StatusEffects::default(),
                },
                AiState::new(id, match_seed, BehaviorProfile::zombie(), 1),
                physics_bundle(spawn),
            ))
            .id();
        registry.insert_player(id, entity);
    }
}

/// Human players in zombie-defense matches share [`HUMAN_TEAM`]; callers
/// joining a zombie-defense match should pass this team regardless of the
/// client's requested team number.
pub fn human_team() -> TeamId {
    HUMAN_TEAM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_and_zombie_teams_are_distinct() {
        assert_ne!(HUMAN_TEAM, ZOMBIE_TEAM);
    }
}
