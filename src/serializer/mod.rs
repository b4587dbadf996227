//! State serializer (Component H, §4.8).
//!
//! Pure functions over the match's ECS `World` producing the two
//! client-facing shapes. Entity arrays are built in explicit id order (a
//! sort, never hashmap iteration order) to satisfy the ordering guarantee
//! of §5/§8. Only the stable `*Id` newtypes are serialized — `Entity`
//! values never cross the wire.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::ids::{BeamId, FieldEffectId, ObjectiveId, ObstacleId, PlayerId, ProjectileId, UtilityId};
use crate::common::layers::TeamId;
use crate::entities::objectives::{FlagState, KothZoneState};
use crate::entities::players::{Health, Lives, Player, PlayerMeta, Scoreboard};
use crate::entities::projectiles::{Ordinance, Owner, Projectile};
use crate::entities::{beams, field_effects, objectives, obstacles};
use crate::rules::{Phase, Rules};
use crate::weapons::WeaponState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TeamSpawnArea {
    pub team: TeamId,
    pub center: Vec2,
    pub half_extent: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainMeta {
    pub biome: String,
    pub seed: u64,
}

/// Sent once per session (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialState {
    pub world_width: f32,
    pub world_height: f32,
    pub teams: Vec<TeamId>,
    pub spawn_areas: Vec<TeamSpawnArea>,
    pub terrain: TerrainMeta,
    pub mode: String,
    pub assigned_player_id: Option<PlayerId>,
    pub is_spectator: bool,
    pub obstacles: Vec<ObstacleRecord>,
    pub flag_homes: Vec<(ObjectiveId, Vec2)>,
    pub zone_positions: Vec<(ObjectiveId, Vec2, f32)>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleRecord {
    pub id: ObstacleId,
    pub shape: obstacles::ObstacleShape,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub team: TeamId,
    pub position: Vec2,
    pub rotation: f32,
    pub health: i32,
    pub max_health: i32,
    pub lives_remaining: Option<u32>,
    pub kills: u32,
    pub deaths: u32,
    pub weapon: crate::weapons::preset::WeaponKind,
    pub magazine: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectileRecord {
    pub id: ProjectileId,
    pub position: Vec2,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DestructibleObstacleRecord {
    pub id: ObstacleId,
    pub position: Vec2,
    pub health: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeamRecord {
    pub id: BeamId,
    pub start: Vec2,
    pub end: Vec2,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldEffectRecord {
    pub id: FieldEffectId,
    pub kind: field_effects::FieldEffectKind,
    pub position: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UtilityRecord {
    pub id: UtilityId,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlagRecord {
    pub id: ObjectiveId,
    pub position: Vec2,
    pub state: FlagState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KothZoneRecord {
    pub id: ObjectiveId,
    pub state: KothZoneState,
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSnapshot {
    pub mode: String,
    pub round: u32,
    pub phase: Phase,
    pub round_remaining_ticks: u64,
    pub rest_remaining_ticks: u64,
    pub scores: Vec<(TeamId, u32)>,
}

/// Sent every broadcast tick (§4.8), type-tagged `gameState` at the
/// [`crate::session::messages::ServerMessage`] layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub server_tick: u64,
    pub rules: RuleSnapshot,
    pub players: Vec<PlayerRecord>,
    pub projectiles: Vec<ProjectileRecord>,
    pub destructible_obstacles: Vec<DestructibleObstacleRecord>,
    pub beams: Vec<BeamRecord>,
    pub field_effects: Vec<FieldEffectRecord>,
    pub utility: Vec<UtilityRecord>,
    pub flags: Vec<FlagRecord>,
    pub koth_zones: Vec<KothZoneRecord>,
}

/// Sent once per session on connect (§4.8 "Initial state"). Gathers the
/// static parts of the world `seeding::seed_match` produced plus whichever
/// id the caller is joining as — `None` for a spectator.
pub fn initial_state(world: &mut World, assigned_player_id: Option<PlayerId>, is_spectator: bool) -> InitialState {
    let tunables = world.resource::<crate::common::tunables::Tunables>().clone();
    let seed = world.resource::<crate::common::rng::MatchSeed>().0;
    let mode = world.resource::<Rules>().mode_name().to_string();

    let teams: Vec<TeamId> = (1..=tunables.max_teams).collect();
    let spawn_areas = teams
        .iter()
        .map(|&team| TeamSpawnArea {
            team,
            center: crate::entities::players::spawn_point_for_team(team, &tunables),
            half_extent: Vec2::splat(crate::entities::players::PLAYER_RADIUS * 2.0),
        })
        .collect();

    let mut obstacles: Vec<ObstacleRecord> = world
        .query::<(&obstacles::Obstacle, &obstacles::ObstacleShapeTag, &Transform)>()
        .iter(world)
        .map(|(o, shape, transform)| ObstacleRecord { id: o.0, shape: shape.0, position: transform.translation.truncate() })
        .collect();
    obstacles.sort_by_key(|o| o.id);

    let mut flag_homes: Vec<(crate::common::ids::ObjectiveId, Vec2)> =
        world.query::<(&objectives::Objective, &objectives::Flag)>().iter(world).map(|(obj, flag)| (obj.0, flag.home_position)).collect();
    flag_homes.sort_by_key(|(id, _)| *id);

    let mut zone_positions: Vec<(crate::common::ids::ObjectiveId, Vec2, f32)> = world
        .query::<(&objectives::Objective, &objectives::KothZone)>()
        .iter(world)
        .map(|(obj, zone)| (obj.0, zone.position, zone.radius))
        .collect();
    zone_positions.sort_by_key(|(id, ..)| *id);

    InitialState {
        world_width: tunables.world_width,
        world_height: tunables.world_height,
        teams,
        spawn_areas,
        terrain: TerrainMeta { biome: "arena".to_string(), seed },
        mode,
        assigned_player_id,
        is_spectator,
        obstacles,
        flag_homes,
        zone_positions,
    }
}

pub fn rule_snapshot(rules: &Rules) -> RuleSnapshot {
    RuleSnapshot {
        mode: rules.mode_name().to_string(),
        round: rules.clock.round,
        phase: rules.clock.phase,
        round_remaining_ticks: rules.clock.round_remaining_ticks,
        rest_remaining_ticks: rules.clock.rest_remaining_ticks,
        scores: rules.scores(),
    }
}

/// Builds the per-tick snapshot from the match's `World`. Id-ordered arrays:
/// every `query.sort_by_key(|r| r.id)` below is the explicit ordering step
/// required by §5/§8 ("entity arrays are stable in id order").
pub fn snapshot(world: &mut World, server_tick: u64) -> Snapshot {
    let rules = world.resource::<Rules>();
    let rule_snap = rule_snapshot(rules);

    let mut players: Vec<PlayerRecord> = world
        .query::<(&Player, &PlayerMeta, &Transform, &Health, &Lives, &Scoreboard, &WeaponState)>()
        .iter(world)
        .map(|(player, meta, transform, health, lives, scoreboard, weapon)| PlayerRecord {
            id: player.0,
            team: meta.team,
            position: transform.translation.truncate(),
            rotation: transform.rotation.to_euler(EulerRot::XYZ).2,
            health: health.hp,
            max_health: health.max_hp,
            lives_remaining: lives.0,
            kills: scoreboard.kills,
            deaths: scoreboard.deaths,
            weapon: weapon.kind,
            magazine: weapon.magazine,
        })
        .collect();
    players.sort_by_key(|p| p.id);

    let mut projectiles: Vec<ProjectileRecord> = world
        .query::<(&Projectile, &Owner, &Transform)>()
        .iter(world)
        .map(|(p, owner, transform)| ProjectileRecord { id: p.0, position: transform.translation.truncate(), owner: owner.player })
        .collect();
    projectiles.sort_by_key(|p| p.id);

    let mut destructible_obstacles: Vec<DestructibleObstacleRecord> = world
        .query::<(&obstacles::Obstacle, &obstacles::Destructible, &Transform)>()
        .iter(world)
        .map(|(o, d, transform)| DestructibleObstacleRecord { id: o.0, position: transform.translation.truncate(), health: d.health })
        .collect();
    destructible_obstacles.sort_by_key(|o| o.id);

    let mut beams: Vec<BeamRecord> = world
        .query::<(&beams::Beam, &beams::BeamGeometry)>()
        .iter(world)
        .map(|(b, geom)| BeamRecord { id: b.0, start: geom.origin, end: geom.effective_end })
        .collect();
    beams.sort_by_key(|b| b.id);

    let mut field_effects: Vec<FieldEffectRecord> = world
        .query::<(&field_effects::FieldEffect, &field_effects::FieldEffectTag, &field_effects::FieldEffectGeometry)>()
        .iter(world)
        .map(|(fe, tag, geom)| FieldEffectRecord { id: fe.0, kind: tag.0, position: geom.position, radius: geom.radius })
        .collect();
    field_effects.sort_by_key(|fe| fe.id);

    let mut utility: Vec<UtilityRecord> =
        world.query::<(&crate::entities::utility::UtilityEntity, &Transform)>().iter(world).map(|(u, transform)| UtilityRecord { id: u.0, position: transform.translation.truncate() }).collect();
    utility.sort_by_key(|u| u.id);

    let mut flags: Vec<FlagRecord> = world
        .query::<(&objectives::Objective, &objectives::Flag)>()
        .iter(world)
        .map(|(obj, flag)| FlagRecord { id: obj.0, position: flag.position, state: flag.state })
        .collect();
    flags.sort_by_key(|f| f.id);

    let mut koth_zones: Vec<KothZoneRecord> = world
        .query::<(&objectives::Objective, &objectives::KothZone)>()
        .iter(world)
        .map(|(obj, zone)| KothZoneRecord { id: obj.0, state: zone.state, progress: zone.progress })
        .collect();
    koth_zones.sort_by_key(|z| z.id);

    Snapshot { server_tick, rules: rule_snap, players, projectiles, destructible_obstacles, beams, field_effects, utility, flags, koth_zones }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_records_are_sorted_by_id_not_insertion_order() {
        let mut records = vec![
            PlayerRecord { id: PlayerId::from_raw_test(3), team: 1, position: Vec2::ZERO, rotation: 0.0, health: 100, max_health: 100, lives_remaining: None, kills: 0, deaths: 0, weapon: crate::weapons::WeaponKind::Rifle, magazine: 30 },
            PlayerRecord { id: PlayerId::from_raw_test(1), team: 1, position: Vec2::ZERO, rotation: 0.0, health: 100, max_health: 100, lives_remaining: None, kills: 0, deaths: 0, weapon: crate::weapons::WeaponKind::Rifle, magazine: 30 },
        ];
        records.sort_by_key(|p| p.id);
        assert_eq!(records[0].id, PlayerId::from_raw_test(1));
    }
}
