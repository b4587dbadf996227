//! Match-creation entity seeding (§1 "pre-match seeding step", §4.10
//! `createMatch`'s "initial terrain/obstacle set").
//!
//! `spec.md` treats procedural terrain generation as an external
//! collaborator and only requires its *output* — an obstacle set plus
//! whatever per-mode objective entities the active ruleset needs — to be
//! part of the match's initial state. This module is that output step: a
//! deterministic function of the match seed, run once at
//! [`crate::engine::MatchEngine::new`], before the tick loop ever runs.

use bevy::prelude::*;
use rand::Rng;

use crate::common::ids::IdAllocators;
use crate::common::layers::FFA_TEAM;
use crate::common::tunables::Tunables;
use crate::entities::obstacles::{self, Destructible, Obstacle, ObstacleShape};
use crate::entities::objectives::{Flag, FlagState, KothZone, KothZoneState, Objective};
use crate::entities::registry::Registry;
use crate::entities::utility::{DefenseLaser, TeleportPad, Turret, UtilityEntity};

/// Stream id for the obstacle-placement RNG, distinct from any per-player
/// or per-shot stream derived from the same match seed.
const TERRAIN_STREAM: u64 = u64::MAX;

const OBSTACLE_COUNT: usize = 10;
const OBSTACLE_MIN_RADIUS: f32 = 30.0;
const OBSTACLE_MAX_RADIUS: f32 = 90.0;
const DESTRUCTIBLE_FRACTION: f32 = 0.3;

/// Scatters a deterministic obstacle field, then spawns whatever
/// per-mode objective entities the active ruleset needs (flags, KOTH
/// zones). Workshops and headquarters are part of the data model
/// (`entities::objectives`) but no mode currently wired into
/// [`crate::rules`] spawns them — see `DESIGN.md`.
pub fn seed_match(world: &mut World, mode_name: &str, match_seed: u64) {
    let tunables = world.resource::<Tunables>().clone();
    let mut rng = crate::common::rng::stream_rng(match_seed, TERRAIN_STREAM);

    seed_obstacles(world, &tunables, &mut rng);
    seed_teleport_pads(world, &tunables);
    seed_turrets(world, &tunables);
    seed_defense_lasers(world, &tunables, mode_name);

    match mode_name {
        "king_of_the_hill" => seed_koth_zones(world, &tunables),
        "capture_the_flag" => seed_ctf_flags(world, &tunables),
        "oddball" => seed_oddball(world),
        _ => {}
    }
}

const TURRET_FIRE_INTERVAL_TICKS: u64 = 90;
const LASER_FIRE_INTERVAL_TICKS: u64 = 45;
const LASER_ROTATION_SPEED: f32 = std::f32::consts::FRAC_PI_2;

/// One linked pad pair at opposite map corners, present regardless of mode
/// (§3: "teleport pad (linked pair, charging state)" is map furniture, not
/// a per-mode objective).
fn seed_teleport_pads(world: &mut World, tunables: &Tunables) {
    let half_w = tunables.world_width / 2.0 * 0.9;
    let half_h = tunables.world_height / 2.0 * 0.9;
    let a_pos = Vec2::new(-half_w, -half_h);
    let b_pos = Vec2::new(half_w, half_h);

    let a_id = world.resource::<IdAllocators>().alloc_utility();
    let b_id = world.resource::<IdAllocators>().alloc_utility();

    let a_entity = world
        .spawn((UtilityEntity(a_id), Transform::from_translation(a_pos.extend(0.0)), TeleportPad { linked: b_id, charge_ticks_remaining: 0 }))
        .id();
    let b_entity = world
        .spawn((UtilityEntity(b_id), Transform::from_translation(b_pos.extend(0.0)), TeleportPad { linked: a_id, charge_ticks_remaining: 0 }))
        .id();

    let mut registry = world.resource_mut::<Registry>();
    registry.insert_utility(a_id, a_entity);
    registry.insert_utility(b_id, b_entity);
}

/// Two neutral sentry turrets guarding the map's off-axis corners. Turrets
/// have no deploy operation in this system (§9 open question, resolved in
/// `DESIGN.md`), so these are pre-placed at seeding time with a phantom
/// owner id that never collides with a real player's.
fn seed_turrets(world: &mut World, tunables: &Tunables) {
    let half_w = tunables.world_width / 2.0 * 0.6;
    let half_h = tunables.world_height / 2.0 * 0.6;
    for pos in [Vec2::new(half_w, -half_h), Vec2::new(-half_w, half_h)] {
        let owner = world.resource::<IdAllocators>().alloc_player();
        let id = world.resource::<IdAllocators>().alloc_utility();
        let entity = world
            .spawn((
                UtilityEntity(id),
                Transform::from_translation(pos.extend(0.0)),
                Turret { owner, team: FFA_TEAM, health: 150, aim: Vec2::X, fire_interval_ticks: TURRET_FIRE_INTERVAL_TICKS, last_fire_tick: 0 },
            ))
            .id();
        world.resource_mut::<Registry>().insert_utility(id, entity);
    }
}

/// One defense laser guarding each team's home area, for modes where teams
/// hold ground worth defending. Skipped for free-for-all modes (oddball,
/// lone wolf) where no team owns a home; zombie defense gets a single
/// laser guarding the human spawn instead of one per side.
fn seed_defense_lasers(world: &mut World, tunables: &Tunables, mode_name: &str) {
    let teams: &[u8] = match mode_name {
        "team_deathmatch" | "king_of_the_hill" | "capture_the_flag" | "juggernaut" => &[1, 2],
        "zombie_defense" => &[1],
        _ => &[],
    };
    for &team in teams {
        let home = crate::entities::players::spawn_point_for_team(team, tunables);
        let owner = world.resource::<IdAllocators>().alloc_player();
        let id = world.resource::<IdAllocators>().alloc_utility();
        let entity = world
            .spawn((
                UtilityEntity(id),
                Transform::from_translation(home.extend(0.0)),
                DefenseLaser { owner, team, rotation_speed_radians: LASER_ROTATION_SPEED, current_angle: 0.0, fire_interval_ticks: LASER_FIRE_INTERVAL_TICKS, last_fire_tick: 0 },
            ))
            .id();
        world.resource_mut::<Registry>().insert_utility(id, entity);
    }
}

fn seed_obstacles(world: &mut World, tunables: &Tunables, rng: &mut impl Rng) {
    let half_w = tunables.world_width / 2.0 * 0.85;
    let half_h = tunables.world_height / 2.0 * 0.85;
    let shapes = [ObstacleShape::Circular, ObstacleShape::Rectangular, ObstacleShape::Triangular, ObstacleShape::Polygonal];

    for i in 0..OBSTACLE_COUNT {
        let position = Vec2::new(rng.gen_range(-half_w..half_w), rng.gen_range(-half_h..half_h));
        let radius = rng.gen_range(OBSTACLE_MIN_RADIUS..OBSTACLE_MAX_RADIUS);
        let shape = shapes[i % shapes.len()];
        let destructible = rng.gen_range(0.0..1.0) < DESTRUCTIBLE_FRACTION;

        let id = world.resource::<IdAllocators>().alloc_obstacle();
        let mut entity = world.spawn((Obstacle(id), obstacles::ObstacleShapeTag(shape), obstacles::physics_bundle(position, shape, radius, destructible)));
        if destructible {
            let health = 100;
            entity.insert(Destructible { health, max_health: health, active: true, owner: None, expires_at_tick: None });
        }
        let entity_id = entity.id();
        world.resource_mut::<Registry>().insert_obstacle(id, entity_id);
    }
}

/// Places one zone at the world center for a single-zone KOTH match — the
/// canonical shape the scenario in §8 #3 describes ("zone at origin
/// radius 80"). Multi-zone KOTH is supported by the data model
/// ([`KothZone::number`]) but not exercised by this default seeding.
fn seed_koth_zones(world: &mut World, _tunables: &Tunables) {
    let id = world.resource::<IdAllocators>().alloc_objective();
    let entity = world
        .spawn((
            Objective(id),
            KothZone { number: 1, position: Vec2::ZERO, radius: 80.0, state: KothZoneState::Neutral, progress: 0.0, capture_time_secs: 3.0 },
        ))
        .id();
    world.resource_mut::<Registry>().insert_objective(id, entity);
}

/// One flag per team, at that team's spawn point (§4.5 CTF: "flags have
/// state {home, carried(pid), dropped}").
fn seed_ctf_flags(world: &mut World, tunables: &Tunables) {
    for team in [1u8, 2u8] {
        let home = crate::entities::players::spawn_point_for_team(team, tunables);
        let id = world.resource::<IdAllocators>().alloc_objective();
        let entity = world
            .spawn((Objective(id), Flag { home_position: home, position: home, owner_team: team, state: FlagState::Home, capture_count: 0, is_oddball: false }))
            .id();
        world.resource_mut::<Registry>().insert_objective(id, entity);
    }
}

/// A single neutral ball at world center (§4.5 Oddball: "a single neutral
/// ball").
fn seed_oddball(world: &mut World) {
    let id = world.resource::<IdAllocators>().alloc_objective();
    let entity = world
        .spawn((Objective(id), Flag { home_position: Vec2::ZERO, position: Vec2::ZERO, owner_team: FFA_TEAM, state: FlagState::Home, capture_count: 0, is_oddball: true }))
        .id();
    world.resource_mut::<Registry>().insert_objective(id, entity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ids::IdAllocators;
    use crate::entities::Registry;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(Tunables::default());
        world.insert_resource(IdAllocators::default());
        world.insert_resource(Registry::default());
        world
    }

    #[test]
    fn koth_seeding_spawns_exactly_one_zone() {
        let mut world = test_world();
        seed_match(&mut world, "king_of_the_hill", 1);
        let count = world.query::<&KothZone>().iter(&world).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn ctf_seeding_spawns_one_flag_per_team() {
        let mut world = test_world();
        seed_match(&mut world, "capture_the_flag", 1);
        let mut teams: Vec<u8> = world.query::<&Flag>().iter(&world).map(|f| f.owner_team).collect();
        teams.sort();
        assert_eq!(teams, vec![1, 2]);
    }

    #[test]
    fn obstacle_seeding_is_deterministic_given_the_same_seed() {
        let mut world_a = test_world();
        seed_match(&mut world_a, "team_deathmatch", 7);
        let mut positions_a: Vec<(f32, f32)> = world_a.query::<&Transform>().iter(&world_a).map(|t| (t.translation.x, t.translation.y)).collect();
        positions_a.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut world_b = test_world();
        seed_match(&mut world_b, "team_deathmatch", 7);
        let mut positions_b: Vec<(f32, f32)> = world_b.query::<&Transform>().iter(&world_b).map(|t| (t.translation.x, t.translation.y)).collect();
        positions_b.sort_by(|a, b| a.partial_cmp(b).unwrap());

        assert_eq!(positions_a, positions_b);
    }

    #[test]
    fn non_objective_modes_spawn_no_objectives() {
        let mut world = test_world();
        seed_match(&mut world, "team_deathmatch", 1);
        assert_eq!(world.query::<&Objective>().iter(&world).count(), 0);
    }

    #[test]
    fn every_match_gets_one_linked_pad_pair_and_two_turrets() {
        let mut world = test_world();
        seed_match(&mut world, "oddball", 1);
        assert_eq!(world.query::<&TeleportPad>().iter(&world).count(), 2);
        assert_eq!(world.query::<&Turret>().iter(&world).count(), 2);

        let pads: Vec<_> = world.query::<&TeleportPad>().iter(&world).collect();
        let utilities: std::collections::HashSet<_> = world.query::<&UtilityEntity>().iter(&world).map(|u| u.0).collect();
        assert!(pads.iter().all(|pad| utilities.contains(&pad.linked)));
    }

    #[test]
    fn defense_lasers_follow_mode_team_structure() {
        let mut world = test_world();
        seed_match(&mut world, "team_deathmatch", 1);
        let mut teams: Vec<u8> = world.query::<&DefenseLaser>().iter(&world).map(|l| l.team).collect();
        teams.sort();
        assert_eq!(teams, vec![1, 2]);

        let mut world = test_world();
        seed_match(&mut world, "zombie_defense", 1);
        let teams: Vec<u8> = world.query::<&DefenseLaser>().iter(&world).map(|l| l.team).collect();
        assert_eq!(teams, vec![1]);

        let mut world = test_world();
        seed_match(&mut world, "oddball", 1);
        assert_eq!(world.query::<&DefenseLaser>().iter(&world).count(), 0);
    }

    #[test]
    fn turret_and_laser_owner_ids_never_collide_with_a_real_player() {
        let mut world = test_world();
        seed_match(&mut world, "team_deathmatch", 1);

        let turret_owners: Vec<_> = world.query::<&Turret>().iter(&world).map(|t| t.owner).collect();
        let laser_owners: Vec<_> = world.query::<&DefenseLaser>().iter(&world).map(|l| l.owner).collect();
        let player_id = world.resource::<IdAllocators>().alloc_player();

        assert!(!turret_owners.contains(&player_id));
        assert!(!laser_owners.contains(&player_id));
    }
}
