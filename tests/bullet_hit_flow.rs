//! End-to-end physics flow (Component A/B/C/G §8 scenario 1: solo
//! shoot-and-hit). Grounded in the teacher's `tests/bullet_hit_flow.rs`, but
//! where the teacher injects a synthetic `CollisionStart` to unit-test its
//! contact-handling system in isolation, these tests drive real ticks
//! through `MatchEngine::run_one_tick` so avian2d actually steps, actually
//! moves bodies, and actually emits contacts — the only way to prove the
//! engine's physics schedule wiring (`crate::physics::plugin`) is correct,
//! since a fully mocked collision can pass even when nothing ever moves.

use arena_server::common::tunables::Tunables;
use arena_server::engine::{MatchEngine, PlayerJoin};
use arena_server::rules::{RoundConfig, RuleState};
use arena_server::session::messages::PlayerInput;
use arena_server::weapons::WeaponKind;

fn tdm_state() -> RuleState {
    RuleState::TeamDeathmatch(Default::default())
}

/// A rocket fired at a stationary player, over enough real ticks to cover
/// the spawn separation at the weapon's travel speed, lands and damages
/// them. Team 0 (FFA) spawns at the world center, team 1 spawns 540 units
/// out along angle zero — a fixed, deterministic 540-unit separation
/// (`entities::players::spawn_point_for_team`) well inside the rocket
/// launcher's 1400-unit range and comfortably inside its accuracy cone.
#[test]
fn a_fired_projectile_damages_a_stationary_player_after_real_ticks() {
    let engine = MatchEngine::new(Tunables::default(), tdm_state(), RoundConfig::default(), 1);

    let shooter = engine.add_player(PlayerJoin {
        display_name: "shooter".into(),
        team: 0,
        weapon: WeaponKind::RocketLauncher,
        is_ai: false,
    });
    let target = engine.add_player(PlayerJoin {
        display_name: "target".into(),
        team: 1,
        weapon: WeaponKind::Rifle,
        is_ai: false,
    });

    let target_spawn = engine.snapshot().players.iter().find(|p| p.id == target).unwrap().position;

    for _ in 0..160 {
        engine.submit_input(shooter, PlayerInput { world: target_spawn, fire: true, ..Default::default() });
        engine.run_one_tick();
    }

    let snapshot = engine.snapshot();
    let target_record = snapshot.players.iter().find(|p| p.id == target).expect("target still present");
    assert!(target_record.health < target_record.max_health, "stationary target should have taken damage from the fired rocket");

    let shooter_record = snapshot.players.iter().find(|p| p.id == shooter).unwrap();
    assert_eq!(shooter_record.health, shooter_record.max_health, "shooter never entered the blast, should be untouched");
}

/// A player with sustained nonzero move intent actually changes position —
/// the companion half of the physics-schedule proof above: kinematic
/// `LinearVelocity` set in `ingest_inputs` only moves anything if avian's
/// own integration step actually runs inside the tick.
#[test]
fn sustained_move_intent_changes_a_players_position() {
    let engine = MatchEngine::new(Tunables::default(), tdm_state(), RoundConfig::default(), 1);

    let player = engine.add_player(PlayerJoin { display_name: "runner".into(), team: 0, weapon: WeaponKind::Pistol, is_ai: false });
    let spawn = engine.snapshot().players.iter().find(|p| p.id == player).unwrap().position;

    for _ in 0..30 {
        engine.submit_input(player, PlayerInput { move_x: 1.0, ..Default::default() });
        engine.run_one_tick();
    }

    let moved = engine.snapshot().players.iter().find(|p| p.id == player).unwrap().position;
    assert!(moved.distance(spawn) > 10.0, "player moving at full speed for 30 ticks should have covered noticeable distance, moved {moved:?} from {spawn:?}");
}
