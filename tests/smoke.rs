//! Headless integration smoke tests (Component G/H/I end-to-end).
//!
//! Keep these headless: `MatchEngine::new` already wires `MinimalPlugins`
//! plus every gameplay plugin, so there's nothing extra to configure here
//! the way the teacher's `tests/common` harness configures its `App`.

use arena_server::common::tunables::Tunables;
use arena_server::engine::{MatchEngine, PlayerJoin};
use arena_server::rules::{RoundConfig, RuleState};
use arena_server::session::messages::ServerMessage;
use arena_server::weapons::WeaponKind;

/// `rules::rules_test_state` is `#[cfg(test)]`-gated and only visible to the
/// lib's own unit tests, not to this separate integration-test crate — same
/// team-deathmatch default, spelled out directly here instead.
fn tdm_state() -> RuleState {
    RuleState::TeamDeathmatch(Default::default())
}

#[test]
fn boots_and_ticks() {
    let engine = MatchEngine::new(Tunables::default(), tdm_state(), RoundConfig::default(), 1);
    for _ in 0..10 {
        assert!(engine.run_one_tick());
    }
    assert_eq!(engine.snapshot().server_tick, 10);
}

#[test]
fn joining_a_player_appears_in_the_next_snapshot() {
    let engine = MatchEngine::new(Tunables::default(), tdm_state(), RoundConfig::default(), 1);
    let id = engine.add_player(PlayerJoin { display_name: "alice".into(), team: 1, weapon: WeaponKind::Rifle, is_ai: false });
    engine.run_one_tick();

    let snapshot = engine.snapshot();
    let player = snapshot.players.iter().find(|p| p.id == id);
    assert!(player.is_some(), "joined player should be present in the tick snapshot");
    assert_eq!(player.unwrap().team, 1);
}

#[test]
fn initial_state_reports_the_configured_team_count() {
    let mut tunables = Tunables::default();
    tunables.max_teams = 3;
    let engine = MatchEngine::new(tunables, tdm_state(), RoundConfig::default(), 1);

    let id = engine.add_player(PlayerJoin { display_name: "bob".into(), team: 1, weapon: WeaponKind::Rifle, is_ai: false });
    let state = engine.initial_state(Some(id), false);
    assert_eq!(state.teams, vec![1, 2, 3]);
    assert_eq!(state.assigned_player_id, Some(id));
    assert!(!state.is_spectator);
}

#[test]
fn a_subscriber_receives_a_snapshot_broadcast_on_the_divisor_tick() {
    let mut tunables = Tunables::default();
    tunables.broadcast_divisor = 1;
    let engine = MatchEngine::new(tunables, tdm_state(), RoundConfig::default(), 1);

    let mut receiver = engine.subscribe();
    engine.run_one_tick();

    match receiver.try_recv() {
        Ok(ServerMessage::GameState(snapshot)) => assert_eq!(snapshot.server_tick, 1),
        other => panic!("expected a GameState broadcast, got {other:?}"),
    }
}

#[test]
fn disconnecting_a_player_removes_them_from_the_next_broadcast_snapshot() {
    let mut tunables = Tunables::default();
    tunables.broadcast_divisor = 1;
    let engine = MatchEngine::new(tunables, tdm_state(), RoundConfig::default(), 1);

    let player = engine.add_player(PlayerJoin { display_name: "leaver".into(), team: 1, weapon: WeaponKind::Rifle, is_ai: false });
    let mut receiver = engine.subscribe();

    engine.remove_player(player);
    engine.run_one_tick();

    match receiver.try_recv() {
        Ok(ServerMessage::GameState(snapshot)) => assert!(snapshot.players.iter().all(|p| p.id != player)),
        other => panic!("expected a GameState broadcast, got {other:?}"),
    }
}
