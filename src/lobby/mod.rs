//! Lobby (Component J, §4.10).
//!
//! Process-wide singleton: a `tokio::sync::RwLock<HashMap<...>>` plus an
//! `AtomicU64` match-id allocator and an `AtomicUsize` global player
//! counter (§4.10/§5: "only the lobby map and global counters are
//! process-wide"). Each match's tick loop runs as one blocking closure on
//! a shared `rayon::ThreadPool` — the "shared bounded worker pool" of §5.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rayon::ThreadPool;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::common::tunables::Tunables;
use crate::engine::{MatchEngine, PlayerJoin};
use crate::net::{Transport, TransportError};
use crate::rules::{RoundConfig, RuleState};
use crate::session::messages::{ClientMessage, ConfigChange, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MatchId(pub u64);

pub struct MatchMode {
    pub name: String,
    pub rule_state_factory: fn() -> RuleState,
    pub round_config: RoundConfig,
}

struct MatchHandle {
    engine: Arc<MatchEngine>,
    mode_name: String,
    human_count: AtomicUsize,
}

pub struct Lobby {
    matches: RwLock<HashMap<MatchId, MatchHandle>>,
    next_match_id: AtomicU64,
    global_players: AtomicUsize,
    max_global_players: usize,
    max_players_per_match: usize,
    tunables: Tunables,
    pool: ThreadPool,
}

#[derive(Debug, Serialize)]
pub struct MatchListing {
    pub match_id: u64,
    pub mode: String,
    pub player_count: usize,
}

impl Lobby {
    pub fn new(tunables: Tunables, max_global_players: usize, max_players_per_match: usize) -> Arc<Self> {
        let pool = rayon::ThreadPoolBuilder::new().build().expect("worker pool builds with default thread count");
        Arc::new(Self {
            matches: RwLock::new(HashMap::new()),
            next_match_id: AtomicU64::new(1),
            global_players: AtomicUsize::new(0),
            max_global_players,
            max_players_per_match,
            tunables,
            pool,
        })
    }

    fn alloc_match_id(&self) -> MatchId {
        MatchId(self.next_match_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// §4.10 `createMatch`: allocates a fresh id, instantiates the engine
    /// with its terrain/obstacle seed, and starts the tick job on the
    /// shared worker pool.
    pub async fn create_match(self: &Arc<Self>, mode: MatchMode, seed: u64) -> MatchId {
        let match_id = self.alloc_match_id();
        let engine = Arc::new(MatchEngine::new(self.tunables.clone(), (mode.rule_state_factory)(), mode.round_config, seed));

        let tick_interval = self.tunables.tick_interval();
        let loop_engine = engine.clone();
        self.pool.spawn(move || loop_engine.run_tick_loop(tick_interval));

        self.matches.write().await.insert(match_id, MatchHandle { engine, mode_name: mode.name, human_count: AtomicUsize::new(0) });
        match_id
    }

    /// §4.10 `findOrJoin`: joins an existing match of the given mode if one
    /// exists with spare capacity, otherwise creates one.
    pub async fn find_or_join(self: &Arc<Self>, mode: MatchMode, seed: u64) -> MatchId {
        let existing = {
            let matches = self.matches.read().await;
            matches
                .iter()
                .find(|(_, handle)| handle.mode_name == mode.name && handle.engine.snapshot().players.len() < self.max_players_per_match)
                .map(|(&id, _)| id)
        };
        match existing {
            Some(id) => id,
            None => self.create_match(mode, seed).await,
        }
    }

    pub async fn remove_match(&self, match_id: MatchId) {
        if let Some(handle) = self.matches.write().await.remove(&match_id) {
            handle.engine.request_shutdown();
        }
    }

    pub async fn list(&self) -> Vec<MatchListing> {
        let matches = self.matches.read().await;
        matches
            .iter()
            .map(|(id, handle)| MatchListing { match_id: id.0, mode: handle.mode_name.clone(), player_count: handle.engine.snapshot().players.len() })
            .collect()
    }

    /// §4.10 periodic cull: "for each match with zero human endpoints, call
    /// shutdown and remove." Runs on a `tokio::time::interval`; returns the
    /// ids removed so callers can log.
    pub async fn cull_empty_matches(&self, human_counts: impl Fn(MatchId) -> usize) -> Vec<MatchId> {
        let candidates: Vec<MatchId> = {
            let matches = self.matches.read().await;
            matches.keys().copied().filter(|id| human_counts(*id) == 0).collect()
        };
        for id in &candidates {
            self.remove_match(*id).await;
        }
        candidates
    }

    pub async fn spawn_cull_task(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let counts: HashMap<MatchId, usize> = {
                let matches = self.matches.read().await;
                matches.iter().map(|(id, handle)| (*id, handle.human_count.load(Ordering::Relaxed))).collect()
            };
            self.cull_empty_matches(move |id| counts.get(&id).copied().unwrap_or(0)).await;
        }
    }

    fn try_reserve_global_slot(&self) -> bool {
        let mut current = self.global_players.load(Ordering::Relaxed);
        loop {
            if current >= self.max_global_players {
                return false;
            }
            match self.global_players.compare_exchange_weak(current, current + 1, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn release_global_slot(&self) {
        self.global_players.fetch_sub(1, Ordering::Relaxed);
    }

    /// Drives one connected player transport end-to-end: join, forward
    /// inputs, relay snapshots/events, and clean up on disconnect (§4.9).
    /// `deep_link` is a `configChange` decoded from the join URL's query
    /// string (§6); when present it stands in for the first inbound frame
    /// so the client need not send an explicit `configChange` before play.
    pub async fn run_player_session(self: &Arc<Self>, match_id: MatchId, mut transport: impl Transport, deep_link: Option<ConfigChange>) {
        if !self.try_reserve_global_slot() {
            let _ = transport
                .send(ServerMessage::GameOver(crate::session::messages::GameOver {
                    victory_condition: crate::rules::VictoryCondition::Endless,
                    message: "server is full".into(),
                    final_scores: Vec::new(),
                }))
                .await;
            return;
        }

        let engine = {
            let matches = self.matches.read().await;
            matches.get(&match_id).map(|h| h.engine.clone())
        };
        let Some(engine) = engine else {
            self.release_global_slot();
            return;
        };

        // §4.9 "On connect: ... if match has capacity ... call G.addPlayer".
        if engine.snapshot().players.len() >= self.max_players_per_match {
            let _ = transport
                .send(ServerMessage::GameOver(crate::session::messages::GameOver {
                    victory_condition: crate::rules::VictoryCondition::Endless,
                    message: "match is full".into(),
                    final_scores: Vec::new(),
                }))
                .await;
            self.release_global_slot();
            return;
        }

        let first_config = match deep_link {
            Some(cfg) => Ok(cfg),
            None => match transport.recv().await {
                Ok(ClientMessage::ConfigChange(cfg)) => Ok(cfg),
                _ => Err(()),
            },
        };
        let player_id = match first_config {
            Ok(cfg) => engine.add_player(PlayerJoin {
                display_name: cfg.player_name.unwrap_or_else(|| "player".into()),
                team: 1,
                weapon: cfg.weapon_config,
                is_ai: false,
            }),
            Err(()) => {
                self.release_global_slot();
                return;
            }
        };
        self.adjust_human_count(match_id, 1).await;

        // §4.9 "On connect: ... send initial state; add to broadcast set."
        if transport.send(ServerMessage::InitialState(engine.initial_state(Some(player_id), false))).await.is_err() {
            engine.remove_player(player_id);
            self.adjust_human_count(match_id, -1).await;
            self.release_global_slot();
            return;
        }

        let mut outbound = engine.subscribe();
        loop {
            tokio::select! {
                biased;
                inbound = transport.recv() => match inbound {
                    Ok(ClientMessage::PlayerInput(input)) => engine.submit_input(player_id, input),
                    Ok(ClientMessage::ConfigChange(_)) => {
                        // Weapon-switch mid-match is accepted by policy (§4.9);
                        // re-arming the weapon slot happens inside the tick via
                        // the next fire/reload resolution, not here.
                    }
                    // §5/§7: a transport failure (closed, or either deadline
                    // exceeded) closes the endpoint; a single malformed frame
                    // is dropped and the endpoint kept.
                    Err(TransportError::Closed) | Err(TransportError::ReadDeadlineExceeded) | Err(TransportError::WriteDeadlineExceeded) => break,
                    Err(err @ TransportError::Malformed(_)) => {
                        log::debug!("dropping malformed frame from player {player_id}: {err}");
                        continue;
                    }
                },
                published = outbound.recv() => match published {
                    Ok(message) => {
                        if transport.send(message).await.is_err() {
                            break;
                        }
                    }
                    // A receiver that fell behind skips straight to the newest
                    // value on its next `recv` (§5 "drop oldest, keep newest");
                    // a closed sender only happens at engine shutdown.
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        engine.remove_player(player_id);
        self.adjust_human_count(match_id, -1).await;
        self.release_global_slot();
    }

    /// Tracks human presence per match for the periodic cull (§4.10):
    /// incremented on a successful join in [`Self::run_player_session`],
    /// decremented on disconnect. AI players never touch this counter, so
    /// an AI-only match always culls after one interval as required.
    async fn adjust_human_count(&self, match_id: MatchId, delta: i64) {
        let matches = self.matches.read().await;
        if let Some(handle) = matches.get(&match_id) {
            if delta >= 0 {
                handle.human_count.fetch_add(delta as usize, Ordering::Relaxed);
            } else {
                handle.human_count.fetch_sub((-delta) as usize, Ordering::Relaxed);
            }
        }
    }

    pub async fn run_spectator_session(self: &Arc<Self>, match_id: MatchId, mut transport: impl Transport) {
        let engine = {
            let matches = self.matches.read().await;
            matches.get(&match_id).map(|h| h.engine.clone())
        };
        let Some(engine) = engine else { return };

        if transport.send(ServerMessage::SpectatorInit(engine.initial_state(None, true))).await.is_err() {
            return;
        }

        let mut outbound = engine.subscribe();
        loop {
            match outbound.recv().await {
                Ok(message) => {
                    if transport.send(message).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

pub fn default_mode_factory(kind: &str) -> Option<MatchMode> {
    let factory: fn() -> RuleState = match kind {
        "team_deathmatch" => || RuleState::TeamDeathmatch(Default::default()),
        "king_of_the_hill" => || RuleState::KingOfTheHill(Default::default()),
        "capture_the_flag" => || RuleState::CaptureTheFlag(Default::default()),
        "oddball" => || RuleState::Oddball(Default::default()),
        "juggernaut" => || RuleState::Juggernaut(Default::default()),
        "lone_wolf" => || RuleState::LoneWolf(Default::default()),
        "zombie_defense" => || RuleState::ZombieDefense(Default::default()),
        _ => return None,
    };
    Some(MatchMode { name: kind.to_string(), rule_state_factory: factory, round_config: RoundConfig::default() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::transport::memory::MemoryTransport;
    use crate::weapons::WeaponKind;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn creating_a_match_assigns_monotone_ids() {
        let lobby = Lobby::new(Tunables::default(), 100, 12);
        let mode_a = default_mode_factory("team_deathmatch").unwrap();
        let mode_b = default_mode_factory("team_deathmatch").unwrap();
        let a = lobby.create_match(mode_a, 1).await;
        let b = lobby.create_match(mode_b, 2).await;
        assert!(b.0 > a.0);
        lobby.remove_match(a).await;
        lobby.remove_match(b).await;
    }

    #[tokio::test]
    async fn cull_removes_matches_with_no_humans() {
        let lobby = Lobby::new(Tunables::default(), 100, 12);
        let mode = default_mode_factory("team_deathmatch").unwrap();
        let id = lobby.create_match(mode, 1).await;
        let removed = lobby.cull_empty_matches(|_| 0).await;
        assert_eq!(removed, vec![id]);
        assert!(lobby.list().await.is_empty());
    }

    #[tokio::test]
    async fn cull_spares_a_match_with_a_tracked_human() {
        let lobby = Lobby::new(Tunables::default(), 100, 12);
        let mode = default_mode_factory("team_deathmatch").unwrap();
        let id = lobby.create_match(mode, 1).await;
        lobby.adjust_human_count(id, 1).await;

        let counts: HashMap<MatchId, usize> = {
            let matches = lobby.matches.read().await;
            matches.iter().map(|(id, handle)| (*id, handle.human_count.load(Ordering::Relaxed))).collect()
        };
        let removed = lobby.cull_empty_matches(move |mid| counts.get(&mid).copied().unwrap_or(0)).await;
        assert!(removed.is_empty());
        assert_eq!(lobby.list().await.len(), 1);

        lobby.adjust_human_count(id, -1).await;
        let removed = lobby.cull_empty_matches(|_| 0).await;
        assert_eq!(removed, vec![id]);
    }

    #[tokio::test]
    async fn unknown_mode_name_is_rejected() {
        assert!(default_mode_factory("not_a_real_mode").is_none());
    }

    #[tokio::test]
    async fn run_player_session_rejects_a_full_match() {
        let lobby = Lobby::new(Tunables::default(), 100, 0);
        let mode = default_mode_factory("team_deathmatch").unwrap();
        let match_id = lobby.create_match(mode, 1).await;

        let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();
        let (_inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let transport = MemoryTransport { outbox: outbox_tx, inbox: inbox_rx };
        let deep_link = ConfigChange { weapon_config: WeaponKind::Rifle, utility_weapon: None, player_name: Some("overflow".into()) };

        lobby.run_player_session(match_id, transport, Some(deep_link)).await;

        assert_eq!(lobby.list().await[0].player_count, 0);
        assert!(matches!(outbox_rx.recv().await, Some(ServerMessage::GameOver(_))));
    }

    #[tokio::test]
    async fn deep_link_config_joins_without_an_explicit_frame() {
        let lobby = Lobby::new(Tunables::default(), 100, 12);
        let mode = default_mode_factory("team_deathmatch").unwrap();
        let match_id = lobby.create_match(mode, 1).await;

        let (outbox_tx, _outbox_rx) = mpsc::unbounded_channel();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let transport = MemoryTransport { outbox: outbox_tx, inbox: inbox_rx };

        let deep_link = ConfigChange { weapon_config: WeaponKind::Rifle, utility_weapon: None, player_name: Some("deep-linker".into()) };
        let session_lobby = lobby.clone();
        let handle = tokio::spawn(async move {
            session_lobby.run_player_session(match_id, transport, Some(deep_link)).await;
        });

        // The session task joins immediately from the deep link, then blocks
        // on `recv()` for further frames; dropping the sender closes it.
        tokio::task::yield_now().await;
        let listing = lobby.list().await;
        assert_eq!(listing[0].player_count, 1);
        drop(inbox_tx);
        handle.await.unwrap();
    }
}
