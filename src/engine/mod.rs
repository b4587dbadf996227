//! Match engine (Component G, §4.7).
//!
//! `MatchEngine` owns one headless `bevy::app::App` — A-F wired in as Bevy
//! plugins — plus the per-player input mailboxes and the tick-loop control
//! state. One engine instance per match; engines never share a physics
//! world or entity registry (§5).

pub mod events;
pub mod mailbox;
pub mod systems;
pub mod tick;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::common::ids::{IdAllocators, PlayerId};
use crate::common::layers::TeamId;
use crate::common::rng::MatchSeed;
use crate::common::tick::TickCounter;
use crate::common::tunables::Tunables;
use crate::entities::players::{Health, Lives, PlayerBundle, PlayerIntent, PlayerMeta, Scoreboard};
use crate::entities::{self, players::Player, Registry};
use crate::rules::{RuleState, Rules};
use crate::session::messages::{PlayerInput, ServerMessage};
use crate::status::StatusEffects;
use crate::weapons::{weapon_preset, WeaponState};

/// Snapshots/events fanned out to every session; bounded so a single slow
/// subscriber can only ever lag behind (and get told so via `RecvError::Lagged`)
/// rather than hold memory unboundedly (§5 backpressure).
const BROADCAST_CAPACITY: usize = 64;

/// Metadata supplied when a player (human or AI) joins a match.
#[derive(Debug, Clone)]
pub struct PlayerJoin {
    pub display_name: String,
    pub team: TeamId,
    pub weapon: crate::weapons::WeaponKind,
    pub is_ai: bool,
}

/// Cooperative shutdown flag, checked once per tick (§5: "the tick loop
/// checks a cancellation flag at a defined point each tick").
#[derive(Resource, Default, Clone)]
pub struct ShutdownFlag(pub Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One engine per match. `app` is only ever driven from the match's own
/// tick-loop closure (§5: "the tick loop is single-threaded over the
/// match's physics world"); cross-thread access goes through `mailboxes`,
/// `shutdown`, and the snapshot channel instead.
pub struct MatchEngine {
    app: Mutex<App>,
    pub mailboxes: mailbox::Mailboxes,
    pub shutdown: ShutdownFlag,
    pub match_seed: u64,
    broadcast_tx: broadcast::Sender<ServerMessage>,
}

impl MatchEngine {
    pub fn new(tunables: Tunables, rule_state: RuleState, round_config: crate::rules::RoundConfig, match_seed: u64) -> Self {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins.build().disable::<ScheduleRunnerPlugin>(), AssetPlugin::default(), StatesPlugin));
        app.init_state::<crate::common::state::MatchState>();

        let tick_interval = tunables.tick_interval();
        let max_delta = tunables.max_fixed_delta();
        app.insert_resource(Time::<Fixed>::from_seconds(tick_interval.as_secs_f64()));
        {
            let mut time_fixed = app.world_mut().resource_mut::<Time<Fixed>>();
            time_fixed.set_max_delta(max_delta);
        }

        app.insert_resource(tunables);
        app.insert_resource(TickCounter::default());
        app.insert_resource(MatchSeed(match_seed));
        app.insert_resource(IdAllocators::default());
        app.insert_resource(Registry::default());
        let mode_name = Rules::new(rule_state.clone(), round_config).mode_name().to_string();
        app.insert_resource(Rules::new(rule_state, round_config));
        app.insert_resource(ShutdownFlag::default());
        app.init_resource::<systems::PendingInputs>();
        app.init_resource::<events::MatchEvents>();

        crate::physics::plugin(&mut app);
        entities::plugin(&mut app);
        crate::weapons::plugin(&mut app);
        crate::status::plugin(&mut app);
        crate::rules::plugin(&mut app);
        crate::ai::plugin(&mut app);

        tick::configure_sets(&mut app);
        app.add_systems(FixedUpdate, crate::status::expire_modifiers.in_set(tick::TickStep::ExpireModifiers));
        app.add_systems(FixedUpdate, systems::ingest_inputs.in_set(tick::TickStep::IngestInputs));
        app.add_systems(FixedUpdate, entities::contacts::resolve_contacts.in_set(tick::TickStep::ResolveContacts));
        app.add_systems(FixedUpdate, entities::flush_despawns.in_set(tick::TickStep::FlushDespawns));

        entities::seeding::seed_match(app.world_mut(), &mode_name, match_seed);

        let shutdown = app.world().resource::<ShutdownFlag>().clone();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        Self { app: Mutex::new(app), mailboxes: mailbox::Mailboxes::default(), shutdown, match_seed, broadcast_tx }
    }

    /// Runs one fixed tick. Returns `false` once the shutdown flag has been
    /// observed, signalling the tick loop to stop (§5). Tick step 11
    /// (serialize): drains this tick's event bus and, on broadcast-divisor
    /// boundaries, builds the snapshot — both published to every session's
    /// broadcast receiver in emission order (§5 "Events emitted during tick
    /// N are broadcast after snapshot N... in their emission order" is
    /// satisfied by publishing the snapshot first, then the events it
    /// preceded).
    pub fn run_one_tick(&self) -> bool {
        if self.shutdown.is_requested() {
            return false;
        }
        let mut app = self.app.lock();
        let drained = self.mailboxes.drain_for_tick();
        app.world_mut().resource_mut::<systems::PendingInputs>().0 = drained;
        app.world_mut().run_schedule(FixedUpdate);

        let tick = app.world().resource::<TickCounter>().0;
        let divisor = app.world().resource::<Tunables>().broadcast_divisor.max(1) as u64;
        if tick % divisor == 0 {
            let snapshot = crate::serializer::snapshot(app.world_mut(), tick);
            let _ = self.broadcast_tx.send(ServerMessage::GameState(snapshot));
        }
        for event in app.world_mut().resource_mut::<events::MatchEvents>().drain() {
            let _ = self.broadcast_tx.send(event);
        }
        true
    }

    pub fn add_player(&self, join: PlayerJoin) -> PlayerId {
        let mut app = self.app.lock();
        let id = app.world().resource::<IdAllocators>().alloc_player();
        let def = weapon_preset(join.weapon);

        let entity = app
            .world_mut()
            .spawn(PlayerBundle {
                player: Player(id),
                meta: PlayerMeta { display_name: join.display_name, team: join.team },
                health: Health::full(100),
                lives: Lives(None),
                eliminated: Default::default(),
                intent: Default::default(),
                scoreboard: Scoreboard::default(),
                is_ai: entities::players::IsAi(join.is_ai),
                weapon: WeaponState::new(def),
                status: StatusEffects::default(),
            })
            .id();

        if join.is_ai {
            let seed = self.match_seed;
            app.world_mut().entity_mut(entity).insert(crate::ai::AiState::new(
                id,
                seed,
                crate::ai::BehaviorProfile::default(),
                1,
            ));
        } else {
            // Mailboxes live outside the App's Mutex so the session layer
            // can write to them without taking the tick lock.
            self.mailboxes.register(id);
        }

        let spawn = crate::entities::players::spawn_point_for_team(join.team, app.world().resource::<Tunables>());
        app.world_mut().entity_mut(entity).insert(crate::entities::players::physics_bundle(spawn));

        app.world_mut().resource_mut::<Registry>().insert_player(id, entity);
        id
    }

    pub fn remove_player(&self, id: PlayerId) {
        let mut app = self.app.lock();
        if let Some(entity) = app.world().resource::<Registry>().players(id) {
            app.world_mut().entity_mut(entity).insert(entities::PendingDespawn);
        }
        self.mailboxes.unregister(id);
    }

    pub fn submit_input(&self, player: PlayerId, input: PlayerInput) {
        self.mailboxes.submit(player, input);
    }

    pub fn snapshot(&self) -> crate::serializer::Snapshot {
        let mut app = self.app.lock();
        let tick = app.world().resource::<TickCounter>().0;
        crate::serializer::snapshot(app.world_mut(), tick)
    }

    /// §4.8 "Initial state": built on join, once per session, from the
    /// entities `entities::seeding::seed_match` placed at match creation.
    pub fn initial_state(&self, assigned_player_id: Option<PlayerId>, is_spectator: bool) -> crate::serializer::InitialState {
        let mut app = self.app.lock();
        crate::serializer::initial_state(app.world_mut(), assigned_player_id, is_spectator)
    }

    /// One receiver per connected endpoint (§4.9 "pending outbound queue").
    /// A receiver that falls behind gets `RecvError::Lagged` on its next
    /// `recv` instead of unbounded growth — the broadcast channel's own
    /// realization of the "drop oldest, keep newest" policy (§5).
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.broadcast_tx.subscribe()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    /// Runs the tick loop to completion on the calling thread. §4.7 "Drift &
    /// catch-up": sleeps when wall clock is ahead of schedule; when behind,
    /// runs extra ticks back-to-back to catch up, bounded by
    /// [`CATCH_UP_CAP`] so a long stall doesn't burn CPU trying to replay
    /// every missed tick — beyond the cap the remaining lag is dropped and
    /// logged. Intended to be handed to a `rayon::ThreadPool` slot by the
    /// lobby (§4.7 `start()`).
    pub fn run_tick_loop(&self, tick_interval: Duration) {
        const CATCH_UP_CAP: u32 = 3;
        let mut next_tick_at = std::time::Instant::now() + tick_interval;
        loop {
            let now = std::time::Instant::now();
            if now < next_tick_at {
                std::thread::sleep(next_tick_at - now);
            }
            if !self.run_one_tick() {
                break;
            }
            next_tick_at += tick_interval;

            let mut caught_up = 0;
            while std::time::Instant::now() > next_tick_at && caught_up < CATCH_UP_CAP {
                if !self.run_one_tick() {
                    return;
                }
                next_tick_at += tick_interval;
                caught_up += 1;
            }
            if std::time::Instant::now() > next_tick_at {
                log::warn!("match tick loop fell behind by more than {CATCH_UP_CAP} ticks; dropping accumulated lag");
                next_tick_at = std::time::Instant::now() + tick_interval;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rules_test_state;

    #[test]
    fn new_engine_starts_with_zero_ticks() {
        let engine = MatchEngine::new(Tunables::default(), rules_test_state(), crate::rules::RoundConfig::default(), 1);
        assert_eq!(engine.snapshot().server_tick, 0);
    }

    #[test]
    fn running_a_tick_advances_the_counter() {
        let engine = MatchEngine::new(Tunables::default(), rules_test_state(), crate::rules::RoundConfig::default(), 1);
        engine.run_one_tick();
        assert_eq!(engine.snapshot().server_tick, 1);
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let engine = MatchEngine::new(Tunables::default(), rules_test_state(), crate::rules::RoundConfig::default(), 1);
        engine.request_shutdown();
        assert!(!engine.run_one_tick());
    }

    #[test]
    fn adding_and_removing_a_player_round_trips_the_registry() {
        let engine = MatchEngine::new(Tunables::default(), rules_test_state(), crate::rules::RoundConfig::default(), 1);
        let id = engine.add_player(PlayerJoin { display_name: "p1".into(), team: 1, weapon: crate::weapons::WeaponKind::Rifle, is_ai: false });
        engine.remove_player(id);
        engine.run_one_tick();
        let snap = engine.snapshot();
        assert!(snap.players.is_empty());
    }
}
