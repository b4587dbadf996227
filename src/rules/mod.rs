//! Rule system (Component E, §4.5): per-mode objective state machines
//! sharing one [`rounds::RoundClock`].

pub mod ctf;
pub mod dispatch;
pub mod juggernaut;
pub mod koth;
pub mod lone_wolf;
pub mod rounds;
pub mod tdm;
pub mod zombies;

use bevy::prelude::*;

pub use rounds::{Phase, RoundClock, RoundConfig, RoundEvent, VictoryCondition};

/// One variant per mode, holding that mode's own scoring/state-machine
/// bookkeeping; `RoundClock` is shared and stored alongside rather than
/// duplicated per variant (§4.5 "Rounds").
#[derive(Debug, Clone)]
pub enum RuleState {
    TeamDeathmatch(tdm::TeamDeathmatch),
    KingOfTheHill(KothState),
    CaptureTheFlag(CtfState),
    Oddball(ctf::OddballScores),
    Juggernaut(JuggernautState),
    LoneWolf(lone_wolf::LoneWolf),
    ZombieDefense(zombies::ZombieDefense),
}

#[derive(Debug, Clone, Default)]
pub struct JuggernautState {
    pub current: std::collections::HashMap<crate::common::layers::TeamId, crate::common::ids::PlayerId>,
    pub scores: std::collections::HashMap<crate::common::layers::TeamId, u32>,
}

/// Score accrual for every zone owned by each team (§4.5 KOTH: "score
/// accrues per tick per controlled zone to the owning team").
#[derive(Debug, Clone, Default)]
pub struct KothState {
    pub scores: std::collections::HashMap<crate::common::layers::TeamId, u32>,
}

#[derive(Debug, Clone, Default)]
pub struct CtfState {
    pub captures: std::collections::HashMap<crate::common::layers::TeamId, u32>,
}

/// Resource bundling the active mode's state with the shared round clock.
#[derive(Resource, Debug, Clone)]
pub struct Rules {
    pub state: RuleState,
    pub clock: RoundClock,
}

impl Rules {
    pub fn new(state: RuleState, config: RoundConfig) -> Self {
        Self { state, clock: RoundClock::new(config) }
    }

    pub fn mode_name(&self) -> &'static str {
        match self.state {
            RuleState::TeamDeathmatch(_) => "team_deathmatch",
            RuleState::KingOfTheHill(_) => "king_of_the_hill",
            RuleState::CaptureTheFlag(_) => "capture_the_flag",
            RuleState::Oddball(_) => "oddball",
            RuleState::Juggernaut(_) => "juggernaut",
            RuleState::LoneWolf(_) => "lone_wolf",
            RuleState::ZombieDefense(_) => "zombie_defense",
        }
    }

    /// Per-team score table for the active mode; shared by the serializer's
    /// tick snapshot and by the `roundEnd`/`gameOver` event payloads so both
    /// report the same numbers (§4.8, §6).
    pub fn scores(&self) -> Vec<(crate::common::layers::TeamId, u32)> {
        match &self.state {
            RuleState::TeamDeathmatch(tdm) => tdm.kills.iter().map(|(&team, &count)| (team, count)).collect(),
            RuleState::KingOfTheHill(koth) => koth.scores.iter().map(|(&team, &count)| (team, count)).collect(),
            RuleState::CaptureTheFlag(ctf) => ctf.captures.iter().map(|(&team, &count)| (team, count)).collect(),
            RuleState::Oddball(scores) => scores.seconds_held.iter().map(|(&team, &secs)| (team, secs as u32)).collect(),
            RuleState::Juggernaut(state) => state.scores.iter().map(|(&team, &count)| (team, count)).collect(),
            RuleState::LoneWolf(wolf) => vec![(dispatch::human_team(), wolf.kills_on_wolf)],
            RuleState::ZombieDefense(defense) => vec![(dispatch::human_team(), defense.wave_number)],
        }
    }
}

/// Converts a round-boundary event into its wire shape (§6), filling in
/// the live score table so `roundEnd`/`gameOver` report final numbers.
fn round_event_to_message(event: RoundEvent, rules: &Rules, tick_rate_hz: u32) -> crate::session::messages::ServerMessage {
    use crate::session::messages::{GameOver, RoundEnd, RoundStart, ServerMessage};
    let ticks_to_secs = |ticks: u64| ticks as f32 / tick_rate_hz.max(1) as f32;
    match event {
        RoundEvent::RoundStarted { round, rest_duration_ticks } => {
            ServerMessage::RoundStart(RoundStart { round, rest_duration_secs: ticks_to_secs(rest_duration_ticks) })
        }
        RoundEvent::RoundEnded { round } => {
            ServerMessage::RoundEnd(RoundEnd { round, scores: rules.scores(), rest_duration_secs: ticks_to_secs(rules.clock.config.rest_duration_ticks) })
        }
        RoundEvent::GameOver { victory } => {
            ServerMessage::GameOver(GameOver { victory_condition: victory, message: "match complete".to_string(), final_scores: rules.scores() })
        }
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        (rule_step, dispatch::mode_dispatch).chain().in_set(crate::engine::tick::TickStep::RuleStep),
    );
}

/// Tick step 9: advances the shared round clock, checks score-limit
/// victory for the active mode, and schedules/resolves respawns for
/// players who died since the last respawn pass (§4.5, §4.2 "a player is
/// physically absent... between death and respawn").
pub fn rule_step(
    mut commands: Commands,
    tick: Res<crate::common::tick::TickCounter>,
    tunables: Res<crate::common::tunables::Tunables>,
    mut rules: ResMut<Rules>,
    mut events: ResMut<crate::engine::events::MatchEvents>,
    mut dead: Query<
        (Entity, &crate::entities::players::Health, &mut crate::entities::players::Eliminated, &mut crate::entities::players::Scoreboard),
        Without<crate::entities::players::AwaitingRespawn>,
    >,
    mut awaiting: Query<(Entity, &crate::entities::players::AwaitingRespawn, &crate::entities::players::PlayerMeta, &mut crate::entities::players::Health, &mut crate::entities::players::Eliminated)>,
) {
    if rules.clock.phase == rounds::Phase::Pre {
        let event = rules.clock.start_first_round();
        log::info!("{:?}", event);
        events.push(round_event_to_message(event, &rules, tunables.tick_rate_hz));
    }

    for event in rules.clock.advance() {
        log::info!("{:?}", event);
        events.push(round_event_to_message(event, &rules, tunables.tick_rate_hz));
    }

    if let RuleState::TeamDeathmatch(ref tdm) = rules.state {
        if let Some(limit) = rules.clock.config.score_limit {
            if tdm.has_reached(limit).is_some() && !rules.clock.is_ended() {
                let event = rules.clock.force_end();
                log::info!("{:?}", event);
                events.push(round_event_to_message(event, &rules, tunables.tick_rate_hz));
            }
        }
    }

    for (entity, health, mut eliminated, mut scoreboard) in &mut dead {
        if health.hp <= 0 && !eliminated.0 {
            eliminated.0 = true;
            scoreboard.deaths += 1;
            let deadline = crate::entities::players::respawn_deadline(tick.0, tunables.tick_rate_hz, tunables.respawn_delay);
            commands
                .entity(entity)
                .remove::<crate::entities::players::PlayerPhysicsBundle>()
                .insert(crate::entities::players::AwaitingRespawn { deadline_tick: deadline });
        }
    }

    for (entity, awaiting_respawn, meta, mut health, mut eliminated) in &mut awaiting {
        if tick.0 >= awaiting_respawn.deadline_tick {
            *health = crate::entities::players::Health::full(health.max_hp);
            eliminated.0 = false;
            let spawn = crate::entities::players::spawn_point_for_team(meta.team, &tunables);
            commands
                .entity(entity)
                .remove::<crate::entities::players::AwaitingRespawn>()
                .insert(crate::entities::players::physics_bundle(spawn));
        }
    }
}

#[cfg(test)]
pub fn rules_test_state() -> RuleState {
    RuleState::TeamDeathmatch(tdm::TeamDeathmatch::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_name_matches_variant() {
        let rules = Rules::new(RuleState::TeamDeathmatch(Default::default()), RoundConfig::default());
        assert_eq!(rules.mode_name(), "team_deathmatch");
    }
}
