//! Round/rest/scoring clock shared across every mode (§4.5 "Rounds").

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Pre,
    Playing,
    Rest,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryCondition {
    ScoreLimit,
    TimeLimit,
    Objective,
    Elimination,
    Endless,
}

#[derive(Debug, Clone, Copy)]
pub struct RoundConfig {
    pub max_rounds: Option<u32>,
    pub round_duration_ticks: u64,
    pub rest_duration_ticks: u64,
    pub victory: VictoryCondition,
    pub score_limit: Option<u32>,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            max_rounds: Some(5),
            round_duration_ticks: 60 * 300,
            rest_duration_ticks: 60 * 10,
            victory: VictoryCondition::ScoreLimit,
            score_limit: Some(25),
        }
    }
}

/// A round/rest-boundary event for the session layer to fan out as
/// `roundStart`/`roundEnd`/`gameOver` (§6).
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    RoundStarted { round: u32, rest_duration_ticks: u64 },
    RoundEnded { round: u32 },
    GameOver { victory: VictoryCondition },
}

#[derive(Resource, Debug, Clone)]
pub struct RoundClock {
    pub config: RoundConfig,
    pub round: u32,
    pub phase: Phase,
    pub round_remaining_ticks: u64,
    pub rest_remaining_ticks: u64,
}

impl RoundClock {
    pub fn new(config: RoundConfig) -> Self {
        Self { round: 0, phase: Phase::Pre, round_remaining_ticks: config.round_duration_ticks, rest_remaining_ticks: 0, config }
    }

    pub fn start_first_round(&mut self) -> RoundEvent {
        self.round = 1;
        self.phase = Phase::Playing;
        self.round_remaining_ticks = self.config.round_duration_ticks;
        RoundEvent::RoundStarted { round: self.round, rest_duration_ticks: self.config.rest_duration_ticks }
    }

    /// Tick step 9 (part of rule advancement): advances round/rest timers
    /// and returns any boundary events that fired this tick.
    pub fn advance(&mut self) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::Pre | Phase::Ended => {}
            Phase::Playing => {
                self.round_remaining_ticks = self.round_remaining_ticks.saturating_sub(1);
                if self.round_remaining_ticks == 0 {
                    events.push(RoundEvent::RoundEnded { round: self.round });
                    if self.is_last_round() {
                        self.phase = Phase::Ended;
                        events.push(RoundEvent::GameOver { victory: self.config.victory });
                    } else {
                        self.phase = Phase::Rest;
                        self.rest_remaining_ticks = self.config.rest_duration_ticks;
                    }
                }
            }
            Phase::Rest => {
                self.rest_remaining_ticks = self.rest_remaining_ticks.saturating_sub(1);
                if self.rest_remaining_ticks == 0 {
                    self.round += 1;
                    self.phase = Phase::Playing;
                    self.round_remaining_ticks = self.config.round_duration_ticks;
                    events.push(RoundEvent::RoundStarted { round: self.round, rest_duration_ticks: self.config.rest_duration_ticks });
                }
            }
        }
        events
    }

    pub fn is_last_round(&self) -> bool {
        self.config.max_rounds.is_some_and(|max| self.round >= max)
    }

    /// §4.5: score-limit victory checked independently of the round clock —
    /// a mode calls this once a score crosses the configured limit and ends
    /// the match early.
    pub fn force_end(&mut self) -> RoundEvent {
        self.phase = Phase::Ended;
        RoundEvent::GameOver { victory: self.config.victory }
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_ends_and_enters_rest_when_more_rounds_remain() {
        let mut clock = RoundClock::new(RoundConfig { max_rounds: Some(2), round_duration_ticks: 1, rest_duration_ticks: 1, ..Default::default() });
        clock.start_first_round();
        let events = clock.advance();
        assert_eq!(events, vec![RoundEvent::RoundEnded { round: 1 }]);
        assert_eq!(clock.phase, Phase::Rest);
        let events = clock.advance();
        assert_eq!(events, vec![RoundEvent::RoundStarted { round: 2, rest_duration_ticks: 1 }]);
    }

    #[test]
    fn last_round_ending_emits_game_over() {
        let mut clock = RoundClock::new(RoundConfig { max_rounds: Some(1), round_duration_ticks: 1, rest_duration_ticks: 1, ..Default::default() });
        clock.start_first_round();
        let events = clock.advance();
        assert_eq!(events, vec![RoundEvent::RoundEnded { round: 1 }, RoundEvent::GameOver { victory: clock.config.victory }]);
        assert!(clock.is_ended());
    }

    #[test]
    fn unbounded_rounds_never_auto_end() {
        let mut clock = RoundClock::new(RoundConfig { max_rounds: None, round_duration_ticks: 1, rest_duration_ticks: 1, ..Default::default() });
        clock.start_first_round();
        for _ in 0..20 {
            clock.advance();
        }
        assert_ne!(clock.phase, Phase::Ended);
    }
}
