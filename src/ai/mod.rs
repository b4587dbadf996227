//! AI controller (Component F, §4.6).
//!
//! Every AI decision is a pure function of world state plus a per-AI RNG
//! stream seeded from the match seed and the AI's player id
//! ([`crate::common::rng`]) — the determinism requirement in §4.6 ("must
//! not observe wall-clock time") falls out for free since the only inputs
//! are the tick counter and this stream.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::common::ids::PlayerId;
use crate::common::layers::TeamId;
use crate::session::messages::PlayerInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Wander,
    Engage,
    Flee,
    ObjectiveSeek,
}

/// Zombie-mode AI reuses [`decide`] with this profile instead of a separate
/// code path (§9 "collapse to tagged variants").
#[derive(Debug, Clone, Copy)]
pub struct BehaviorProfile {
    pub allow_flee: bool,
    pub allow_objective_seek: bool,
    pub flee_health_fraction: f32,
    pub engage_range: f32,
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self { allow_flee: true, allow_objective_seek: true, flee_health_fraction: 0.25, engage_range: 500.0 }
    }
}

impl BehaviorProfile {
    /// Always engage, never flee — zombies ignore self-preservation (§4.6).
    pub fn zombie() -> Self {
        Self { allow_flee: false, allow_objective_seek: false, flee_health_fraction: 0.0, engage_range: 9999.0 }
    }
}

#[derive(Component, Debug, Clone)]
pub struct AiState {
    pub player: PlayerId,
    pub behavior: Behavior,
    pub rng: StdRng,
    pub profile: BehaviorProfile,
    pub decision_interval_ticks: u64,
    pub last_decision: PlayerInput,
}

impl AiState {
    pub fn new(player: PlayerId, match_seed: u64, profile: BehaviorProfile, decision_interval_ticks: u64) -> Self {
        Self {
            player,
            behavior: Behavior::Wander,
            rng: crate::common::rng::stream_rng(match_seed, player.get()),
            profile,
            decision_interval_ticks: decision_interval_ticks.max(1),
            last_decision: PlayerInput::default(),
        }
    }

    pub fn should_decide(&self, now_tick: u64) -> bool {
        now_tick % self.decision_interval_ticks == 0
    }
}

/// Perception context handed to [`decide`] — everything the AI is allowed
/// to see, gathered by the engine via the same physics queries available to
/// the rest of the tick (raycast line-of-sight, overlap_circle threat
/// detection).
pub struct AiCtx {
    pub self_position: Vec2,
    pub self_team: TeamId,
    pub self_health_fraction: f32,
    pub nearest_enemy: Option<(Vec2, f32)>,
    pub has_line_of_sight_to_nearest_enemy: bool,
    pub objective_direction: Option<Vec2>,
}

/// Produces the same input shape a human submits (§4.6). Deterministic
/// given `ctx` and the AI's own RNG stream.
pub fn decide(state: &mut AiState, ctx: &AiCtx) -> PlayerInput {
    state.behavior = next_behavior(state.behavior, &state.profile, ctx);

    let input = match state.behavior {
        Behavior::Wander => wander_input(&mut state.rng),
        Behavior::Engage => engage_input(ctx),
        Behavior::Flee => flee_input(ctx),
        Behavior::ObjectiveSeek => objective_input(ctx),
    };

    state.last_decision = input;
    input
}

fn next_behavior(current: Behavior, profile: &BehaviorProfile, ctx: &AiCtx) -> Behavior {
    if profile.allow_flee && ctx.self_health_fraction <= profile.flee_health_fraction && ctx.nearest_enemy.is_some() {
        return Behavior::Flee;
    }
    if let Some((_, distance)) = ctx.nearest_enemy {
        if distance <= profile.engage_range && ctx.has_line_of_sight_to_nearest_enemy {
            return Behavior::Engage;
        }
    }
    if profile.allow_objective_seek && ctx.objective_direction.is_some() {
        return Behavior::ObjectiveSeek;
    }
    if current == Behavior::Flee || current == Behavior::Engage {
        Behavior::Wander
    } else {
        current
    }
}

fn wander_input(rng: &mut StdRng) -> PlayerInput {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let dir = Vec2::new(angle.cos(), angle.sin());
    PlayerInput { move_x: dir.x, move_y: dir.y, world: dir * 200.0, ..Default::default() }
}

fn engage_input(ctx: &AiCtx) -> PlayerInput {
    let Some((enemy_pos, _)) = ctx.nearest_enemy else {
        return PlayerInput::default();
    };
    let aim = (enemy_pos - ctx.self_position).normalize_or_zero();
    PlayerInput { move_x: aim.x * 0.3, move_y: aim.y * 0.3, world: enemy_pos, fire: ctx.has_line_of_sight_to_nearest_enemy, ..Default::default() }
}

fn flee_input(ctx: &AiCtx) -> PlayerInput {
    let Some((enemy_pos, _)) = ctx.nearest_enemy else {
        return PlayerInput::default();
    };
    let away = (ctx.self_position - enemy_pos).normalize_or_zero();
    PlayerInput { move_x: away.x, move_y: away.y, world: ctx.self_position + away * 200.0, ..Default::default() }
}

fn objective_input(ctx: &AiCtx) -> PlayerInput {
    let dir = ctx.objective_direction.unwrap_or(Vec2::ZERO);
    PlayerInput { move_x: dir.x, move_y: dir.y, world: ctx.self_position + dir * 200.0, ..Default::default() }
}

/// AI has no system of its own: `decide` is called inline from
/// `engine::systems::ingest_inputs` (tick step 3), since AI and human
/// input converge on the same `PlayerIntent` write in that one pass.
pub fn plugin(_app: &mut App) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(health: f32, enemy: Option<(Vec2, f32)>, los: bool) -> AiCtx {
        AiCtx { self_position: Vec2::ZERO, self_team: 1, self_health_fraction: health, nearest_enemy: enemy, has_line_of_sight_to_nearest_enemy: los, objective_direction: None }
    }

    #[test]
    fn low_health_with_enemy_nearby_triggers_flee() {
        let mut state = AiState::new(PlayerId::default_for_test(), 1, BehaviorProfile::default(), 1);
        let input = decide(&mut state, &ctx(0.1, Some((Vec2::new(10.0, 0.0), 10.0)), true));
        assert_eq!(state.behavior, Behavior::Flee);
        assert!(input.move_x < 0.0);
    }

    #[test]
    fn zombie_profile_never_flees() {
        let mut state = AiState::new(PlayerId::default_for_test(), 1, BehaviorProfile::zombie(), 1);
        decide(&mut state, &ctx(0.01, Some((Vec2::new(10.0, 0.0), 10.0)), true));
        assert_ne!(state.behavior, Behavior::Flee);
    }

    #[test]
    fn decision_cadence_is_decimated() {
        let state = AiState::new(PlayerId::default_for_test(), 1, BehaviorProfile::default(), 4);
        assert!(state.should_decide(0));
        assert!(!state.should_decide(1));
        assert!(state.should_decide(4));
    }

    #[test]
    fn same_seed_produces_same_wander_sequence() {
        let mut a = AiState::new(PlayerId::default_for_test(), 42, BehaviorProfile::default(), 1);
        let mut b = AiState::new(PlayerId::default_for_test(), 42, BehaviorProfile::default(), 1);
        let empty = ctx(1.0, None, false);
        let ia = decide(&mut a, &empty);
        let ib = decide(&mut b, &empty);
        assert_eq!(ia.move_x, ib.move_x);
        assert_eq!(ia.move_y, ib.move_y);
    }
}
