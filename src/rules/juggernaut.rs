//! Juggernaut mode (§4.5): one designated VIP player per team; eliminating
//! the opposing juggernaut scores; re-selection is deterministic.

use crate::common::ids::PlayerId;

/// Deterministic next-juggernaut policy: "next-alive-in-team-order at
/// respawn boundary" (§4.5). `roster` is the team's player ids in a stable
/// join order; `current` is the juggernaut that just died (or `None` at
/// match start).
pub fn select_next_juggernaut(roster: &[PlayerId], alive: impl Fn(PlayerId) -> bool, current: Option<PlayerId>) -> Option<PlayerId> {
    if roster.is_empty() {
        return None;
    }
    let start = match current {
        Some(id) => roster.iter().position(|&p| p == id).map(|i| i + 1).unwrap_or(0),
        None => 0,
    };
    (0..roster.len()).map(|offset| roster[(start + offset) % roster.len()]).find(|&p| alive(p))
}

/// Points awarded for eliminating the opposing juggernaut (§9 open
/// question, resolved in `DESIGN.md`).
pub const JUGGERNAUT_KILL_SCORE: u32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_to_next_alive_player_in_roster_order() {
        let roster = vec![PlayerId::from_raw_test(1), PlayerId::from_raw_test(2), PlayerId::from_raw_test(3)];
        let next = select_next_juggernaut(&roster, |_| true, Some(PlayerId::from_raw_test(1)));
        assert_eq!(next, Some(PlayerId::from_raw_test(2)));
    }

    #[test]
    fn skips_dead_players_and_wraps_around() {
        let roster = vec![PlayerId::from_raw_test(1), PlayerId::from_raw_test(2), PlayerId::from_raw_test(3)];
        let next = select_next_juggernaut(&roster, |p| p == PlayerId::from_raw_test(1), Some(PlayerId::from_raw_test(3)));
        assert_eq!(next, Some(PlayerId::from_raw_test(1)));
    }

    #[test]
    fn empty_roster_has_no_next_juggernaut() {
        assert_eq!(select_next_juggernaut(&[], |_| true, None), None);
    }
}
