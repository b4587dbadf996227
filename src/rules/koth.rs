//! King of the Hill zone state machine (§4.5), expressed as a pure function
//! over the current state and this tick's team presence so the whole
//! 5-state transition table is unit-testable without physics.

use crate::common::layers::TeamId;
use crate::entities::objectives::KothZoneState;

/// Which teams (if any) are present in the zone this tick. `None` means
/// nobody is present; `Some(team)` means exactly one team is present;
/// `Contested` presence (more than one team) is signaled by passing
/// `presence.len() > 1` — callers pass the distinct team set they observed.
pub fn advance_zone(
    state: KothZoneState,
    progress: f32,
    teams_present: &[TeamId],
    dt_secs: f32,
    capture_time_secs: f32,
) -> (KothZoneState, f32) {
    let exclusive_team = match teams_present {
        [] => None,
        [single] => Some(*single),
        _ => None, // more than one distinct team: contested
    };
    let contested = teams_present.len() > 1;

    match state {
        KothZoneState::Neutral => match exclusive_team {
            Some(team) if !contested => (KothZoneState::Capturing { team }, 0.0),
            _ => (KothZoneState::Neutral, 0.0),
        },
        KothZoneState::Capturing { team } => {
            if contested {
                (KothZoneState::Contested, progress)
            } else if exclusive_team == Some(team) {
                let next = (progress + dt_secs / capture_time_secs.max(f32::EPSILON)).min(1.0);
                if next >= 1.0 {
                    (KothZoneState::Controlled { team }, 1.0)
                } else {
                    (KothZoneState::Capturing { team }, next)
                }
            } else if exclusive_team.is_none() {
                (KothZoneState::Capturing { team }, (progress - dt_secs / capture_time_secs.max(f32::EPSILON)).max(0.0))
            } else {
                // a different single team took over exclusive presence
                (KothZoneState::Capturing { team: exclusive_team.unwrap() }, 0.0)
            }
        }
        KothZoneState::Contested => {
            if contested {
                (KothZoneState::Contested, progress)
            } else if let Some(team) = exclusive_team {
                (KothZoneState::Capturing { team }, progress)
            } else {
                (KothZoneState::Neutral, (progress - dt_secs / capture_time_secs.max(f32::EPSILON)).max(0.0))
            }
        }
        KothZoneState::Controlled { team } => {
            if contested {
                (KothZoneState::Contested, 1.0)
            } else {
                (KothZoneState::Controlled { team }, 1.0)
            }
        }
    }
}

/// Score accrues per tick per controlled zone to the owning team (§4.5).
pub fn score_accrual(state: KothZoneState) -> Option<TeamId> {
    match state {
        KothZoneState::Controlled { team } => Some(team),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_zone_starts_capturing_on_exclusive_presence() {
        let (state, progress) = advance_zone(KothZoneState::Neutral, 0.0, &[1], 0.1, 3.0);
        assert_eq!(state, KothZoneState::Capturing { team: 1 });
        assert_eq!(progress, 0.0);
    }

    #[test]
    fn capturing_freezes_progress_when_contested() {
        let (state, progress) = advance_zone(KothZoneState::Capturing { team: 1 }, 0.5, &[1, 2], 0.1, 3.0);
        assert_eq!(state, KothZoneState::Contested);
        assert_eq!(progress, 0.5);
    }

    #[test]
    fn capture_completes_after_capture_time() {
        let mut state = KothZoneState::Capturing { team: 1 };
        let mut progress = 0.0;
        for _ in 0..30 {
            (state, progress) = advance_zone(state, progress, &[1], 0.1, 3.0);
        }
        assert_eq!(state, KothZoneState::Controlled { team: 1 });
        assert_eq!(progress, 1.0);
    }

    #[test]
    fn controlled_zone_becomes_contested_on_intrusion() {
        let (state, _) = advance_zone(KothZoneState::Controlled { team: 1 }, 1.0, &[1, 2], 0.1, 3.0);
        assert_eq!(state, KothZoneState::Contested);
    }

    #[test]
    fn unoccupied_progress_decays_toward_zero() {
        let (state, progress) = advance_zone(KothZoneState::Capturing { team: 1 }, 0.2, &[], 0.1, 3.0);
        assert_eq!(state, KothZoneState::Capturing { team: 1 });
        assert!(progress < 0.2);
    }

    #[test]
    fn only_controlled_zones_accrue_score() {
        assert_eq!(score_accrual(KothZoneState::Controlled { team: 3 }), Some(3));
        assert_eq!(score_accrual(KothZoneState::Contested), None);
    }
}
