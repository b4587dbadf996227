//! Zombie defense mode (§4.5): AI zombies spawn in waves; humans share a
//! team; score = waves survived.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveState {
    Spawning,
    Active,
    AllDead,
    Resting,
}

#[derive(Debug, Clone, Copy)]
pub struct WaveCurve {
    pub base_zombie_count: u32,
    pub count_step_per_wave: u32,
    pub base_strength_multiplier: f32,
    pub strength_step_per_wave: f32,
    pub rest_duration_ticks: u64,
}

impl Default for WaveCurve {
    fn default() -> Self {
        Self {
            base_zombie_count: 4,
            count_step_per_wave: 2,
            base_strength_multiplier: 1.0,
            strength_step_per_wave: 0.12,
            rest_duration_ticks: 60 * 8,
        }
    }
}

impl WaveCurve {
    pub fn zombie_count(&self, wave_number: u32) -> u32 {
        self.base_zombie_count + self.count_step_per_wave * wave_number.saturating_sub(1)
    }

    pub fn strength_multiplier(&self, wave_number: u32) -> f32 {
        self.base_strength_multiplier + self.strength_step_per_wave * wave_number.saturating_sub(1) as f32
    }
}

#[derive(Debug, Clone)]
pub struct ZombieDefense {
    pub wave_number: u32,
    pub state: WaveState,
    pub zombies_alive: u32,
    pub rest_remaining_ticks: u64,
}

impl Default for ZombieDefense {
    fn default() -> Self {
        Self { wave_number: 0, state: WaveState::Resting, zombies_alive: 0, rest_remaining_ticks: 0 }
    }
}

impl ZombieDefense {
    /// Spawning -> Active once spawns are complete; Active -> AllDead when
    /// the last zombie dies; AllDead -> Resting -> next wave's Spawning.
    pub fn start_wave(&mut self, curve: &WaveCurve) {
        self.wave_number += 1;
        self.zombies_alive = curve.zombie_count(self.wave_number);
        self.state = WaveState::Active;
    }

    pub fn on_zombie_killed(&mut self) {
        if self.zombies_alive > 0 {
            self.zombies_alive -= 1;
        }
        if self.zombies_alive == 0 {
            self.state = WaveState::AllDead;
        }
    }

    /// Returns `true` when the rest period has elapsed and the next wave
    /// should start.
    pub fn advance_rest(&mut self, curve: &WaveCurve) -> bool {
        match self.state {
            WaveState::AllDead => {
                self.state = WaveState::Resting;
                self.rest_remaining_ticks = curve.rest_duration_ticks;
                false
            }
            WaveState::Resting => {
                self.rest_remaining_ticks = self.rest_remaining_ticks.saturating_sub(1);
                self.rest_remaining_ticks == 0
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_curve_scales_count_and_strength() {
        let curve = WaveCurve::default();
        assert_eq!(curve.zombie_count(1), 4);
        assert_eq!(curve.zombie_count(3), 8);
        assert!(curve.strength_multiplier(3) > curve.strength_multiplier(1));
    }

    #[test]
    fn last_zombie_death_transitions_to_all_dead() {
        let mut defense = ZombieDefense { zombies_alive: 1, state: WaveState::Active, ..Default::default() };
        defense.on_zombie_killed();
        assert_eq!(defense.state, WaveState::AllDead);
        assert_eq!(defense.zombies_alive, 0);
    }

    #[test]
    fn rest_elapses_into_next_wave_start_signal() {
        let curve = WaveCurve { rest_duration_ticks: 2, ..Default::default() };
        let mut defense = ZombieDefense { state: WaveState::AllDead, ..Default::default() };
        assert!(!defense.advance_rest(&curve));
        assert_eq!(defense.state, WaveState::Resting);
        assert!(!defense.advance_rest(&curve));
        assert!(defense.advance_rest(&curve));
    }
}
