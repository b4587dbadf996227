//! Weapon & ordinance model (Component C).
//!
//! Firing/reload preconditions are pure functions over
//! `(WeaponDef, WeaponState, now_tick)` (§4.3), unit-testable without a
//! physics world. Ordinance-specific terminal behavior is a `match` over
//! [`OrdinanceKind`] rather than a trait-object hierarchy, per the
//! "collapse to tagged variants" redesign flag — there is no open set of
//! ordinance kinds to extend at runtime.

pub mod ordinance;
pub mod preset;

use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use ordinance::OrdinanceKind;
pub use preset::{weapon_preset, WeaponKind};

bitflags! {
    /// Composable per-projectile modifiers, grounded in the teacher's
    /// `CollisionLayers` bitmask style (§3 "bullet-effect flags").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BulletEffects: u16 {
        const PIERCING   = 1 << 0;
        const HOMING     = 1 << 1;
        const ELECTRIC   = 1 << 2;
        const INCENDIARY = 1 << 3;
        const FREEZING   = 1 << 4;
        const EXPLOSIVE  = 1 << 5;
        const FRAGMENTING = 1 << 6;
    }
}

/// Static definition of a weapon, shared by every instance of that kind —
/// stored once in the preset table (overridable per §6 "weapon preset
/// overrides"), not duplicated per player.
#[derive(Debug, Clone)]
pub struct WeaponDef {
    pub kind: WeaponKind,
    pub base_damage: i32,
    pub fire_rate_hz: f32,
    pub range: f32,
    pub accuracy: f32,
    pub magazine_size: u32,
    pub reload_duration_ticks: u64,
    pub projectile_speed: f32,
    pub ordinance: OrdinanceKind,
    pub effects: BulletEffects,
    pub burst_count: u32,
    pub burst_spread_radians: f32,
}

impl WeaponDef {
    pub fn fire_interval_ticks(&self, tick_rate_hz: u32) -> u64 {
        ((tick_rate_hz as f32 / self.fire_rate_hz.max(0.001)).ceil() as u64).max(1)
    }
}

/// Per-player, per-slot mutable firing state (§4.3).
#[derive(Component, Debug, Clone)]
pub struct WeaponState {
    pub kind: WeaponKind,
    pub magazine: u32,
    pub last_fire_tick: u64,
    pub reload_deadline_tick: Option<u64>,
}

impl WeaponState {
    pub fn new(def: &WeaponDef) -> Self {
        Self { kind: def.kind, magazine: def.magazine_size, last_fire_tick: 0, reload_deadline_tick: None }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_deadline_tick.is_some()
    }

    /// §4.3: "iff current tick-time >= last-fire-time + 1/rate AND current
    /// magazine > 0 AND not reloading."
    pub fn can_fire(&self, def: &WeaponDef, now_tick: u64, tick_rate_hz: u32) -> bool {
        !self.is_reloading()
            && self.magazine > 0
            && now_tick >= self.last_fire_tick + def.fire_interval_ticks(tick_rate_hz)
    }

    /// Consumes one round and advances `last_fire_tick`. Caller is
    /// responsible for having checked [`Self::can_fire`] first.
    pub fn consume_shot(&mut self, now_tick: u64) {
        self.magazine = self.magazine.saturating_sub(1);
        self.last_fire_tick = now_tick;
    }

    /// §4.3: "A reload request starts iff not already reloading and
    /// magazine < max."
    pub fn start_reload(&mut self, def: &WeaponDef, now_tick: u64) -> bool {
        if self.is_reloading() || self.magazine >= def.magazine_size {
            return false;
        }
        self.reload_deadline_tick = Some(now_tick + def.reload_duration_ticks);
        true
    }

    /// Completes a reload if its deadline has passed, filling the magazine
    /// atomically. Returns `true` if a reload completed this call.
    pub fn complete_reload_if_due(&mut self, def: &WeaponDef, now_tick: u64) -> bool {
        match self.reload_deadline_tick {
            Some(deadline) if now_tick >= deadline => {
                self.magazine = def.magazine_size;
                self.reload_deadline_tick = None;
                true
            }
            _ => false,
        }
    }
}

/// Accuracy jitter: uniform angle in a window derived from `1 - accuracy`,
/// centered on the aim direction (§4.3).
pub fn accuracy_jitter_radians(accuracy: f32, unit_roll: f32) -> f32 {
    let half_window = (1.0 - accuracy.clamp(0.0, 1.0)) * std::f32::consts::FRAC_PI_4;
    (unit_roll * 2.0 - 1.0) * half_window
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        crate::engine::systems::pre_physics_actions.in_set(crate::engine::tick::TickStep::PrePhysicsActions),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pistol() -> WeaponDef {
        weapon_preset(WeaponKind::Pistol).clone()
    }

    #[test]
    fn cannot_fire_before_interval_elapses() {
        let def = pistol();
        let mut state = WeaponState::new(&def);
        assert!(state.can_fire(&def, 0, 60));
        state.consume_shot(0);
        assert!(!state.can_fire(&def, 1, 60));
    }

    #[test]
    fn empty_magazine_blocks_fire_until_reload_completes() {
        let def = WeaponDef { magazine_size: 3, reload_duration_ticks: 120, fire_rate_hz: 1000.0, ..pistol() };
        let mut state = WeaponState::new(&def);
        for t in 0..3 {
            assert!(state.can_fire(&def, t, 60));
            state.consume_shot(t);
        }
        assert!(!state.can_fire(&def, 3, 60));
        assert!(state.start_reload(&def, 3));
        assert!(!state.complete_reload_if_due(&def, 100));
        assert!(state.complete_reload_if_due(&def, 123));
        assert_eq!(state.magazine, 3);
        assert!(state.can_fire(&def, 123, 60));
    }

    #[test]
    fn reload_refused_while_already_reloading() {
        let def = pistol();
        let mut state = WeaponState::new(&def);
        state.reload_deadline_tick = Some(10);
        assert!(!state.start_reload(&def, 5));
    }

    #[test]
    fn max_accuracy_yields_no_jitter() {
        assert_eq!(accuracy_jitter_radians(1.0, 0.0), 0.0);
        assert_eq!(accuracy_jitter_radians(1.0, 1.0), 0.0);
    }
}
