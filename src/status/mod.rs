//! Status & attribute system (Component D, §4.4).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    MoveSpeed,
    DamageMult,
    FireRateMult,
    VisionRange,
    Invulnerability,
    IsVip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModOp {
    Add,
    Multiply,
    Set,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusModifier {
    pub key: AttributeKey,
    pub op: ModOp,
    pub magnitude: f32,
    pub expiry_tick: u64,
    /// Display-only provenance (weapon name, field effect kind, …).
    pub source: &'static str,
}

/// Ordered set of active modifications for one player. §4.4: "Expired
/// modifications are removed at the start of each tick" (step 2).
#[derive(Component, Debug, Clone, Default)]
pub struct StatusEffects {
    pub mods: Vec<StatusModifier>,
}

impl StatusEffects {
    pub fn push(&mut self, modifier: StatusModifier) {
        self.mods.push(modifier);
    }

    /// Tick step 2: drop everything whose expiry has passed.
    pub fn expire(&mut self, now_tick: u64) {
        self.mods.retain(|m| m.expiry_tick > now_tick);
    }

    pub fn has(&self, key: AttributeKey) -> bool {
        self.mods.iter().any(|m| m.key == key)
    }
}

/// Base, un-modified attribute values for a player.
#[derive(Debug, Clone, Copy)]
pub struct Attributes {
    pub move_speed: f32,
    pub damage_mult: f32,
    pub fire_rate_mult: f32,
    pub vision_range: f32,
    pub invulnerable: bool,
    pub is_vip: bool,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            move_speed: 220.0,
            damage_mult: 1.0,
            fire_rate_mult: 1.0,
            vision_range: 900.0,
            invulnerable: false,
            is_vip: false,
        }
    }
}

/// Composes `base` with `mods` in the order §4.4 mandates: sums first, then
/// multiplies, then sets. This is the one place composition-order bugs
/// hide, hence it's a pure function, tested in isolation from any ECS
/// machinery.
pub fn effective(base: Attributes, mods: &[StatusModifier]) -> Attributes {
    let mut out = base;
    apply_pass(&mut out, mods, ModOp::Add);
    apply_pass(&mut out, mods, ModOp::Multiply);
    apply_pass(&mut out, mods, ModOp::Set);
    out
}

fn apply_pass(out: &mut Attributes, mods: &[StatusModifier], pass: ModOp) {
    for m in mods.iter().filter(|m| m.op == pass) {
        let field = match m.key {
            AttributeKey::MoveSpeed => &mut out.move_speed,
            AttributeKey::DamageMult => &mut out.damage_mult,
            AttributeKey::FireRateMult => &mut out.fire_rate_mult,
            AttributeKey::VisionRange => &mut out.vision_range,
            AttributeKey::Invulnerability => {
                out.invulnerable = out.invulnerable || m.magnitude > 0.0;
                continue;
            }
            AttributeKey::IsVip => {
                out.is_vip = out.is_vip || m.magnitude > 0.0;
                continue;
            }
        };
        *field = match pass {
            ModOp::Add => *field + m.magnitude,
            ModOp::Multiply => *field * m.magnitude,
            ModOp::Set => m.magnitude,
        };
    }
}

/// Re-applies physics-affecting statuses (slow/root/freeze, all expressed as
/// `move_speed` mods) to a body's velocity scale every tick, per §4.4's
/// explicit "must be re-applied every tick, not cached on the body".
pub fn physics_speed_scale(base: Attributes, mods: &[StatusModifier]) -> f32 {
    let e = effective(base, mods);
    if e.move_speed <= 0.0 {
        0.0
    } else {
        e.move_speed / base.move_speed.max(f32::EPSILON)
    }
}

/// Tick step 2 system: expire modifiers on every player.
pub fn expire_modifiers(now_tick: Res<crate::common::tick::TickCounter>, mut query: Query<&mut StatusEffects>) {
    for mut effects in &mut query {
        effects.expire(now_tick.0);
    }
}

/// `expire_modifiers` is registered directly by `MatchEngine::new` rather
/// than here, since it's the one system every match needs regardless of
/// which other plugins run — keeping it there makes the tick's minimum
/// viable schedule visible in one place.
pub fn plugin(_app: &mut App) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(key: AttributeKey, op: ModOp, magnitude: f32) -> StatusModifier {
        StatusModifier { key, op, magnitude, expiry_tick: 100, source: "test" }
    }

    #[test]
    fn sums_then_multiplies_then_sets() {
        let base = Attributes { move_speed: 200.0, ..Default::default() };
        let mods = vec![
            modifier(AttributeKey::MoveSpeed, ModOp::Add, 50.0),
            modifier(AttributeKey::MoveSpeed, ModOp::Multiply, 2.0),
            modifier(AttributeKey::MoveSpeed, ModOp::Set, 10.0),
        ];
        // Sum then multiply would give 500, but Set must win last.
        let eff = effective(base, &mods);
        assert_eq!(eff.move_speed, 10.0);
    }

    #[test]
    fn multiply_applies_after_sum() {
        let base = Attributes { move_speed: 100.0, ..Default::default() };
        let mods =
            vec![modifier(AttributeKey::MoveSpeed, ModOp::Add, 50.0), modifier(AttributeKey::MoveSpeed, ModOp::Multiply, 2.0)];
        let eff = effective(base, &mods);
        assert_eq!(eff.move_speed, 300.0);
    }

    #[test]
    fn expiry_drops_stale_modifiers() {
        let mut effects = StatusEffects::default();
        effects.push(modifier(AttributeKey::MoveSpeed, ModOp::Add, 10.0));
        effects.mods[0].expiry_tick = 5;
        effects.expire(10);
        assert!(effects.mods.is_empty());
    }

    #[test]
    fn zero_effective_speed_fully_roots() {
        let base = Attributes { move_speed: 200.0, ..Default::default() };
        let mods = vec![modifier(AttributeKey::MoveSpeed, ModOp::Set, 0.0)];
        assert_eq!(physics_speed_scale(base, &mods), 0.0);
    }
}
