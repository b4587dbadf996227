//! Ordinance kinds and their terminal/flight behavior (§4.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdinanceKind {
    Bullet,
    Rocket,
    Grenade,
    Plasma,
    Laser,
    Cannonball,
    Dart,
    Flamethrower,
    Net,
    Mine,
}

impl OrdinanceKind {
    /// Grenades and cannonballs fall under gravity-like drift; everything
    /// else flies flat. Implemented as a constant downward acceleration
    /// applied to `LinearVelocity` each tick, the same way the teacher's
    /// pooled bullets already mutate velocity directly rather than reaching
    /// for a physics-engine gravity scale component.
    pub fn has_arc(self) -> bool {
        matches!(self, OrdinanceKind::Grenade | OrdinanceKind::Cannonball)
    }

    /// Pierces through targets instead of terminating on first contact
    /// (still bounded by the projectile's `BulletEffects::PIERCING` pierce
    /// count, independent of kind).
    pub fn terminates_on_first_contact(self) -> bool {
        !matches!(self, OrdinanceKind::Laser | OrdinanceKind::Flamethrower)
    }

    pub fn default_lifetime_ticks(self, tick_rate_hz: u32) -> u64 {
        let secs: f32 = match self {
            OrdinanceKind::Bullet | OrdinanceKind::Dart => 2.0,
            OrdinanceKind::Rocket | OrdinanceKind::Cannonball => 4.0,
            OrdinanceKind::Grenade => 2.5,
            OrdinanceKind::Plasma => 2.0,
            OrdinanceKind::Laser => 0.15,
            OrdinanceKind::Flamethrower => 0.5,
            OrdinanceKind::Net => 3.0,
            OrdinanceKind::Mine => 120.0,
        };
        (secs * tick_rate_hz as f32).round() as u64
    }

    /// Mines arm after a short fuse rather than on spawn (§4.3).
    pub fn arm_delay_ticks(self, tick_rate_hz: u32) -> u64 {
        match self {
            OrdinanceKind::Mine => tick_rate_hz as u64, // 1s
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_grenades_and_cannonballs_arc() {
        assert!(OrdinanceKind::Grenade.has_arc());
        assert!(OrdinanceKind::Cannonball.has_arc());
        assert!(!OrdinanceKind::Bullet.has_arc());
    }

    #[test]
    fn mines_have_an_arm_delay() {
        assert_eq!(OrdinanceKind::Mine.arm_delay_ticks(60), 60);
        assert_eq!(OrdinanceKind::Bullet.arm_delay_ticks(60), 0);
    }
}
