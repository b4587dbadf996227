//! Built-in weapon preset table (§4.3, §9 "canonical constants" decision
//! recorded in `DESIGN.md`).

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::ordinance::OrdinanceKind;
use super::{BulletEffects, WeaponDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Pistol,
    Rifle,
    ShotgunBurst,
    RocketLauncher,
    GrenadeLauncher,
    PlasmaRifle,
    LaserRifle,
    Flamethrower,
    NetGun,
    MineLayer,
}

fn table() -> &'static [(WeaponKind, WeaponDef)] {
    static TABLE: OnceLock<Vec<(WeaponKind, WeaponDef)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            (
                WeaponKind::Pistol,
                WeaponDef {
                    kind: WeaponKind::Pistol,
                    base_damage: 18,
                    fire_rate_hz: 4.0,
                    range: 700.0,
                    accuracy: 0.92,
                    magazine_size: 12,
                    reload_duration_ticks: 90,
                    projectile_speed: 900.0,
                    ordinance: OrdinanceKind::Bullet,
                    effects: BulletEffects::empty(),
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
            (
                WeaponKind::Rifle,
                WeaponDef {
                    kind: WeaponKind::Rifle,
                    base_damage: 22,
                    fire_rate_hz: 9.0,
                    range: 1100.0,
                    accuracy: 0.85,
                    magazine_size: 30,
                    reload_duration_ticks: 150,
                    projectile_speed: 1400.0,
                    ordinance: OrdinanceKind::Bullet,
                    effects: BulletEffects::empty(),
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
            (
                WeaponKind::ShotgunBurst,
                WeaponDef {
                    kind: WeaponKind::ShotgunBurst,
                    base_damage: 9,
                    fire_rate_hz: 1.1,
                    range: 350.0,
                    accuracy: 0.6,
                    magazine_size: 6,
                    reload_duration_ticks: 180,
                    projectile_speed: 1100.0,
                    ordinance: OrdinanceKind::Bullet,
                    effects: BulletEffects::empty(),
                    burst_count: 8,
                    burst_spread_radians: 0.35,
                },
            ),
            (
                WeaponKind::RocketLauncher,
                WeaponDef {
                    kind: WeaponKind::RocketLauncher,
                    base_damage: 80,
                    fire_rate_hz: 0.8,
                    range: 1400.0,
                    accuracy: 0.97,
                    magazine_size: 4,
                    reload_duration_ticks: 210,
                    projectile_speed: 700.0,
                    ordinance: OrdinanceKind::Rocket,
                    effects: BulletEffects::EXPLOSIVE,
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
            (
                WeaponKind::GrenadeLauncher,
                WeaponDef {
                    kind: WeaponKind::GrenadeLauncher,
                    base_damage: 65,
                    fire_rate_hz: 1.2,
                    range: 900.0,
                    accuracy: 0.9,
                    magazine_size: 5,
                    reload_duration_ticks: 180,
                    projectile_speed: 550.0,
                    ordinance: OrdinanceKind::Grenade,
                    effects: BulletEffects::EXPLOSIVE | BulletEffects::FRAGMENTING,
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
            (
                WeaponKind::PlasmaRifle,
                WeaponDef {
                    kind: WeaponKind::PlasmaRifle,
                    base_damage: 16,
                    fire_rate_hz: 6.0,
                    range: 1000.0,
                    accuracy: 0.88,
                    magazine_size: 24,
                    reload_duration_ticks: 140,
                    projectile_speed: 1200.0,
                    ordinance: OrdinanceKind::Plasma,
                    effects: BulletEffects::ELECTRIC,
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
            (
                WeaponKind::LaserRifle,
                WeaponDef {
                    kind: WeaponKind::LaserRifle,
                    base_damage: 6,
                    fire_rate_hz: 20.0,
                    range: 1300.0,
                    accuracy: 0.99,
                    magazine_size: 80,
                    reload_duration_ticks: 120,
                    projectile_speed: 0.0,
                    ordinance: OrdinanceKind::Laser,
                    effects: BulletEffects::PIERCING,
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
            (
                WeaponKind::Flamethrower,
                WeaponDef {
                    kind: WeaponKind::Flamethrower,
                    base_damage: 4,
                    fire_rate_hz: 15.0,
                    range: 260.0,
                    accuracy: 0.7,
                    magazine_size: 200,
                    reload_duration_ticks: 200,
                    projectile_speed: 450.0,
                    ordinance: OrdinanceKind::Flamethrower,
                    effects: BulletEffects::INCENDIARY,
                    burst_count: 1,
                    burst_spread_radians: 0.15,
                },
            ),
            (
                WeaponKind::NetGun,
                WeaponDef {
                    kind: WeaponKind::NetGun,
                    base_damage: 0,
                    fire_rate_hz: 0.9,
                    range: 500.0,
                    accuracy: 0.95,
                    magazine_size: 3,
                    reload_duration_ticks: 200,
                    projectile_speed: 650.0,
                    ordinance: OrdinanceKind::Net,
                    effects: BulletEffects::empty(),
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
            (
                WeaponKind::MineLayer,
                WeaponDef {
                    kind: WeaponKind::MineLayer,
                    base_damage: 90,
                    fire_rate_hz: 1.0,
                    range: 40.0,
                    accuracy: 1.0,
                    magazine_size: 3,
                    reload_duration_ticks: 240,
                    projectile_speed: 0.0,
                    ordinance: OrdinanceKind::Mine,
                    effects: BulletEffects::EXPLOSIVE,
                    burst_count: 1,
                    burst_spread_radians: 0.0,
                },
            ),
        ]
    })
}

pub fn weapon_preset(kind: WeaponKind) -> &'static WeaponDef {
    table()
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, def)| def)
        .expect("every WeaponKind variant has a preset table entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_resolves_a_preset() {
        for kind in [
            WeaponKind::Pistol,
            WeaponKind::Rifle,
            WeaponKind::ShotgunBurst,
            WeaponKind::RocketLauncher,
            WeaponKind::GrenadeLauncher,
            WeaponKind::PlasmaRifle,
            WeaponKind::LaserRifle,
            WeaponKind::Flamethrower,
            WeaponKind::NetGun,
            WeaponKind::MineLayer,
        ] {
            let def = weapon_preset(kind);
            assert_eq!(def.kind, kind);
        }
    }
}
