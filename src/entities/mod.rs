//! Entity registry (Component B).
//!
//! Generalizes the teacher's single-purpose handle newtypes (`BulletEntity`,
//! `PlayerEntity`) to N-keyed typed collections. Every cross-entity reference
//! elsewhere in the crate goes through a [`registry::Registry`] lookup by a
//! stable id from [`crate::common::ids`], never by raw `Entity` or pointer —
//! this is what keeps mid-tick destruction safe (deferred via
//! [`PendingDespawn`], flushed once at the documented point in the tick).

pub mod beams;
pub mod contacts;
pub mod field_effects;
pub mod objectives;
pub mod obstacles;
pub mod players;
pub mod projectiles;
pub mod registry;
pub mod seeding;
pub mod utility;

use bevy::prelude::*;

pub use registry::Registry;

/// Marks an entity as logically dead; the engine's flush step (tick step 10)
/// despawns it and removes it from the [`Registry`]. Nothing may act on an
/// entity carrying this component after it is attached.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

pub fn plugin(app: &mut App) {
    app.init_resource::<Registry>();
    app.init_resource::<crate::common::ids::IdAllocators>();
    app.init_resource::<utility::TeleportPadPositions>();
    app.add_systems(
        FixedUpdate,
        (utility::advance_turrets, (utility::tick_teleport_pads, utility::apply_teleports).chain(), utility::advance_defense_lasers)
            .in_set(crate::engine::tick::TickStep::PrePhysicsActions),
    );
    app.add_systems(
        FixedUpdate,
        projectiles::advance_projectiles
            .after(crate::engine::systems::pre_physics_actions)
            .in_set(crate::engine::tick::TickStep::PrePhysicsActions),
    );
    app.add_systems(
        FixedUpdate,
        field_effects::apply_field_effects.in_set(crate::engine::tick::TickStep::AoeAndContinuous),
    );
    app.add_systems(FixedUpdate, beams::update_beams.in_set(crate::engine::tick::TickStep::Beams));
}

/// Flushes every entity marked [`PendingDespawn`]: despawns it and drops it
/// from the registry. Run once, at step 10 of the tick — never interleaved
/// with steps 5-9's iteration.
pub fn flush_despawns(
    mut commands: Commands,
    mut registry: ResMut<Registry>,
    query: Query<Entity, With<PendingDespawn>>,
) {
    for entity in &query {
        registry.forget(entity);
        commands.entity(entity).despawn();
    }
}
