//! The fixed tick sequence (§4.7), expressed as one `FixedUpdate` schedule
//! ordered by [`TickStep`] system sets — each set is exactly one numbered
//! step from the contract:
//!
//! 1. [`TickStep::AdvanceClocks`]    - increment [`crate::common::tick::TickCounter`].
//! 2. [`TickStep::ExpireModifiers`]  - `status::expire_modifiers`.
//! 3. [`TickStep::IngestInputs`]     - drain mailboxes + AI decisions, apply movement/aim.
//! 4. [`TickStep::PrePhysicsActions`] - reload/fire resolution, utility cadences.
//! 5. [`TickStep::PhysicsStep`]      - `avian2d`'s own systems (physics schedule).
//! 6. [`TickStep::ResolveContacts`]  - drain contact events, apply damage/pickups.
//! 7. [`TickStep::AoeAndContinuous`] - field effect per-kind contracts.
//! 8. [`TickStep::Beams`]           - recompute endpoints, apply beam damage.
//! 9. [`TickStep::RuleStep`]        - per-mode advancement, round/rest clock.
//! 10. [`TickStep::FlushDespawns`]   - `entities::flush_despawns`.
//! 11. [`TickStep::Serialize`]       - build the snapshot, hand to the session layer.
//!
//! Each call into this schedule is exactly one fixed tick; drift/catch-up
//! across calls is [`super::MatchEngine::run_tick_loop`]'s job, not this
//! schedule's — `Time<Fixed>`'s own accumulator plays no role since the
//! schedule is run directly rather than through `App::update`.

use bevy::prelude::*;

use crate::common::tick::TickCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum TickStep {
    AdvanceClocks,
    ExpireModifiers,
    IngestInputs,
    PrePhysicsActions,
    PhysicsStep,
    ResolveContacts,
    AoeAndContinuous,
    Beams,
    RuleStep,
    FlushDespawns,
    Serialize,
}

pub fn configure_sets(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (
            TickStep::AdvanceClocks,
            TickStep::ExpireModifiers,
            TickStep::IngestInputs,
            TickStep::PrePhysicsActions,
            TickStep::PhysicsStep,
            TickStep::ResolveContacts,
            TickStep::AoeAndContinuous,
            TickStep::Beams,
            TickStep::RuleStep,
            TickStep::FlushDespawns,
            TickStep::Serialize,
        )
            .chain(),
    );
    app.add_systems(FixedUpdate, advance_clocks.in_set(TickStep::AdvanceClocks));
}

fn advance_clocks(mut counter: ResMut<TickCounter>) {
    counter.advance();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::run_system_once;

    #[test]
    fn advance_clocks_increments_the_counter() {
        let mut world = World::new();
        world.insert_resource(TickCounter::default());
        run_system_once(&mut world, advance_clocks);
        assert_eq!(world.resource::<TickCounter>().0, 1);
    }
}
