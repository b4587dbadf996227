//! Stable, wire-safe entity ids.
//!
//! `spec.md` §3 requires ids to be monotone within a match with zero reserved
//! and never reused; `bevy::Entity` recycles its index on despawn, so it
//! cannot serve as the wire id directly. Each id kind below is a thin
//! `NonZeroU64` newtype, generalizing the teacher's single-purpose handle
//! newtypes (`BulletEntity`, `PlayerEntity`) from "exactly one" to "N,
//! allocated monotonically".

use bevy::prelude::Resource;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
        pub struct $name(NonZeroU64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0.get()
            }

            #[cfg(test)]
            pub fn default_for_test() -> Self {
                Self(NonZeroU64::new(1).unwrap())
            }

            #[cfg(test)]
            pub fn from_raw_test(n: u64) -> Self {
                Self(NonZeroU64::new(n).expect("test id must be nonzero"))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(PlayerId);
entity_id!(ProjectileId);
entity_id!(ObstacleId);
entity_id!(BeamId);
entity_id!(FieldEffectId);
entity_id!(UtilityId);
entity_id!(ObjectiveId);

/// Per-match, per-kind monotonic allocator. Zero is never handed out.
///
/// One allocator instance per id kind, per match — matches `spec.md` §5
/// ("The entity id allocator is per-match").
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: AtomicU64::new(1) }
    }
}

impl IdAllocator {
    pub fn alloc(&self) -> NonZeroU64 {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        NonZeroU64::new(raw).expect("allocator started below 1")
    }
}

/// Every id kind shares one allocator family so the "monotone within a
/// match" invariant reads naturally per kind without cross-kind coupling.
#[derive(Resource, Debug, Default)]
pub struct IdAllocators {
    pub players: IdAllocator,
    pub projectiles: IdAllocator,
    pub obstacles: IdAllocator,
    pub beams: IdAllocator,
    pub field_effects: IdAllocator,
    pub utility: IdAllocator,
    pub objectives: IdAllocator,
}

impl IdAllocators {
    pub fn alloc_player(&self) -> PlayerId {
        PlayerId(self.players.alloc())
    }
    pub fn alloc_projectile(&self) -> ProjectileId {
        ProjectileId(self.projectiles.alloc())
    }
    pub fn alloc_obstacle(&self) -> ObstacleId {
        ObstacleId(self.obstacles.alloc())
    }
    pub fn alloc_beam(&self) -> BeamId {
        BeamId(self.beams.alloc())
    }
    pub fn alloc_field_effect(&self) -> FieldEffectId {
        FieldEffectId(self.field_effects.alloc())
    }
    pub fn alloc_utility(&self) -> UtilityId {
        UtilityId(self.utility.alloc())
    }
    pub fn alloc_objective(&self) -> ObjectiveId {
        ObjectiveId(self.objectives.alloc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn allocator_skips_zero_and_is_monotone() {
        let alloc = IdAllocator::default();
        let a = alloc.alloc().get();
        let b = alloc.alloc().get();
        assert_ne!(a, 0);
        assert_ne!(b, 0);
        assert!(b > a);
    }

    proptest! {
        // §3: ids are monotone within a match with zero never reused, for
        // any number of allocations a match might make.
        #[test]
        fn allocations_are_always_nonzero_and_strictly_increasing(count in 0usize..500) {
            let alloc = IdAllocator::default();
            let mut prev = 0;
            for _ in 0..count {
                let next = alloc.alloc().get();
                prop_assert!(next > prev);
                prev = next;
            }
        }
    }
}
