//! The match's own logical clock (§4.7 step 1).
//!
//! Kept separate from `Time<Fixed>` (which drives *when* a fixed step runs)
//! because `TickCounter` is what gets serialized into snapshots and handed
//! to the AI/rng streams — it must be a plain monotone integer, not a
//! duration.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct TickCounter(pub u64);

impl TickCounter {
    pub fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}
