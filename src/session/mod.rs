//! Wire message types (Component I, §4.9, §6).
//!
//! Session lifecycle itself — join, initial state, snapshot/event
//! fan-out, disconnect — lives in [`crate::lobby`], wired directly
//! against [`crate::engine::MatchEngine`]'s broadcast channel; this
//! module only carries the [`messages`] wire format both sides share.

pub mod messages;
