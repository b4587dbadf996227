//! Per-match event bus (§4.10 design notes: "separate event bus per match,
//! drained after the snapshot; events are values, not callbacks").
//!
//! Tick-step systems push [`ServerMessage`] values in here as they notice
//! point-in-time occurrences (a kill, a round boundary); [`MatchEngine`]
//! drains the whole queue once per tick, after the schedule runs, and
//! forwards each value to every session's broadcast receiver in the same
//! order they were pushed.

use bevy::prelude::*;

use crate::session::messages::ServerMessage;

#[derive(Resource, Default)]
pub struct MatchEvents(Vec<ServerMessage>);

impl MatchEvents {
    pub fn push(&mut self, message: ServerMessage) {
        self.0.push(message);
    }

    pub fn drain(&mut self) -> Vec<ServerMessage> {
        std::mem::take(&mut self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::messages::{EventCategory, GameEvent};

    #[test]
    fn drain_empties_in_push_order() {
        let mut events = MatchEvents::default();
        events.push(ServerMessage::GameEvent(GameEvent { category: EventCategory::Info, message: "a".into(), display_duration_secs: 1.0 }));
        events.push(ServerMessage::GameEvent(GameEvent { category: EventCategory::Info, message: "b".into(), display_duration_secs: 1.0 }));
        let drained = events.drain();
        assert_eq!(drained.len(), 2);
        assert!(events.drain().is_empty());
    }
}
