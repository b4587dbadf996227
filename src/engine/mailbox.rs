//! Per-player single-slot input mailbox (§4.7, §5).
//!
//! A plain `Mutex<Option<PlayerInput>>` per player — the teacher already
//! pulls in `parking_lot` for cheap mutexes, and a lock-free structure here
//! would be a premature complication for a single-writer/single-reader
//! cell that's only ever touched twice per tick.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use crate::common::ids::PlayerId;
use crate::session::messages::PlayerInput;

#[derive(Default)]
pub struct Mailbox {
    slot: Mutex<Option<PlayerInput>>,
}

impl Mailbox {
    /// Newer overwrites older (§5: "if two inputs arrive between ticks,
    /// only the latest is used").
    pub fn submit(&self, input: PlayerInput) {
        *self.slot.lock() = Some(input);
    }

    /// Drains the slot; returns `None` if nothing arrived since the last
    /// drain. Applying the same input twice (because nothing new arrived)
    /// is the caller's job via [`Mailboxes::last_known`].
    pub fn take(&self) -> Option<PlayerInput> {
        self.slot.lock().take()
    }
}

/// One mailbox per connected player, plus the last-applied input so a
/// silent player keeps moving/aiming the way they last told the server to
/// (§8: "Applying the same input twice... yields the same effect as
/// applying once").
///
/// Registration and draining both go through `&self` — the session layer
/// registers/unregisters players concurrently with the tick loop draining
/// mailboxes, so the two maps live behind `RwLock` rather than requiring
/// `MatchEngine` to serialize every mailbox touch through its tick mutex.
#[derive(Default)]
pub struct Mailboxes {
    boxes: RwLock<HashMap<PlayerId, Mailbox>>,
    last_known: RwLock<HashMap<PlayerId, PlayerInput>>,
}

impl Mailboxes {
    pub fn register(&self, player: PlayerId) {
        self.boxes.write().insert(player, Mailbox::default());
        self.last_known.write().insert(player, PlayerInput::default());
    }

    pub fn unregister(&self, player: PlayerId) {
        self.boxes.write().remove(&player);
        self.last_known.write().remove(&player);
    }

    pub fn submit(&self, player: PlayerId, input: PlayerInput) {
        if let Some(mailbox) = self.boxes.read().get(&player) {
            mailbox.submit(input);
        }
    }

    /// Tick step 3: drains every mailbox, falling back to the last known
    /// input when nothing new arrived since the previous tick.
    pub fn drain_for_tick(&self) -> Vec<(PlayerId, PlayerInput)> {
        let boxes = self.boxes.read();
        let mut last_known = self.last_known.write();
        let mut out = Vec::with_capacity(boxes.len());
        for (&player, mailbox) in boxes.iter() {
            let input = mailbox.take().unwrap_or_else(|| last_known[&player]);
            last_known.insert(player, input);
            out.push((player, input));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_input_overwrites_older() {
        let mailbox = Mailbox::default();
        mailbox.submit(PlayerInput { move_x: 1.0, ..Default::default() });
        mailbox.submit(PlayerInput { move_x: 2.0, ..Default::default() });
        assert_eq!(mailbox.take().unwrap().move_x, 2.0);
        assert!(mailbox.take().is_none());
    }

    #[test]
    fn silent_player_repeats_last_known_input() {
        let mailboxes = Mailboxes::default();
        let player = PlayerId::from_raw_test(1);
        mailboxes.register(player);
        mailboxes.submit(player, PlayerInput { move_x: 1.0, ..Default::default() });
        let first = mailboxes.drain_for_tick();
        assert_eq!(first[0].1.move_x, 1.0);
        let second = mailboxes.drain_for_tick();
        assert_eq!(second[0].1.move_x, 1.0);
    }
}
