//! Wire message catalogue (§6), grounded in the pack's tagged-enum wire
//! protocol style (`ClientMsg`/`ServerMsg` in `ws-protocol.rs`).

use bevy::prelude::Vec2;
use serde::{Deserialize, Serialize};

use crate::common::ids::PlayerId;
use crate::weapons::preset::WeaponKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Keyboard,
    Gamepad,
    Touch,
}

impl Default for InputSource {
    fn default() -> Self {
        InputSource::Keyboard
    }
}

/// One tick of player intent (§4.6, §6). AI and human inputs share this
/// exact shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub move_x: f32,
    pub move_y: f32,
    /// Cursor position in world coordinates, not a direction vector —
    /// the engine derives the aim direction from `world - player_position`.
    pub world: Vec2,
    pub fire: bool,
    pub alt_fire: bool,
    pub reload: bool,
    #[serde(default)]
    pub input_source: InputSource,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self { move_x: 0.0, move_y: 0.0, world: Vec2::ZERO, fire: false, alt_fire: false, reload: false, input_source: InputSource::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigChange {
    pub weapon_config: WeaponKind,
    pub utility_weapon: Option<WeaponKind>,
    pub player_name: Option<String>,
}

/// Inbound frames (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    ConfigChange(ConfigChange),
    PlayerInput(PlayerInput),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Kill,
    Capture,
    System,
    Achievement,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub category: EventCategory,
    /// May contain `<color:#RRGGBB>...</color>` inline tags (§6); the
    /// server never interprets them, only forwards.
    pub message: String,
    pub display_duration_secs: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerKilled {
    pub victim_id: PlayerId,
    pub killer_id: Option<PlayerId>,
    pub killer_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoundStart {
    pub round: u32,
    pub rest_duration_secs: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEnd {
    pub round: u32,
    pub scores: Vec<(u8, u32)>,
    pub rest_duration_secs: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOver {
    pub victory_condition: crate::rules::VictoryCondition,
    pub message: String,
    pub final_scores: Vec<(u8, u32)>,
}

/// Outbound frames (§6). `InitialState`/`SpectatorInit`/`GameState` carry
/// `serializer`-produced payloads; kept generic here over the concrete
/// snapshot type to avoid a module cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    InitialState(crate::serializer::InitialState),
    SpectatorInit(crate::serializer::InitialState),
    GameState(crate::serializer::Snapshot),
    PlayerKilled(PlayerKilled),
    GameEvent(GameEvent),
    RoundStart(RoundStart),
    RoundEnd(RoundEnd),
    GameOver(GameOver),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_round_trips_through_json() {
        let msg = ClientMessage::PlayerInput(PlayerInput { move_x: 1.0, ..Default::default() });
        let json = serde_json::to_string(&msg).unwrap();
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        match back {
            ClientMessage::PlayerInput(input) => assert_eq!(input.move_x, 1.0),
            _ => panic!("expected PlayerInput"),
        }
    }
}
