//! DTOs for the arcade room API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently;
//! the end-to-end tests catch drift between the two crates. Loadouts and
//! event payloads stay opaque JSON: the request layer does not interpret them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A player's seat in a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadout: Option<Value>,
}

/// A room as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub code: String,
    pub name: String,
    pub host: String,
    pub players: Vec<Player>,
    #[serde(default)]
    pub started: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoom {
    pub name: String,
    pub player: String,
}

/// Body for actions that only identify the acting player (join, leave, start).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerAction {
    pub player: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLoadout {
    pub player: String,
    pub loadout: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetReady {
    pub player: String,
    pub ready: bool,
}

/// A gameplay event posted to a running room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub player: String,
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Server acknowledgement of a posted event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventAck {
    pub ok: bool,
    pub seq: u64,
}

/// Server acknowledgement of a disbanded room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disbanded {
    pub ok: bool,
    pub code: String,
}
