// Wire protocol DTOs and conversions for public game server messages.

use crate::domain::{EntitySnapshot, PlayerInput};
use crate::use_cases::WorldUpdate;
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection once the player is spawned.
    Identity { player_id: String },
    // Movement snapshot of every entity for a given tick.
    WorldUpdate(WorldUpdateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    Input(PlayerInputDto),
}

/// Movement intent; each axis is clamped to `-1.0..=1.0` on arrival.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl From<PlayerInputDto> for PlayerInput {
    fn from(input: PlayerInputDto) -> Self {
        Self {
            x: input.x,
            y: input.y,
        }
    }
}

/// Snapshot of the world sent to clients on the broadcast cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub entities: Vec<EntityMovementDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            entities: update.entities.iter().map(EntityMovementDto::from).collect(),
        }
    }
}

/// Flattened per-entity movement for wire transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMovementDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl From<&EntitySnapshot> for EntityMovementDto {
    fn from(entity: &EntitySnapshot) -> Self {
        Self {
            id: entity.id.to_string(),
            x: entity.x,
            y: entity.y,
            vx: entity.vx,
            vy: entity.vy,
        }
    }
}
