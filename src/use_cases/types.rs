// Use-case level inputs/outputs for the game loop.

use crate::domain::{EntitySnapshot, PlayerInput};

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join { player_id: u64 },
    Leave { player_id: u64 },
    Input { player_id: u64, input: PlayerInput },
}

/// Movement data for every live entity, emitted on the broadcast cadence.
#[derive(Debug, Clone, Default)]
pub struct WorldUpdate {
    pub tick: u64,
    pub entities: Vec<EntitySnapshot>,
}
