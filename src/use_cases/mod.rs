// Use cases layer: application workflows for the game server.

pub mod arena;
pub mod game;
pub mod ids;
pub mod types;

pub use arena::{ArenaError, ArenaHandle, ArenaSettings};
pub use game::Simulation;
pub use types::{GameEvent, WorldUpdate};
