// Domain layer: core simulation types and rules.

pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use state::{Entity, EntityKind, EntitySnapshot, PlayerInput};
pub use world::{World, WorldError};
