// Gameplay tuning values, kept apart from runtime/server configuration.

pub mod arena;
pub mod body;

pub use arena::ArenaTuning;
pub use body::{BodyTuning, GenericBodyTuning};
