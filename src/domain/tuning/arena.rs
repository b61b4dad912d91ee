/// Gameplay tuning for the arena itself and the physics rules applied in it.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// Map width in world units.
    pub width: f32,

    /// Map height in world units.
    pub height: f32,

    /// Velocity kept on each edge bounce.
    pub edge_damping: f32,

    /// Per-tick multiplicative drag applied while not colliding.
    pub drag: f32,

    /// Velocity components at or below this magnitude are left undamped.
    pub drag_threshold: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 5000.0,
            height: 5000.0,
            edge_damping: 0.9,
            drag: 0.999,
            drag_threshold: 0.05,
        }
    }
}
