/// Gameplay tuning for the bodies living in the arena.

#[derive(Debug, Clone, Copy)]
pub struct GenericBodyTuning {
    /// Bodies spawned when the world starts.
    pub count: u32,

    /// Diameter in world units.
    pub size: f32,

    pub max_health: i32,

    /// Spawn velocity components are drawn from `-max_spawn_speed..=max_spawn_speed`.
    pub max_spawn_speed: i32,
}

impl Default for GenericBodyTuning {
    fn default() -> Self {
        Self {
            count: 400,
            size: 10.0,
            max_health: 10,
            max_spawn_speed: 50,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BodyTuning {
    pub generic: GenericBodyTuning,

    /// Player diameter in world units.
    pub player_size: f32,

    pub player_max_health: i32,

    /// Acceleration applied along the player's input direction, in units/s².
    pub player_thrust: f32,

    /// First id handed out to players; generic bodies use ids below it.
    pub player_id_offset: u64,
}

impl Default for BodyTuning {
    fn default() -> Self {
        Self {
            generic: GenericBodyTuning::default(),
            player_size: 20.0,
            player_max_health: 100,
            player_thrust: 300.0,
            player_id_offset: 1_000_000,
        }
    }
}
