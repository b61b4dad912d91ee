// Domain-level simulation entities and input/snapshot types.

use glam::Vec2;

/// Movement intent sent by a player; each axis is expected in `-1.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub x: f32,
    pub y: f32,
}

impl PlayerInput {
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Closed set of entity variants sharing the common body fields.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Non-player body spawned at world start.
    Generic,
    /// Player-controlled body; the connection itself stays with the transport.
    Player { input: PlayerInput },
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: u64,
    // Top-left corner; the collision center sits at `position + size / 2`.
    pub position: Vec2,
    pub velocity: Vec2,
    // Diameter.
    pub size: f32,

    pub health: i32,
    pub max_health: i32,

    // Recomputed by every collision pass.
    pub in_collision: bool,
    pub kind: EntityKind,
}

impl Entity {
    pub fn generic(id: u64, position: Vec2, velocity: Vec2, size: f32, max_health: i32) -> Self {
        Self {
            id,
            position,
            velocity,
            size,
            health: max_health,
            max_health,
            in_collision: false,
            kind: EntityKind::Generic,
        }
    }

    pub fn player(id: u64, position: Vec2, size: f32, max_health: i32) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            size,
            health: max_health,
            max_health,
            in_collision: false,
            kind: EntityKind::Player {
                input: PlayerInput::default(),
            },
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player { .. })
    }

    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn center(&self) -> Vec2 {
        self.position + Vec2::splat(self.radius())
    }
}

/// Per-entity movement data handed to the broadcast path.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl From<&Entity> for EntitySnapshot {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id,
            x: e.position.x,
            y: e.position.y,
            vx: e.velocity.x,
            vy: e.velocity.y,
        }
    }
}
