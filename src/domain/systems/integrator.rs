use crate::domain::state::{Entity, EntityKind};
use glam::Vec2;

#[derive(Debug, Clone, Copy)]
pub struct IntegratorConfig {
    pub drag: f32,           // per-tick multiplier
    pub drag_threshold: f32, // |v| at or below this is not damped
    pub player_thrust: f32,  // units/s² along the input direction
}

pub fn integrate(entities: &mut [Entity], dt: f32, cfg: IntegratorConfig) {
    for e in entities {
        integrate_entity(e, dt, cfg);
    }
}

pub fn integrate_entity(e: &mut Entity, dt: f32, cfg: IntegratorConfig) {
    // Corrupted velocity is contained here and the entity sits out this tick.
    if e.velocity.is_nan() {
        e.velocity = Vec2::ZERO;
        return;
    }

    if let EntityKind::Player { input } = e.kind {
        e.velocity += input.direction() * cfg.player_thrust * dt;
    }

    // Drag is per tick, so the decay rate follows the tick rate.
    if !e.in_collision {
        if e.velocity.x.abs() > cfg.drag_threshold {
            e.velocity.x *= cfg.drag;
        }
        if e.velocity.y.abs() > cfg.drag_threshold {
            e.velocity.y *= cfg.drag;
        }
    }

    e.position += e.velocity * dt;
}
