use crate::domain::state::Entity;

#[derive(Debug, Clone, Copy)]
pub struct BoundaryConfig {
    pub width: f32,
    pub height: f32,
    pub damping: f32, // fraction of speed kept after hitting an edge
}

pub fn keep_in_bounds(entities: &mut [Entity], cfg: BoundaryConfig) {
    for e in entities {
        clamp_entity(e, cfg);
    }
}

pub fn clamp_entity(e: &mut Entity, cfg: BoundaryConfig) {
    let half = e.radius();
    let (x, vx) = reflect_axis(e.position.x, e.velocity.x, half, cfg.width - e.size, cfg.damping);
    let (y, vy) = reflect_axis(e.position.y, e.velocity.y, half, cfg.height - e.size, cfg.damping);
    e.position.x = x;
    e.position.y = y;
    e.velocity.x = vx;
    e.velocity.y = vy;
}

// Damped reflection: the velocity is pointed back into the arena, never elastic.
fn reflect_axis(pos: f32, vel: f32, min: f32, max: f32, damping: f32) -> (f32, f32) {
    if pos < min {
        (min, vel.abs() * damping)
    } else if pos > max {
        (max, -vel.abs() * damping)
    } else {
        (pos, vel)
    }
}
