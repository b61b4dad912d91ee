// Per-tick physics systems, run in order: integrate, boundary, collision.

pub mod boundary;
pub mod collision;
pub mod integrator;
