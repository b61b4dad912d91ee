use super::types::{GameEvent, WorldUpdate};
use crate::domain::systems::boundary::{self, BoundaryConfig};
use crate::domain::systems::collision;
use crate::domain::systems::integrator::{self, IntegratorConfig};
use crate::domain::tuning::{ArenaTuning, BodyTuning};
use crate::domain::{Entity, EntityKind, World, WorldError};
use glam::Vec2;
use rand::Rng;
use rand::rngs::StdRng;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

// Floor for the pacing sleep when a tick overruns its budget.
const MIN_TICK_SLEEP: Duration = Duration::from_millis(1);

/// The authoritative world plus the rules that advance it one tick at a time.
pub struct Simulation {
    world: World,
    arena: ArenaTuning,
    bodies: BodyTuning,
    broadcast_every: u64,
    tick: u64,
    rng: StdRng,
}

impl Simulation {
    /// Builds a world populated with the configured generic bodies.
    pub fn new(arena: ArenaTuning, bodies: BodyTuning, broadcast_every: u64, rng: StdRng) -> Self {
        let mut sim = Self {
            world: World::new(),
            arena,
            bodies,
            broadcast_every: broadcast_every.max(1),
            tick: 0,
            rng,
        };
        sim.spawn_generic_bodies();
        sim
    }

    fn spawn_generic_bodies(&mut self) {
        let generic = self.bodies.generic;
        let speed = generic.max_spawn_speed;
        for id in 0..u64::from(generic.count) {
            let position = self.random_position();
            let velocity = Vec2::new(
                self.rng.random_range(-speed..=speed) as f32,
                self.rng.random_range(-speed..=speed) as f32,
            );
            let entity = Entity::generic(id, position, velocity, generic.size, generic.max_health);
            if let Err(e) = self.world.insert(entity) {
                warn!(error = ?e, "generic body not spawned");
            }
        }
    }

    fn random_position(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.random_range(0..=self.arena.width as i32) as f32,
            self.rng.random_range(0..=self.arena.height as i32) as f32,
        )
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn apply_event(&mut self, ev: GameEvent) {
        match ev {
            GameEvent::Join { player_id } => {
                let position = self.random_position();
                let player = Entity::player(
                    player_id,
                    position,
                    self.bodies.player_size,
                    self.bodies.player_max_health,
                );
                match self.world.insert(player) {
                    Ok(()) => info!(player_id, "player joined"),
                    Err(WorldError::DuplicateId(_)) => {
                        warn!(player_id, "player id already live; join ignored")
                    }
                }
            }
            GameEvent::Leave { player_id } => {
                if self.world.remove(player_id).is_some() {
                    info!(player_id, "player left");
                }
            }
            GameEvent::Input { player_id, input } => {
                if let Some(EntityKind::Player { input: last }) =
                    self.world.get_mut(player_id).map(|e| &mut e.kind)
                {
                    *last = input;
                }
            }
        }
    }

    /// Advances the world by `dt` seconds. Returns a snapshot on broadcast ticks.
    pub fn step(&mut self, dt: f32) -> Option<WorldUpdate> {
        self.tick += 1;

        integrator::integrate(
            self.world.entities_mut(),
            dt,
            IntegratorConfig {
                drag: self.arena.drag,
                drag_threshold: self.arena.drag_threshold,
                player_thrust: self.bodies.player_thrust,
            },
        );

        let update = (self.tick % self.broadcast_every == 0).then(|| self.snapshot());

        boundary::keep_in_bounds(
            self.world.entities_mut(),
            BoundaryConfig {
                width: self.arena.width,
                height: self.arena.height,
                damping: self.arena.edge_damping,
            },
        );
        collision::resolve_collisions(self.world.entities_mut());

        update
    }

    pub fn snapshot(&self) -> WorldUpdate {
        WorldUpdate {
            tick: self.tick,
            entities: self.world.snapshot(),
        }
    }
}

/// Drives the simulation at `tick_interval` until `shutdown` fires.
///
/// `dt` is measured wall time, not the nominal interval. Overrunning ticks are
/// not caught up on.
pub async fn world_task(
    sim: Simulation,
    input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    latest_tx: watch::Sender<WorldUpdate>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    run_ticks(
        sim,
        Simulation::step,
        input_rx,
        world_tx,
        latest_tx,
        tick_interval,
        shutdown,
    )
    .await
}

// Tick loop with the per-tick step supplied by the caller.
async fn run_ticks<F>(
    mut sim: Simulation,
    mut step: F,
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    latest_tx: watch::Sender<WorldUpdate>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) where
    F: FnMut(&mut Simulation, f32) -> Option<WorldUpdate>,
{
    latest_tx.send_replace(sim.snapshot());
    info!(
        entities = sim.world().len(),
        tick_interval_us = tick_interval.as_micros() as u64,
        "simulation started"
    );

    let mut prev = Instant::now();
    loop {
        let started = Instant::now();
        let dt = started.duration_since(prev).as_secs_f32();
        prev = started;

        // Joins/leaves queued mid-tick land on the next tick.
        loop {
            match input_rx.try_recv() {
                Ok(ev) => sim.apply_event(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("game event channel closed; simulation exiting");
                    return;
                }
            }
        }

        // A panicking tick must not take the whole arena down with it.
        let update = match panic::catch_unwind(AssertUnwindSafe(|| step(&mut sim, dt))) {
            Ok(update) => update,
            Err(_) => {
                error!(tick = sim.tick(), "simulation tick panicked; continuing");
                None
            }
        };

        if let Some(update) = update {
            if dt > 0.0 {
                debug!(
                    tick = update.tick,
                    tick_rate = (1.0 / dt).round(),
                    entities = update.entities.len(),
                    players = sim.world().player_count(),
                    "world broadcast"
                );
            }
            latest_tx.send_replace(update.clone());
            // No subscribers is fine; nobody is connected yet.
            let _ = world_tx.send(update);
        }

        let pace = tick_interval
            .saturating_sub(started.elapsed())
            .max(MIN_TICK_SLEEP);
        tokio::select! {
            _ = shutdown.notified() => {
                info!(tick = sim.tick(), "simulation stopped");
                break;
            }
            _ = tokio::time::sleep(pace) => {}
        }
    }
}
