// Arena orchestration: owns the channels into and out of the world task.

use crate::domain::{EntitySnapshot, PlayerInput};
use crate::domain::tuning::{ArenaTuning, BodyTuning};
use crate::use_cases::game::{Simulation, world_task};
use crate::use_cases::ids::PlayerIdAllocator;
use crate::use_cases::{GameEvent, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, broadcast, mpsc, watch};

/// Configuration for spawning the arena world.
#[derive(Debug, Clone)]
pub struct ArenaSettings {
    /// Capacity for inbound game events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Target interval between ticks.
    pub tick_interval: Duration,
    /// Ticks between world broadcasts.
    pub broadcast_every: u64,
    /// Players allowed in the arena at once.
    pub max_players: usize,
    pub arena: ArenaTuning,
    pub bodies: BodyTuning,
}

/// Errors returned by arena operations.
#[derive(Debug, PartialEq)]
pub enum ArenaError {
    /// The arena already holds `max_players` players.
    Full,
    /// The id does not belong to a live player.
    UnknownPlayer,
    /// The input queue is full; the event was dropped.
    InputQueueFull,
    /// The world task is gone.
    SimulationStopped,
}

/// Cloneable access to the running arena for connection handlers.
#[derive(Clone)]
pub struct ArenaHandle {
    /// Sender for game events into the world task.
    input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    /// Latest world update in domain form.
    latest_update_tx: watch::Sender<WorldUpdate>,
    player_ids: Arc<PlayerIdAllocator>,
    // Ids handed out by `spawn_player` and not yet removed; its size is the slot count.
    live_players: Arc<Mutex<HashSet<u64>>>,
    max_players: usize,
    shutdown: Arc<Notify>,
}

impl ArenaHandle {
    /// Populates the world and spawns its tick loop. Requires a Tokio runtime.
    pub fn start(settings: ArenaSettings) -> Self {
        Self::start_with_rng(settings, StdRng::from_os_rng())
    }

    pub fn start_with_rng(settings: ArenaSettings, rng: StdRng) -> Self {
        // Channel wiring for the arena world loop.
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldUpdate>(settings.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(settings.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let (latest_update_tx, _latest_update_rx) = watch::channel(WorldUpdate::default());
        let shutdown = Arc::new(Notify::new());

        let sim = Simulation::new(
            settings.arena,
            settings.bodies,
            settings.broadcast_every,
            rng,
        );

        // Spawn the authoritative world loop.
        tokio::spawn(world_task(
            sim,
            input_rx,
            world_tx.clone(),
            latest_update_tx.clone(),
            settings.tick_interval,
            shutdown.clone(),
        ));

        Self {
            input_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            latest_update_tx,
            player_ids: Arc::new(PlayerIdAllocator::new(settings.bodies.player_id_offset)),
            live_players: Arc::new(Mutex::new(HashSet::new())),
            max_players: settings.max_players,
            shutdown,
        }
    }

    /// Reserves a player slot, assigns an id, and queues the spawn.
    ///
    /// The player shows up in the world on the next tick.
    pub async fn spawn_player(&self) -> Result<u64, ArenaError> {
        let player_id = {
            let mut live = self.live_players();
            if live.len() >= self.max_players {
                return Err(ArenaError::Full);
            }
            let player_id = self.player_ids.next_id();
            live.insert(player_id);
            player_id
        };

        if self
            .input_tx
            .send(GameEvent::Join { player_id })
            .await
            .is_err()
        {
            self.live_players().remove(&player_id);
            return Err(ArenaError::SimulationStopped);
        }
        Ok(player_id)
    }

    /// Queues removal of a player spawned through `spawn_player`.
    pub async fn remove_player(&self, player_id: u64) -> Result<(), ArenaError> {
        let was_live = self.live_players().remove(&player_id);
        if !was_live {
            return Err(ArenaError::UnknownPlayer);
        }
        self.input_tx
            .send(GameEvent::Leave { player_id })
            .await
            .map_err(|_| ArenaError::SimulationStopped)
    }

    /// Queues a movement input without waiting for queue space.
    pub fn submit_input(&self, player_id: u64, input: PlayerInput) -> Result<(), ArenaError> {
        match self.input_tx.try_send(GameEvent::Input { player_id, input }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ArenaError::InputQueueFull),
            Err(TrySendError::Closed(_)) => Err(ArenaError::SimulationStopped),
        }
    }

    /// Entities as of the most recent broadcast.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.latest_update_tx.borrow().entities.clone()
    }

    /// The most recent broadcast, including its tick.
    pub fn latest_update(&self) -> WorldUpdate {
        self.latest_update_tx.borrow().clone()
    }

    pub fn players_online(&self) -> usize {
        self.live_players().len()
    }

    pub fn is_full(&self) -> bool {
        self.players_online() >= self.max_players
    }

    /// Stops the world task after its current tick.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    fn live_players(&self) -> MutexGuard<'_, HashSet<u64>> {
        // Each critical section is one set operation, so a poisoned set is still valid.
        self.live_players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
