// Framework bootstrap for the arena server runtime.

use crate::domain::tuning::{ArenaTuning, BodyTuning};
use crate::frameworks::config;
use crate::interface_adapters::net::{spawn_world_serializer, world_snapshot_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ArenaHandle, ArenaSettings};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn arena_settings() -> ArenaSettings {
    ArenaSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        tick_interval: config::TICK_INTERVAL,
        broadcast_every: config::BROADCAST_EVERY_TICKS,
        max_players: config::max_players(),
        arena: ArenaTuning::default(),
        bodies: BodyTuning::default(),
    }
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_with_settings(listener, arena_settings()).await
}

pub async fn run_with_settings(
    listener: tokio::net::TcpListener,
    settings: ArenaSettings,
) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(settings);
    let arena = state.arena.clone();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/world", get(world_snapshot_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    // The HTTP side is gone either way; stop ticking.
    arena.shutdown();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(settings: ArenaSettings) -> Arc<AppState> {
    tracing::debug!(
        max_players = settings.max_players,
        generic_bodies = settings.bodies.generic.count,
        tick_interval_us = settings.tick_interval.as_micros() as u64,
        "arena configured"
    );

    // Start the simulation and the shared world update serializer.
    let arena = ArenaHandle::start(settings);
    spawn_world_serializer(&arena);

    Arc::new(AppState { arena })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal source, keep serving.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
