use crate::domain::PlayerInput;
use crate::interface_adapters::http::error_response;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ArenaError, ArenaHandle, WorldUpdate};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    SendTimeout,
    InputClosed,
    WorldUpdatesClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
// A client that cannot take a frame within this window is treated as dead.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Turns each `WorldUpdate` into a JSON frame once, shared by every connection.
pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        let update = match world_rx.recv().await {
            Ok(update) => update,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "serializer fell behind the simulation");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("simulation gone; serializer stopping");
                break;
            }
        };

        let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
        match serde_json::to_string(&msg) {
            Ok(txt) => {
                let frame = Utf8Bytes::from(txt);
                // Stored even while no connection is subscribed.
                world_latest_tx.send_replace(frame.clone());
                let _ = world_bytes_tx.send(frame);
            }
            Err(e) => error!(error = ?e, "world update not serialized"),
        }
    }
}

pub fn spawn_world_serializer(arena: &ArenaHandle) {
    tokio::spawn(world_update_serializer(
        arena.world_tx.subscribe(),
        arena.world_bytes_tx.clone(),
        arena.world_latest_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Cheap pre-check; the slot itself is reserved after the upgrade.
    if state.arena.is_full() {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "arena full");
    }

    let arena = state.arena.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, arena))
}

async fn handle_socket(mut socket: WebSocket, arena: ArenaHandle) {
    // Subscribe before spawning so the first broadcast after the join is not missed.
    let world_bytes_rx = arena.world_bytes_tx.subscribe();
    let world_latest_rx = arena.world_latest_tx.subscribe();

    let player_id = match arena.spawn_player().await {
        Ok(id) => id,
        Err(ArenaError::Full) => {
            info!("arena filled up during upgrade; refusing connection");
            let _ = send_close_with_reason(&mut socket, close_code::AGAIN, "arena full").await;
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to spawn player");
            let _ = send_close_with_reason(&mut socket, close_code::ERROR, "arena unavailable")
                .await;
            return;
        }
    };

    let span = info_span!("conn", player_id);
    async move {
        let mut ctx = ConnCtx::new(player_id, arena, world_bytes_rx, world_latest_rx);

        // Tell the client "This is who you are".
        let identity_msg = ServerMessage::Identity {
            player_id: player_id.to_string(),
        };
        match send_message(&mut socket, &identity_msg).await {
            Ok(bytes) => ctx.stats.record_out(bytes),
            Err(e) => {
                warn!(error = ?e, "failed to send identity");
                disconnect_cleanup(&ctx).await;
                return;
            }
        }

        info!("client connected");

        // Main Client Loop
        if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
            warn!(error = ?e, "client loop exited with error");
        }
    }
    .instrument(span)
    .await
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    send_bounded(socket, Message::Text(txt.into())).await?;
    Ok(bytes)
}

// Bounded send so a stalled peer only ever stalls its own connection task.
async fn send_bounded(socket: &mut WebSocket, msg: Message) -> Result<(), NetError> {
    match timeout(SEND_TIMEOUT, socket.send(msg)).await {
        Ok(result) => result.map_err(NetError::Ws),
        Err(_) => Err(NetError::SendTimeout),
    }
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    send_bounded(
        socket,
        Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })),
    )
    .await?;
    socket.close().await.map_err(NetError::Ws)
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    // Lag recovery snapshots sent to this client.
    lag_recovery_count: u64,
}

impl ConnStats {
    fn record_in(&mut self, bytes: usize) {
        self.msgs_in += 1;
        self.bytes_in += bytes as u64;
    }

    fn record_out(&mut self, bytes: usize) {
        self.msgs_out += 1;
        self.bytes_out += bytes as u64;
    }
}

struct ConnCtx {
    player_id: u64,
    arena: ArenaHandle,
    world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    stats: ConnStats,

    last_input_full_log: Instant,
    last_world_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

impl ConnCtx {
    fn new(
        player_id: u64,
        arena: ArenaHandle,
        world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
        world_latest_rx: watch::Receiver<Utf8Bytes>,
    ) -> Self {
        // Start "already throttled out" so the first warning of each kind is logged.
        let now = Instant::now()
            .checked_sub(LOG_THROTTLE)
            .unwrap_or_else(Instant::now);
        Self {
            player_id,
            arena,
            world_bytes_rx,
            world_latest_rx,
            stats: ConnStats::default(),
            last_input_full_log: now,
            last_world_lag_log: now,
            last_invalid_input_log: now,
            close_frame: None,
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn sanitize_input(mut input: PlayerInput) -> Option<PlayerInput> {
    if !input.x.is_finite() || !input.y.is_finite() {
        return None;
    }

    input.x = input.x.clamp(-1.0, 1.0);
    input.y = input.y.clamp(-1.0, 1.0);

    Some(input)
}

fn process_input_message(ctx: &mut ConnCtx, input: PlayerInput) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    let Some(input) = sanitize_input(input) else {
        if should_log(&mut ctx.last_invalid_input_log) {
            warn!(player_id, "invalid input values (NaN/inf); dropping");
        }
        return Ok(LoopControl::Continue);
    };

    match ctx.arena.submit_input(player_id, input) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(ArenaError::SimulationStopped) => Err(NetError::InputClosed),
        Err(_) => {
            if should_log(&mut ctx.last_input_full_log) {
                warn!(player_id, "input channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing World Update
            world_msg = ctx.world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => matches!(
                        forward_world_bytes(bytes, socket, &mut ctx.stats).await,
                        LoopControl::Disconnect
                    ),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending snapshot");
                        }

                        // Resync strategy: send the latest world snapshot.
                        let latest = ctx.world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            ctx.stats.lag_recovery_count += 1;
                            matches!(
                                forward_world_bytes(latest, socket, &mut ctx.stats).await,
                                LoopControl::Disconnect
                            )
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = send_bounded(socket, Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    disconnect_cleanup(ctx).await;

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.stats.record_in(text.len());

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Input(input)) => process_input_message(ctx, input.into()),
                    Err(parse_err) => {
                        ctx.stats.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.stats.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    stats: &mut ConnStats,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match send_bounded(socket, Message::Text(world_msg)).await {
        Ok(()) => {
            stats.record_out(bytes_len);
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) {
    let player_id = ctx.player_id;
    if let Err(e) = ctx.arena.remove_player(player_id).await {
        warn!(player_id, error = ?e, "failed to despawn player");
    }

    let stats = &ctx.stats;
    debug!(
        player_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        lag_recovery_count = stats.lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
}
