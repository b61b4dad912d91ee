use crate::interface_adapters::protocol::WorldUpdateDto;
use crate::interface_adapters::state::AppState;

use axum::extract::{Json, State};
use std::sync::Arc;

/// Latest broadcast world snapshot, for tooling and health checks.
pub async fn world_snapshot_handler(State(state): State<Arc<AppState>>) -> Json<WorldUpdateDto> {
    Json(WorldUpdateDto::from(state.arena.latest_update()))
}
