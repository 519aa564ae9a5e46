//! `GET /logs`: the persistent miner log.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use chain::{ChainStore, LogRecord};

use crate::state::SharedState;

use super::internal_error;

/// `GET /logs`
///
/// Serves the node's persisted log rows, oldest first. A store failure
/// surfaces as a 500.
pub async fn logs(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LogRecord>>, (StatusCode, String)> {
    let engine = state.engine.lock().await;
    let logs = engine.store().logs().map_err(internal_error)?;
    Ok(Json(logs))
}
