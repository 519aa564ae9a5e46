//! Chain query routes: `GET /blocks` and `GET /last`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use chain::{BlockWire, ChainStore};

use crate::state::SharedState;

use super::internal_error;

/// Query parameters of `GET /blocks`.
///
/// `start`/`end` select heights `[start, end)` (equivalently store ids
/// `[start+1, end]`); both default to the full chain.
#[derive(Debug, Deserialize)]
pub struct BlocksQuery {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// `GET /blocks`
///
/// Serves the selected chain slice with hex-encoded hashes and
/// transactions inlined as objects; this is also the format peers consume
/// during longest-chain rounds. A store failure is fatal for the request
/// and surfaces as a 500.
pub async fn blocks(
    State(state): State<SharedState>,
    Query(query): Query<BlocksQuery>,
) -> Result<Json<Vec<BlockWire>>, (StatusCode, String)> {
    let engine = state.engine.lock().await;
    let len = engine.store().len().map_err(internal_error)?;
    let start = query.start.unwrap_or(0);
    let end = query.end.unwrap_or(len);

    let blocks = engine
        .store()
        .blocks_in(start, end)
        .map_err(internal_error)?;
    Ok(Json(blocks.iter().map(BlockWire::from).collect()))
}

/// `GET /last`
///
/// The tip block, or `{"height":0}` when the chain is empty. Wallets use
/// this to derive future scheduled keys for time-release encryption.
pub async fn last(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let engine = state.engine.lock().await;
    match engine.tip().map_err(internal_error)? {
        Some(block) => {
            let wire = BlockWire::from(&block);
            Ok(Json(
                serde_json::to_value(wire).expect("wire blocks are always serializable"),
            ))
        }
        None => Ok(Json(serde_json::json!({ "height": 0 }))),
    }
}
