//! Transaction intake: `POST /txion` and the miner drain
//! `GET /txion?update=<miner_address>`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use chain::crypto::elgamal::Ciphertext;
use chain::types::tx::signing_payload;
use chain::{Address, ChainStore, K256Verifier, SignatureVerifier, Transaction, TxWire};

use crate::state::SharedState;

use super::internal_error;

/// Response body for an accepted submission.
pub const SUBMIT_OK: &str = "Transaction submission successful\n";
/// Response body for a signature that does not verify.
pub const SUBMIT_WRONG_SIGNATURE: &str = "Transaction submission failed. Wrong signature\n";
/// Response body for an underfunded sender.
pub const SUBMIT_BALANCE_NOT_ENOUGH: &str = "Transaction submission failed. Balance not enough\n";

/// Request body of `POST /txion`.
#[derive(Debug, Deserialize)]
pub struct TxSubmission {
    pub addr_from: String,
    pub addr_to: String,
    pub amount: u64,
    /// base64 `r ‖ s` over the canonical
    /// `{"addr_from":..,"addr_to":..,"amount":..}` payload.
    pub signature: String,
    /// Time-release ciphertext in its `0x<c1>, 0x<c2>` text form.
    #[serde(default)]
    pub cipher: Option<String>,
    /// Height at which the ciphertext becomes decryptable.
    #[serde(default)]
    pub release_block_idx: Option<u64>,
}

/// `POST /txion`
///
/// Validates the signature over the canonical payload and the sender's
/// chain balance, then buffers the transaction for the next candidate
/// block. Domain rejections are plain-text 200 responses, matching the
/// documented protocol; malformed payloads are 400s; a store failure
/// during the balance scan is fatal for the request and surfaces as a
/// 500.
pub async fn submit(
    State(state): State<SharedState>,
    Json(body): Json<TxSubmission>,
) -> Result<(StatusCode, String), (StatusCode, String)> {
    let addr_from = Address::new(body.addr_from);
    let addr_to = Address::new(body.addr_to);

    let cipher = body
        .cipher
        .as_deref()
        .map(Ciphertext::from_hex_str)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("bad cipher: {e}\n")))?;

    let payload = signing_payload(&addr_from, &addr_to, body.amount);
    let verified = K256Verifier
        .verify(&addr_from, &body.signature, &payload)
        .unwrap_or(false);
    if !verified {
        state.metrics.mining.txs_rejected.inc();
        tracing::info!(from = %addr_from, "rejected transaction: wrong signature");
        return Ok((StatusCode::OK, SUBMIT_WRONG_SIGNATURE.to_string()));
    }

    {
        let mut engine = state.engine.lock().await;
        let balance = engine.balance_of(&addr_from).map_err(internal_error)?;
        if balance < i128::from(body.amount) {
            state.metrics.mining.txs_rejected.inc();
            tracing::info!(from = %addr_from, amount = body.amount, "rejected transaction: balance");
            return Ok((StatusCode::OK, SUBMIT_BALANCE_NOT_ENOUGH.to_string()));
        }
        engine.store_mut().push_log(
            "request",
            &format!("accepted tx {} -> {} ({})", addr_from, addr_to, body.amount),
        );
    }

    let tx = Transaction {
        addr_from: addr_from.clone(),
        addr_to: addr_to.clone(),
        amount: body.amount,
        cipher,
        release_block_idx: body.release_block_idx,
        signature: Some(body.signature),
    };
    state.pending.lock().await.push(tx);

    tracing::info!(from = %addr_from, to = %addr_to, amount = body.amount, "new transaction");
    Ok((StatusCode::OK, SUBMIT_OK.to_string()))
}

/// Query parameters of `GET /txion`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuery {
    pub update: Option<String>,
}

/// `GET /txion?update=<miner_address>`
///
/// Atomic drain of the pending pool for the mining process. Only the
/// configured miner address may drain; anyone else sees an empty list and
/// the pool is left untouched.
pub async fn pending(
    State(state): State<SharedState>,
    Query(query): Query<UpdateQuery>,
) -> Json<Vec<TxWire>> {
    if query.update.as_deref() != Some(state.miner_address.as_str()) {
        return Json(Vec::new());
    }
    let drained = state.pending.lock().await.drain();
    Json(
        drained
            .iter()
            .map(|tx| TxWire::from_tx(tx, None))
            .collect(),
    )
}
