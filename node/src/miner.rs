//! In-process miner loop.
//!
//! One round per candidate block: adjust difficulty on a term boundary,
//! drain the pending pool, assemble a candidate on the tip, and run the
//! Pollard-rho walk to the block-time deadline in a blocking task. On a
//! sealed block the round imports it; on a timeout it polls peers for a
//! longer chain and otherwise retries with a fresh timestamp, which
//! re-seeds the hash oracle and therefore the whole walk.

use std::time::{Duration, Instant};

use chain::consensus::sync::find_new_chains;
use chain::{
    seal_candidate, Address, ChainConfig, ChainStore, DifficultyController, HttpPeerClient,
    MineOutcome,
};

use crate::state::SharedState;

pub async fn run_miner_loop(state: SharedState, cfg: ChainConfig) {
    let miner_address = Address::new(cfg.miner.address.clone());
    let mut difficulty = DifficultyController::from_config(&cfg.consensus);
    let mut bit_length = cfg.consensus.initial_bit_length;
    let block_time = Duration::from_secs(cfg.consensus.block_time_secs);
    let accept_mirror = cfg.consensus.accept_mirror_solutions;

    tracing::info!(
        block_time_secs = cfg.consensus.block_time_secs,
        bit_length,
        "miner loop running"
    );

    loop {
        // ---------------------------
        // Assemble a candidate
        // ---------------------------

        let candidate = {
            let mut engine = state.engine.lock().await;
            let parent = match engine.tip() {
                Ok(Some(parent)) => parent,
                Ok(None) => {
                    tracing::error!("miner loop found no tip; stopping");
                    return;
                }
                Err(e) => {
                    tracing::warn!("cannot read the chain tip: {e}");
                    drop(engine);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            if cfg.consensus.difficulty_adjustable {
                bit_length = difficulty.bit_length_for(parent.height, bit_length);
            }
            state.metrics.mining.bit_length.set(bit_length as i64);

            let pending = state.pending.lock().await.drain();
            if !pending.is_empty() {
                engine
                    .store_mut()
                    .push_log("request", &format!("drained {} pending txs", pending.len()));
            }

            match engine.assemble_candidate(&miner_address, pending, unix_now(), bit_length) {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::warn!("failed to assemble candidate: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            }
        };

        // ---------------------------
        // Mine to the deadline
        // ---------------------------

        let deadline = Instant::now() + block_time;
        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || {
            seal_candidate(&candidate, deadline, None, accept_mirror)
        })
        .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("mining task failed: {e}");
                MineOutcome::TimedOut
            }
        };

        match outcome {
            MineOutcome::Sealed(block) => {
                let height = block.height;
                let mut engine = state.engine.lock().await;
                match engine.import_block(block) {
                    Ok(hash) => {
                        let elapsed = started.elapsed().as_secs_f64();
                        state.metrics.mining.seal_seconds.observe(elapsed);
                        state.metrics.mining.blocks_mined.inc();
                        engine
                            .store_mut()
                            .push_log("status", &format!("mined block {height} ({hash})"));
                        tracing::info!(height, hash = %hash, elapsed, "mined block");
                    }
                    Err(e) => {
                        engine
                            .store_mut()
                            .push_log("error", &format!("mined block {height} rejected: {e}"));
                        tracing::warn!(height, "locally mined block rejected: {e}");
                    }
                }
            }

            MineOutcome::TimedOut => {
                state.metrics.mining.rounds_timed_out.inc();
                tracing::info!("mining timed out, consulting peers");

                // The blocking reqwest client must be built and used off
                // the async runtime.
                let peers = cfg.peers.nodes.clone();
                let timeout = cfg.peers.timeout;
                let chains = tokio::task::spawn_blocking(move || {
                    match HttpPeerClient::new(timeout) {
                        Ok(client) => find_new_chains(&client, &peers),
                        Err(e) => {
                            tracing::warn!("cannot build peer client: {e}");
                            Vec::new()
                        }
                    }
                })
                .await
                .unwrap_or_default();

                let mut engine = state.engine.lock().await;
                match engine.adopt_longest(chains) {
                    Ok(true) => {
                        state.metrics.mining.chains_adopted.inc();
                        engine
                            .store_mut()
                            .push_log("status", "adopted longer peer chain");
                    }
                    Ok(false) => {
                        engine
                            .store_mut()
                            .push_log("status", "mining timed out, retrying with fresh timestamp");
                    }
                    Err(e) => {
                        tracing::warn!("consensus round failed: {e}");
                    }
                }
                // The next round re-assembles with a new timestamp, which
                // changes the header and restarts the walk from scratch.
            }
        }
    }
}

/// Current wall-clock time as seconds since Unix epoch.
fn unix_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}
