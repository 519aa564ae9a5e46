//! Public-key schedule and difficulty control.
//!
//! Each block's key is derived deterministically from its parent's:
//! seed the generator with `p + g + h` of the previous key. Anyone holding
//! the chain can therefore fast-forward the schedule to any future height
//! and encrypt against a key whose private counterpart does not exist yet
//! — it will be *mined into existence* at that height.

use std::time::{Duration, Instant};

use crate::consensus::ConsensusConfig;
use crate::crypto::elgamal::{generate_pub_key, PublicKey};

/// Derives the next scheduled public key from its predecessor.
pub fn schedule_next(prev: &PublicKey, bit_length: u64) -> PublicKey {
    generate_pub_key(bit_length, &prev.chain_seed())
}

/// Fast-forwards the schedule `intervals` steps at the tip's bit length.
///
/// This is the wallet-side derivation: encrypting against the returned key
/// locks a message until the block `intervals` heights above the tip is
/// mined. Difficulty adjustments between now and then change the schedule,
/// so senders should keep lock times well inside an adjustment term.
pub fn fast_forward(tip_key: &PublicKey, intervals: u64) -> PublicKey {
    let mut key = tip_key.clone();
    for _ in 0..intervals {
        key = schedule_next(&key, key.bit_length);
    }
    key
}

/// Bit-length (difficulty) controller.
///
/// Every `term` blocks the controller compares the wall-clock time since
/// the previous adjustment mark with the target block time and moves the
/// bit length one step: faster than target → +1, slower → −1, clamped to
/// `[min_bits, max_bits]`. Single-step with no averaging window,
/// oscillation and all.
#[derive(Debug)]
pub struct DifficultyController {
    term: u64,
    block_time: Duration,
    min_bits: u64,
    max_bits: u64,
    last_mark: Option<Instant>,
}

impl DifficultyController {
    pub fn from_config(cfg: &ConsensusConfig) -> Self {
        DifficultyController {
            term: cfg.term_blocks,
            block_time: Duration::from_secs(cfg.block_time_secs),
            min_bits: cfg.min_bit_length,
            max_bits: cfg.max_bit_length,
            last_mark: None,
        }
    }

    /// Bit length for the candidate built on a parent at `parent_height`
    /// with difficulty `prev_bits`.
    ///
    /// Off a term boundary this returns `prev_bits` (clamped). On a term
    /// boundary the first call only records the mark; later calls adjust
    /// by the elapsed wall clock and re-mark.
    pub fn bit_length_for(&mut self, parent_height: u64, prev_bits: u64) -> u64 {
        if self.term == 0 || parent_height % self.term != 0 {
            return self.clamp(prev_bits);
        }
        let now = Instant::now();
        match self.last_mark.replace(now) {
            None => self.clamp(prev_bits),
            Some(mark) => self.adjust(prev_bits, now.duration_since(mark)),
        }
    }

    /// The pure adjustment rule: elapsed below target raises difficulty,
    /// above lowers it.
    pub fn adjust(&self, prev_bits: u64, elapsed: Duration) -> u64 {
        let next = if elapsed < self.block_time {
            prev_bits + 1
        } else if elapsed > self.block_time {
            prev_bits.saturating_sub(1)
        } else {
            prev_bits
        };
        self.clamp(next)
    }

    fn clamp(&self, bits: u64) -> u64 {
        bits.clamp(self.min_bits, self.max_bits)
    }
}
