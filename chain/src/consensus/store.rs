//! Storage abstraction used by the consensus engine.

use serde::{Deserialize, Serialize};

use crate::storage::StorageError;
use crate::types::Block;

/// One row of the persistent miner log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogRecord {
    /// Event category, e.g. `"status"`, `"request"`, `"error"`.
    pub category: String,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Human-readable event text.
    pub info: String,
}

/// Abstract storage interface used by the consensus engine.
///
/// The chain is a height-ordered sequence: `get(h)` addresses the block at
/// height `h`, `len` is the tip height plus one. Implementations can be
/// backed by in-memory vectors, RocksDB, etc.
///
/// Reads are fallible: a backend that cannot produce an answer (I/O
/// failure, corrupted row) reports a [`StorageError`] instead of
/// pretending the data is absent, so callers can fail the affected
/// operation rather than act on a truncated chain.
pub trait ChainStore {
    /// Number of blocks in the chain (0 when even genesis is missing).
    fn len(&self) -> Result<u64, StorageError>;

    /// Fetches the block at `height`; `Ok(None)` means the height is past
    /// the tip, not that the read failed.
    fn get(&self, height: u64) -> Result<Option<Block>, StorageError>;

    /// Returns the tip block, if any.
    fn tip(&self) -> Result<Option<Block>, StorageError> {
        let len = self.len()?;
        if len == 0 {
            Ok(None)
        } else {
            self.get(len - 1)
        }
    }

    /// `true` if the chain holds no blocks.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Appends a block at height `len()`; its transactions are persisted
    /// with it.
    fn append(&mut self, block: &Block) -> Result<(), StorageError>;

    /// Replaces the whole chain (longest-chain adoption).
    fn replace_chain(&mut self, blocks: &[Block]) -> Result<(), StorageError>;

    /// Blocks with heights in `[start, end)`, clamped to the chain.
    fn blocks_in(&self, start: u64, end: u64) -> Result<Vec<Block>, StorageError> {
        let end = end.min(self.len()?);
        let mut blocks = Vec::new();
        for height in start..end {
            if let Some(block) = self.get(height)? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    /// The full chain, oldest first.
    fn all_blocks(&self) -> Result<Vec<Block>, StorageError> {
        self.blocks_in(0, u64::MAX)
    }

    /// Appends a log row; best effort, never fails the caller.
    fn push_log(&mut self, category: &str, info: &str);

    /// All log rows, oldest first.
    fn logs(&self) -> Result<Vec<LogRecord>, StorageError>;
}
