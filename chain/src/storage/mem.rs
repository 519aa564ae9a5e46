//! In-memory chain store.
//!
//! This implementation is useful for unit tests, benchmarks, and small
//! devnets. Blocks live in a `Vec` indexed by height; logs in a second
//! `Vec`. Reads never actually fail, but the fallible [`ChainStore`]
//! signatures are honoured so callers exercise the same paths as with a
//! persistent backend.

use crate::consensus::store::{ChainStore, LogRecord};
use crate::types::Block;

use super::{unix_now, StorageError};

/// In-memory implementation of [`ChainStore`].
#[derive(Default)]
pub struct InMemoryChainStore {
    blocks: Vec<Block>,
    logs: Vec<LogRecord>,
}

impl InMemoryChainStore {
    /// Creates a new, empty in-memory chain store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainStore for InMemoryChainStore {
    fn len(&self) -> Result<u64, StorageError> {
        Ok(self.blocks.len() as u64)
    }

    fn get(&self, height: u64) -> Result<Option<Block>, StorageError> {
        Ok(self.blocks.get(height as usize).cloned())
    }

    fn append(&mut self, block: &Block) -> Result<(), StorageError> {
        if block.height != self.blocks.len() as u64 {
            return Err(StorageError::Inconsistent(format!(
                "appending height {} to a chain of length {}",
                block.height,
                self.blocks.len()
            )));
        }
        self.blocks.push(block.clone());
        Ok(())
    }

    fn replace_chain(&mut self, blocks: &[Block]) -> Result<(), StorageError> {
        self.blocks = blocks.to_vec();
        Ok(())
    }

    fn push_log(&mut self, category: &str, info: &str) {
        self.logs.push(LogRecord {
            category: category.to_string(),
            timestamp: unix_now(),
            info: info.to_string(),
        });
    }

    fn logs(&self) -> Result<Vec<LogRecord>, StorageError> {
        Ok(self.logs.clone())
    }
}
