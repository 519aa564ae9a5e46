//! Storage backends for the chain.
//!
//! This module provides concrete implementations of the
//! [`crate::consensus::store::ChainStore`] trait, including:
//!
//! - an in-memory store ([`mem::InMemoryChainStore`]) suitable for tests
//!   and devnets,
//! - a RocksDB-backed store ([`rocksdb::RocksDbChainStore`]) for
//!   persistent nodes, laid out as integer-keyed rows mirroring the
//!   `blockchain` / `transactions` / `logs` tables.

use std::fmt;

pub mod mem;
pub mod rocksdb;

pub use mem::InMemoryChainStore;
pub use rocksdb::{RocksDbChainStore, RocksDbConfig};

/// Storage-level error type.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying RocksDB error.
    RocksDb(::rocksdb::Error),
    /// Required column family was not found.
    MissingColumnFamily(&'static str),
    /// A row failed to encode or decode.
    Encoding(String),
    /// Stored data contradicts itself (bad hash length, unparsable key
    /// material, missing transaction rows).
    Corrupted(String),
    /// The caller asked for an impossible write, e.g. appending a block
    /// at the wrong height.
    Inconsistent(String),
}

impl From<::rocksdb::Error> for StorageError {
    fn from(e: ::rocksdb::Error) -> Self {
        StorageError::RocksDb(e)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::RocksDb(e) => write!(f, "rocksdb error: {e}"),
            StorageError::MissingColumnFamily(cf) => write!(f, "missing column family {cf:?}"),
            StorageError::Encoding(msg) => write!(f, "row encoding error: {msg}"),
            StorageError::Corrupted(msg) => write!(f, "corrupted store: {msg}"),
            StorageError::Inconsistent(msg) => write!(f, "inconsistent write: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Current wall clock as Unix seconds, for log rows.
pub(crate) fn unix_now() -> u64 {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}
