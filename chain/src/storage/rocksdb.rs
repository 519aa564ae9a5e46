//! RocksDB-backed chain store.
//!
//! This implementation persists the chain in a RocksDB instance with
//! dedicated column families, laid out as integer-keyed rows:
//!
//! - `"blockchain"`: row id (big-endian u64, `id == height + 1`) ->
//!   encoded [`BlockRow`] with the public key as its hex triple, the
//!   solution as its csv form, and a csv of owning transaction ids,
//! - `"transactions"`: 1-based row id -> encoded [`TxRow`],
//! - `"logs"`: 1-based row id -> encoded [`LogRecord`],
//! - `"meta"`: row counters.
//!
//! Rows are encoded with **bincode 2** using the `serde` integration and
//! an explicit `standard()` config.

use std::{path::Path, sync::Arc};

use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, DB, Options};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::consensus::store::{ChainStore, LogRecord};
use crate::crypto::elgamal::{Ciphertext, PublicKey};
use crate::types::{Address, Block, HeaderHash, Solution, Transaction, HASH_LEN};

use super::{unix_now, StorageError};

const CF_BLOCKCHAIN: &str = "blockchain";
const CF_TRANSACTIONS: &str = "transactions";
const CF_LOGS: &str = "logs";
const CF_META: &str = "meta";

const META_BLOCK_COUNT: &[u8] = b"block_count";
const META_TX_NEXT: &[u8] = b"tx_next_id";
const META_LOG_NEXT: &[u8] = b"log_next_id";

/// Configuration for [`RocksDbChainStore`].
#[derive(Clone, Debug)]
pub struct RocksDbConfig {
    /// Filesystem path to the RocksDB database directory.
    pub path: String,
    /// Whether to create the database and missing column families if they
    /// do not yet exist.
    pub create_if_missing: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "data/chain-db".to_string(),
            create_if_missing: true,
        }
    }
}

/// Persisted block row, mirroring the original tabular schema.
#[derive(Debug, Serialize, Deserialize)]
struct BlockRow {
    height: u64,
    timestamp: u64,
    header_hash: Vec<u8>,
    difficulty: u64,
    prev_block_hash: Option<Vec<u8>>,
    /// `0x<g>, 0x<h>, 0x<p>`.
    public_key: String,
    /// Decimal nonce.
    nonce: Option<String>,
    /// `a1, a2, b1, b2, n`.
    solution: Option<String>,
    /// csv of owning transaction row ids.
    transactions: String,
}

/// Persisted transaction row.
///
/// Carries the submitted signature (nullable; coinbase has none) so a
/// reloaded chain can still pass signature validation.
#[derive(Debug, Serialize, Deserialize)]
struct TxRow {
    addr_from: String,
    addr_to: String,
    amount: u64,
    cipher: Option<String>,
    release_block_idx: Option<u64>,
    signature: Option<String>,
    block_height: u64,
}

/// RocksDB-backed implementation of [`ChainStore`].
pub struct RocksDbChainStore {
    db: DB,
}

impl RocksDbChainStore {
    /// Opens (or creates) a RocksDB-backed chain store at the given path.
    pub fn open(cfg: &RocksDbConfig) -> Result<Self, StorageError> {
        let path = Path::new(&cfg.path);

        let mut opts = Options::default();
        opts.create_if_missing(cfg.create_if_missing);
        opts.create_missing_column_families(cfg.create_if_missing);

        let cfs = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(CF_BLOCKCHAIN, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
            ColumnFamilyDescriptor::new(CF_LOGS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self { db })
    }

    fn cf(&self, name: &'static str) -> Result<Arc<BoundColumnFamily<'_>>, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or(StorageError::MissingColumnFamily(name))
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| StorageError::Encoding(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
        let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        Ok(value)
    }

    fn meta_get(&self, key: &[u8]) -> Result<u64, StorageError> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(&cf, key)? {
            None => Ok(0),
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StorageError::Corrupted("meta counter width".to_string()))?;
                Ok(u64::from_be_bytes(arr))
            }
        }
    }

    fn meta_put(&self, key: &[u8], value: u64) -> Result<(), StorageError> {
        let cf = self.cf(CF_META)?;
        self.db.put_cf(&cf, key, value.to_be_bytes())?;
        Ok(())
    }

    fn put_row<T: Serialize>(
        &self,
        cf_name: &'static str,
        id: u64,
        row: &T,
    ) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(&cf, id.to_be_bytes(), Self::encode(row)?)?;
        Ok(())
    }

    fn get_row<T: DeserializeOwned>(
        &self,
        cf_name: &'static str,
        id: u64,
    ) -> Result<Option<T>, StorageError> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, id.to_be_bytes())? {
            None => Ok(None),
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
        }
    }

    fn delete_row(&self, cf_name: &'static str, id: u64) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        self.db.delete_cf(&cf, id.to_be_bytes())?;
        Ok(())
    }

    /// Writes a block and its transactions, returning nothing on success.
    fn append_block(&self, block: &Block) -> Result<(), StorageError> {
        let count = self.meta_get(META_BLOCK_COUNT)?;
        if block.height != count {
            return Err(StorageError::Inconsistent(format!(
                "appending height {} to a chain of length {count}",
                block.height
            )));
        }

        let mut tx_next = self.meta_get(META_TX_NEXT)?;
        if tx_next == 0 {
            tx_next = 1;
        }

        let mut tx_ids = Vec::with_capacity(block.transactions.len());
        for tx in &block.transactions {
            let row = TxRow {
                addr_from: tx.addr_from.to_string(),
                addr_to: tx.addr_to.to_string(),
                amount: tx.amount,
                cipher: tx.cipher.as_ref().map(Ciphertext::to_string),
                release_block_idx: tx.release_block_idx,
                signature: tx.signature.clone(),
                block_height: block.height,
            };
            self.put_row(CF_TRANSACTIONS, tx_next, &row)?;
            tx_ids.push(tx_next.to_string());
            tx_next += 1;
        }

        let row = BlockRow {
            height: block.height,
            timestamp: block.timestamp,
            header_hash: block.effective_header_hash().as_bytes().to_vec(),
            difficulty: block.difficulty(),
            prev_block_hash: block.prev_block_hash.map(|h| h.as_bytes().to_vec()),
            public_key: block.public_key.to_string(),
            nonce: block.nonce.as_ref().map(|n| n.to_string()),
            solution: block.solution.as_ref().map(|s| s.to_string()),
            transactions: tx_ids.join(","),
        };
        // Store ids are 1-based: id == height + 1.
        self.put_row(CF_BLOCKCHAIN, block.height + 1, &row)?;

        self.meta_put(META_TX_NEXT, tx_next)?;
        self.meta_put(META_BLOCK_COUNT, count + 1)?;
        Ok(())
    }

    fn load_block(&self, height: u64) -> Result<Option<Block>, StorageError> {
        let Some(row) = self.get_row::<BlockRow>(CF_BLOCKCHAIN, height + 1)? else {
            return Ok(None);
        };

        let public_key = PublicKey::from_hex_str(&row.public_key)
            .map_err(|e| StorageError::Corrupted(format!("public key: {e}")))?;

        let solution = row
            .solution
            .as_deref()
            .map(|text| Solution::parse(text, public_key.clone()))
            .transpose()
            .map_err(|e| StorageError::Corrupted(format!("solution: {e}")))?;

        let nonce = row
            .nonce
            .as_deref()
            .map(|text| {
                text.parse()
                    .map_err(|e| StorageError::Corrupted(format!("nonce: {e}")))
            })
            .transpose()?;

        let mut transactions = Vec::new();
        if !row.transactions.is_empty() {
            for id_text in row.transactions.split(',') {
                let id: u64 = id_text
                    .trim()
                    .parse()
                    .map_err(|e| StorageError::Corrupted(format!("tx id {id_text:?}: {e}")))?;
                let tx_row = self
                    .get_row::<TxRow>(CF_TRANSACTIONS, id)?
                    .ok_or_else(|| StorageError::Corrupted(format!("missing tx row {id}")))?;
                transactions.push(tx_from_row(tx_row)?);
            }
        }

        Ok(Some(Block {
            height: row.height,
            timestamp: row.timestamp,
            prev_block_hash: row
                .prev_block_hash
                .map(|bytes| hash_from_bytes(&bytes))
                .transpose()?,
            public_key,
            nonce,
            solution,
            transactions,
            cached_header_hash: Some(hash_from_bytes(&row.header_hash)?),
        }))
    }

    fn clear_chain(&self) -> Result<(), StorageError> {
        let block_count = self.meta_get(META_BLOCK_COUNT)?;
        for id in 1..=block_count {
            self.delete_row(CF_BLOCKCHAIN, id)?;
        }
        let tx_next = self.meta_get(META_TX_NEXT)?;
        for id in 1..tx_next.max(1) {
            self.delete_row(CF_TRANSACTIONS, id)?;
        }
        self.meta_put(META_BLOCK_COUNT, 0)?;
        self.meta_put(META_TX_NEXT, 1)?;
        Ok(())
    }
}

fn hash_from_bytes(bytes: &[u8]) -> Result<HeaderHash, StorageError> {
    if bytes.len() != HASH_LEN {
        return Err(StorageError::Corrupted(format!(
            "header hash must be {HASH_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; HASH_LEN];
    arr.copy_from_slice(bytes);
    Ok(HeaderHash(arr))
}

fn tx_from_row(row: TxRow) -> Result<Transaction, StorageError> {
    let cipher = row
        .cipher
        .as_deref()
        .map(Ciphertext::from_hex_str)
        .transpose()
        .map_err(|e| StorageError::Corrupted(format!("cipher: {e}")))?;
    Ok(Transaction {
        addr_from: Address::new(row.addr_from),
        addr_to: Address::new(row.addr_to),
        amount: row.amount,
        cipher,
        release_block_idx: row.release_block_idx,
        signature: row.signature,
    })
}

impl ChainStore for RocksDbChainStore {
    fn len(&self) -> Result<u64, StorageError> {
        self.meta_get(META_BLOCK_COUNT)
    }

    fn get(&self, height: u64) -> Result<Option<Block>, StorageError> {
        self.load_block(height)
    }

    fn append(&mut self, block: &Block) -> Result<(), StorageError> {
        self.append_block(block)
    }

    fn replace_chain(&mut self, blocks: &[Block]) -> Result<(), StorageError> {
        self.clear_chain()?;
        for block in blocks {
            self.append_block(block)?;
        }
        Ok(())
    }

    fn push_log(&mut self, category: &str, info: &str) {
        let record = LogRecord {
            category: category.to_string(),
            timestamp: unix_now(),
            info: info.to_string(),
        };
        let result = self.meta_get(META_LOG_NEXT).and_then(|next| {
            let id = next.max(1);
            self.put_row(CF_LOGS, id, &record)?;
            self.meta_put(META_LOG_NEXT, id + 1)
        });
        if let Err(e) = result {
            tracing::warn!("RocksDbChainStore::push_log failed: {e}");
        }
    }

    fn logs(&self) -> Result<Vec<LogRecord>, StorageError> {
        let next = self.meta_get(META_LOG_NEXT)?;
        let mut logs = Vec::new();
        for id in 1..next {
            if let Some(record) = self.get_row::<LogRecord>(CF_LOGS, id)? {
                logs.push(record);
            }
        }
        Ok(logs)
    }
}
