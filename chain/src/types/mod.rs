//! Core domain types used by the chain.
//!
//! This module defines the strongly-typed building blocks shared across
//! the implementation: wallet addresses, header digests, transactions,
//! blocks, and Pollard-rho solutions. The goal is to avoid "naked" strings
//! and byte buffers in public APIs and instead use domain-specific
//! newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod block;
pub mod solution;
pub mod tx;
pub mod wire;

pub use block::{Block, GENESIS_BIT_LENGTH, GENESIS_SEED, GENESIS_TIMESTAMP};
pub use solution::{Solution, SolutionError};
pub use tx::Transaction;
pub use wire::{BlockWire, TxWire, WireError};

/// Length in bytes of the double-SHA-256 header digest.
pub const HASH_LEN: usize = 32;

/// Reserved sender address of coinbase transactions.
pub const NETWORK_ADDRESS: &str = "network";

/// Strongly-typed block-header digest (double SHA-256).
///
/// Wrapping the raw byte array keeps header hashes from being confused
/// with body hashes or arbitrary 32-byte blobs in public APIs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct HeaderHash(pub [u8; HASH_LEN]);

impl HeaderHash {
    /// Returns the underlying digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Hex encoding used on the wire and in the store.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses the hex encoding produced by [`HeaderHash::to_hex`].
    pub fn from_hex(text: &str) -> Result<Self, WireError> {
        let bytes = hex::decode(text)
            .map_err(|e| WireError::Malformed(format!("bad header hash hex: {e}")))?;
        if bytes.len() != HASH_LEN {
            return Err(WireError::Malformed(format!(
                "header hash must be {HASH_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(&bytes);
        Ok(HeaderHash(arr))
    }
}

impl fmt::Display for HeaderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Wallet address: base64 of the SEC1-encoded secp256k1 verifying key.
///
/// The reserved value [`NETWORK_ADDRESS`] marks coinbase senders and never
/// corresponds to a real key.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(text: impl Into<String>) -> Self {
        Address(text.into())
    }

    /// The coinbase sender.
    pub fn network() -> Self {
        Address(NETWORK_ADDRESS.to_string())
    }

    pub fn is_network(&self) -> bool {
        self.0 == NETWORK_ADDRESS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
