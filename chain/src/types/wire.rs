//! Wire (JSON) form of blocks and transactions.
//!
//! This is the schema served by `GET /blocks` and `GET /last` and
//! consumed back by peers during consensus: header hashes hex-encoded,
//! the public key as its hex triple, the nonce in decimal, the solution
//! in its csv form, and transactions inlined as objects.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::crypto::elgamal::{Ciphertext, PublicKey};

use super::{Address, Block, HeaderHash, Solution, Transaction};

/// Decoding errors for wire payloads.
#[derive(Debug)]
pub enum WireError {
    Malformed(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Malformed(msg) => write!(f, "malformed wire data: {msg}"),
        }
    }
}

impl std::error::Error for WireError {}

/// A transaction as it appears inside a wire block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxWire {
    pub addr_from: String,
    pub addr_to: String,
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cipher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub release_block_idx: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<String>,
    /// Height of the owning block; informational on the wire.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub block_height: Option<u64>,
}

/// A block as served by `/blocks` and `/last`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockWire {
    pub height: u64,
    pub timestamp: u64,
    pub header_hash: String,
    pub difficulty: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prev_block_hash: Option<String>,
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub solution: Option<String>,
    pub transactions: Vec<TxWire>,
}

impl TxWire {
    pub fn from_tx(tx: &Transaction, block_height: Option<u64>) -> Self {
        TxWire {
            addr_from: tx.addr_from.to_string(),
            addr_to: tx.addr_to.to_string(),
            amount: tx.amount,
            cipher: tx.cipher.as_ref().map(Ciphertext::to_string),
            release_block_idx: tx.release_block_idx,
            signature: tx.signature.clone(),
            block_height,
        }
    }

    pub fn into_transaction(self) -> Result<Transaction, WireError> {
        let cipher = self
            .cipher
            .as_deref()
            .map(Ciphertext::from_hex_str)
            .transpose()
            .map_err(|e| WireError::Malformed(e.to_string()))?;
        Ok(Transaction {
            addr_from: Address::new(self.addr_from),
            addr_to: Address::new(self.addr_to),
            amount: self.amount,
            cipher,
            release_block_idx: self.release_block_idx,
            signature: self.signature,
        })
    }
}

impl From<&Block> for BlockWire {
    fn from(block: &Block) -> Self {
        BlockWire {
            height: block.height,
            timestamp: block.timestamp,
            header_hash: block.effective_header_hash().to_hex(),
            difficulty: block.difficulty(),
            prev_block_hash: block.prev_block_hash.map(|h| h.to_hex()),
            public_key: block.public_key.to_string(),
            nonce: block.nonce.as_ref().map(BigUint::to_string),
            solution: block.solution.as_ref().map(Solution::to_string),
            transactions: block
                .transactions
                .iter()
                .map(|tx| TxWire::from_tx(tx, Some(block.height)))
                .collect(),
        }
    }
}

impl BlockWire {
    /// Decodes into a domain block. The served header hash is kept as the
    /// block's recorded hash so validation can compare it against the
    /// recomputed one.
    pub fn into_block(self) -> Result<Block, WireError> {
        let public_key = PublicKey::from_hex_str(&self.public_key)
            .map_err(|e| WireError::Malformed(e.to_string()))?;

        let solution = self
            .solution
            .as_deref()
            .map(|text| Solution::parse(text, public_key.clone()))
            .transpose()
            .map_err(|e| WireError::Malformed(e.to_string()))?;

        let nonce = self
            .nonce
            .as_deref()
            .map(|text| {
                text.parse::<BigUint>()
                    .map_err(|e| WireError::Malformed(format!("bad nonce {text:?}: {e}")))
            })
            .transpose()?;

        let prev_block_hash = self
            .prev_block_hash
            .as_deref()
            .map(HeaderHash::from_hex)
            .transpose()?;

        let transactions = self
            .transactions
            .into_iter()
            .map(TxWire::into_transaction)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Block {
            height: self.height,
            timestamp: self.timestamp,
            prev_block_hash,
            public_key,
            nonce,
            solution,
            transactions,
            cached_header_hash: Some(HeaderHash::from_hex(&self.header_hash)?),
        })
    }
}
