//! Block type, body/header hashing, and the genesis block.
//!
//! A block carries the ElGamal public key whose private counterpart the
//! miner must discover, the Pollard-rho `solution` that publishes it, and
//! the `nonce` (the group element at the walk's collision point). The
//! header digest is double SHA-256 over a canonical ASCII preimage; see
//! [`crate::mining::HeaderOracle`] for the exact layout.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::crypto::elgamal::{generate_pub_key, PublicKey};
use crate::mining::HeaderOracle;

use super::{HeaderHash, Solution, Transaction, HASH_LEN};

/// Seed of the genesis public key.
pub const GENESIS_SEED: u64 = 0xFFFF_FFFF_FFFF;

/// Bit length of the genesis public key.
pub const GENESIS_BIT_LENGTH: u64 = 32;

/// Fixed genesis timestamp so independent nodes derive identical genesis
/// headers and can validate each other's chains.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// One block of the chain.
#[derive(Clone, Debug)]
pub struct Block {
    /// Height, 0 at genesis.
    pub height: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Header hash of the parent; `None` only at genesis.
    pub prev_block_hash: Option<HeaderHash>,
    /// The key this block's proof of work attacks.
    pub public_key: PublicKey,
    /// Group element at the walk's collision point; `None` until sealed.
    pub nonce: Option<BigUint>,
    /// The Pollard-rho collision publishing the private key.
    pub solution: Option<Solution>,
    /// Coinbase first, then the drained pending transactions.
    pub transactions: Vec<Transaction>,
    /// Header hash as loaded from the store or the wire.
    ///
    /// Kept separate from the derivable value so validation can detect a
    /// body that no longer matches the recorded header.
    pub cached_header_hash: Option<HeaderHash>,
}

impl Block {
    /// A fresh, unsealed block.
    pub fn new(
        height: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        public_key: PublicKey,
        prev_block_hash: Option<HeaderHash>,
    ) -> Self {
        Block {
            height,
            timestamp,
            prev_block_hash,
            public_key,
            nonce: None,
            solution: None,
            transactions,
            cached_header_hash: None,
        }
    }

    /// The genesis block: height 0, no transactions, no proof of work,
    /// and the fixed seed public key every node agrees on.
    pub fn genesis() -> Self {
        let seed = BigUint::from(GENESIS_SEED);
        Block::new(
            0,
            GENESIS_TIMESTAMP,
            Vec::new(),
            generate_pub_key(GENESIS_BIT_LENGTH, &seed),
            None,
        )
    }

    /// The difficulty tag: bit length of the block's public key.
    pub fn difficulty(&self) -> u64 {
        self.public_key.bit_length
    }

    /// SHA-256 over the compact-JSON list of body-canonical transactions.
    /// Flat hash, no Merkle tree.
    pub fn body_hash(&self) -> [u8; HASH_LEN] {
        let bodies: Vec<serde_json::Value> =
            self.transactions.iter().map(|tx| tx.body_json()).collect();
        let text = serde_json::Value::Array(bodies).to_string();
        Sha256::digest(text.as_bytes()).into()
    }

    /// Recomputes the header digest from the canonical preimage.
    pub fn header_hash(&self) -> HeaderHash {
        HeaderHash(HeaderOracle::for_block(self).digest(self.nonce_text().as_bytes()))
    }

    /// The header hash recorded at load time if present, otherwise
    /// recomputed. Candidate assembly links against this value so a chain
    /// loaded from the store does not re-hash every parent.
    pub fn effective_header_hash(&self) -> HeaderHash {
        self.cached_header_hash.unwrap_or_else(|| self.header_hash())
    }

    /// Decimal form of the nonce as it enters the header preimage; an
    /// unsealed block contributes the empty string.
    pub fn nonce_text(&self) -> String {
        self.nonce.as_ref().map(BigUint::to_string).unwrap_or_default()
    }
}
