//! Header-hash oracle: double SHA-256 over the canonical block header.
//!
//! The canonical preimage is the ASCII concatenation
//!
//! ```text
//! decimal(height) ‖ decimal(timestamp) ‖ hex(body_hash) ‖ pubkey-triple ‖ varying
//! ```
//!
//! where `pubkey-triple` is the `0x<g>, 0x<h>, 0x<p>` text form and
//! `varying` is the decimal of whatever fills the nonce slot: the nonce
//! when hashing a sealed header, the walk's current group element inside
//! the miner. The prefix up to `varying` is constant per candidate block,
//! so its SHA-256 state is absorbed once and cloned per probe; a probe
//! costs two SHA-256 finalizations.
//!
//! The digest-to-integer reduction is **signed little-endian** mod `p`.
//! This is a protocol-defining choice: change it and every node's walk
//! diverges.

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use sha2::{Digest, Sha256};

use crate::types::{Block, HASH_LEN};

/// Per-candidate hash oracle with the constant header prefix pre-absorbed.
///
/// Each walker owns its own oracle; the cloned SHA-256 state is scratch,
/// never shared.
#[derive(Clone)]
pub struct HeaderOracle {
    prefix: Sha256,
    p: BigUint,
}

impl HeaderOracle {
    /// Absorbs the constant header fields of `block`.
    pub fn for_block(block: &Block) -> Self {
        let mut prefix = Sha256::new();
        prefix.update(block.height.to_string().as_bytes());
        prefix.update(block.timestamp.to_string().as_bytes());
        prefix.update(hex::encode(block.body_hash()).as_bytes());
        prefix.update(block.public_key.to_string().as_bytes());
        HeaderOracle {
            prefix,
            p: block.public_key.p.clone(),
        }
    }

    /// `SHA-256(SHA-256(prefix ‖ varying))`.
    pub fn digest(&self, varying: &[u8]) -> [u8; HASH_LEN] {
        let mut first = self.prefix.clone();
        first.update(varying);
        Sha256::digest(first.finalize()).into()
    }

    /// Header hash with the walk element `y` in the nonce slot, reduced to
    /// an integer in `[0, p)` via the signed little-endian interpretation.
    pub fn int_mod_p(&self, y: &BigUint) -> BigUint {
        let digest = self.digest(y.to_string().as_bytes());
        let value = BigInt::from_signed_bytes_le(&digest);
        let p = BigInt::from(self.p.clone());
        value
            .mod_floor(&p)
            .to_biguint()
            .expect("mod_floor yields a non-negative value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> HeaderOracle {
        HeaderOracle::for_block(&Block::genesis())
    }

    #[test]
    fn cached_prefix_matches_full_recompute() {
        let block = Block::genesis();
        let oracle = HeaderOracle::for_block(&block);
        let varying = b"1234567890";

        let mut full = Sha256::new();
        full.update(block.height.to_string().as_bytes());
        full.update(block.timestamp.to_string().as_bytes());
        full.update(hex::encode(block.body_hash()).as_bytes());
        full.update(block.public_key.to_string().as_bytes());
        full.update(varying);
        let expected: [u8; HASH_LEN] = Sha256::digest(full.finalize()).into();

        assert_eq!(oracle.digest(varying), expected);
    }

    #[test]
    fn reduction_is_signed_and_in_range() {
        let oracle = oracle();
        let p = Block::genesis().public_key.p;

        for y in [1u32, 2, 999, 65_535] {
            let y = BigUint::from(y);
            let reduced = oracle.int_mod_p(&y);
            assert!(reduced < p, "reduced value must land in [0, p)");

            // The signed interpretation must differ from the unsigned one
            // whenever the top digest bit is set.
            let digest = oracle.digest(y.to_string().as_bytes());
            if digest[HASH_LEN - 1] & 0x80 != 0 {
                let unsigned = BigUint::from_bytes_le(&digest) % &p;
                assert_ne!(reduced, unsigned, "sign bit must matter for y={y}");
            }
        }
    }

    #[test]
    fn different_varying_fields_hash_differently() {
        let oracle = oracle();
        assert_ne!(oracle.digest(b"1"), oracle.digest(b"2"));
    }
}
