//! Proof-of-work validity: linkage, schedule, header, and solution checks.
//!
//! This validator enforces rules that need no signature verification or
//! balance state:
//!
//! - the block extends its parent by exactly one height,
//! - `prev_block_hash` links to the parent's header,
//! - the public key is the scheduled successor of the parent's key at the
//!   block's difficulty, within the configured difficulty bounds,
//! - a recorded header hash still matches the recomputed one,
//! - the solution reconstructs a private key matching the block's key.
//!
//! Genesis has no parent; it must be byte-identical to the fixed genesis
//! block, which is checked via its header hash.

use crate::consensus::config::ConsensusConfig;
use crate::consensus::error::ValidationError;
use crate::consensus::validator::BlockValidator;
use crate::schedule::schedule_next;
use crate::types::Block;

/// Proof-of-work validity predicate for blocks.
#[derive(Clone, Debug)]
pub struct PowValidity {
    accept_mirror: bool,
    min_bits: u64,
    max_bits: u64,
}

impl PowValidity {
    /// Constructs a new `PowValidity` from the consensus configuration.
    pub fn new(cfg: &ConsensusConfig) -> Self {
        Self {
            accept_mirror: cfg.accept_mirror_solutions,
            min_bits: cfg.min_bit_length,
            max_bits: cfg.max_bit_length,
        }
    }

    fn check_genesis(&self, block: &Block) -> Result<(), ValidationError> {
        if block.height != 0 {
            return Err(ValidationError::Invalid("first block must have height 0"));
        }
        if block.header_hash() != Block::genesis().header_hash() {
            return Err(ValidationError::Invalid("genesis block mismatch"));
        }
        Ok(())
    }

    fn check_linkage(&self, block: &Block, parent: &Block) -> Result<(), ValidationError> {
        if block.height != parent.height + 1 {
            return Err(ValidationError::Invalid("height does not follow parent"));
        }
        match block.prev_block_hash {
            Some(prev) if prev == parent.effective_header_hash() => Ok(()),
            _ => Err(ValidationError::Invalid("previous header hash mismatch")),
        }
    }

    fn check_schedule(&self, block: &Block, parent: &Block) -> Result<(), ValidationError> {
        let bits = block.difficulty();
        if bits < self.min_bits || bits > self.max_bits {
            return Err(ValidationError::Custom(format!(
                "difficulty {bits} outside [{}, {}]",
                self.min_bits, self.max_bits
            )));
        }
        if block.public_key != schedule_next(&parent.public_key, bits) {
            return Err(ValidationError::Invalid(
                "public key does not follow the key schedule",
            ));
        }
        Ok(())
    }

    fn check_header(&self, block: &Block) -> Result<(), ValidationError> {
        if let Some(recorded) = block.cached_header_hash {
            if recorded != block.header_hash() {
                return Err(ValidationError::Invalid(
                    "recorded header hash does not match block contents",
                ));
            }
        }
        Ok(())
    }

    fn check_solution(&self, block: &Block) -> Result<(), ValidationError> {
        if block.nonce.is_none() {
            return Err(ValidationError::Invalid("sealed block is missing its nonce"));
        }
        let solution = block
            .solution
            .as_ref()
            .ok_or(ValidationError::Invalid("sealed block is missing its solution"))?;
        if solution.pubkey != block.public_key {
            return Err(ValidationError::Invalid(
                "solution is bound to a different public key",
            ));
        }
        solution
            .to_private_key(self.accept_mirror)
            .map_err(|e| ValidationError::Custom(format!("solution does not verify: {e}")))?;
        Ok(())
    }
}

impl BlockValidator for PowValidity {
    fn validate(&self, block: &Block, ancestors: &[Block]) -> Result<(), ValidationError> {
        let Some(parent) = ancestors.last() else {
            return self.check_genesis(block);
        };
        self.check_linkage(block, parent)?;
        self.check_schedule(block, parent)?;
        self.check_header(block)?;
        self.check_solution(block)?;
        Ok(())
    }
}
