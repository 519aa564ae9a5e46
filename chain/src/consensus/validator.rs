//! Block validity predicates used by consensus.

use crate::types::Block;

use super::error::ValidationError;

/// Pluggable validity predicate for blocks.
///
/// `ancestors` is the chain strictly below `block`, oldest first; the
/// parent, when one exists, is its last element. Implementations should be
/// deterministic and side-effect free.
pub trait BlockValidator {
    fn validate(&self, block: &Block, ancestors: &[Block]) -> Result<(), ValidationError>;
}

/// A trivial validator that accepts every block.
///
/// Useful for tests and for isolating engine logic while the real
/// validity predicates are being developed.
pub struct AcceptAllValidator;

impl BlockValidator for AcceptAllValidator {
    fn validate(&self, _block: &Block, _ancestors: &[Block]) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A validator that composes two other validators.
///
/// This keeps the proof-of-work checks and the ledger checks modular:
/// `CombinedValidator { pow, ledger }` runs `pow.validate` and then
/// `ledger.validate`, failing fast on the first error.
pub struct CombinedValidator<P, L> {
    pub pow: P,
    pub ledger: L,
}

impl<P, L> CombinedValidator<P, L> {
    pub fn new(pow: P, ledger: L) -> Self {
        Self { pow, ledger }
    }
}

impl<P, L> BlockValidator for CombinedValidator<P, L>
where
    P: BlockValidator,
    L: BlockValidator,
{
    fn validate(&self, block: &Block, ancestors: &[Block]) -> Result<(), ValidationError> {
        self.pow.validate(block, ancestors)?;
        self.ledger.validate(block, ancestors)?;
        Ok(())
    }
}
