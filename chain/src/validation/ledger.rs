//! Ledger validity: transaction signatures and running balances.
//!
//! This validator is generic over a [`SignatureVerifier`] so consensus
//! code never depends on a concrete curve implementation, and tests can
//! substitute verdicts freely. Balances are a full-history scan — every
//! credit and debit from genesis — plus the transactions earlier in the
//! same block, so a transfer can spend an output it received one position
//! earlier.

use std::collections::HashMap;

use crate::consensus::config::ConsensusConfig;
use crate::consensus::error::ValidationError;
use crate::consensus::validator::BlockValidator;
use crate::crypto::ecdsa::SignatureVerifier;
use crate::types::{Address, Block};

/// Sums `addr`'s balance over `blocks`: coinbase and transfer credits
/// minus transfer debits.
pub fn balance_of(blocks: &[Block], addr: &Address) -> i128 {
    let mut balance: i128 = 0;
    for block in blocks {
        for tx in &block.transactions {
            if &tx.addr_to == addr {
                balance += i128::from(tx.amount);
            }
            if &tx.addr_from == addr {
                balance -= i128::from(tx.amount);
            }
        }
    }
    balance
}

/// Ledger validity predicate: coinbase shape, signatures, balances.
pub struct LedgerValidity<V> {
    verifier: V,
    mining_reward: u64,
}

impl<V> LedgerValidity<V> {
    /// Constructs a new `LedgerValidity` from a verifier and the
    /// consensus configuration.
    pub fn new(verifier: V, cfg: &ConsensusConfig) -> Self {
        Self {
            verifier,
            mining_reward: cfg.mining_reward,
        }
    }
}

impl<V> BlockValidator for LedgerValidity<V>
where
    V: SignatureVerifier,
{
    fn validate(&self, block: &Block, ancestors: &[Block]) -> Result<(), ValidationError> {
        if ancestors.is_empty() {
            if !block.transactions.is_empty() {
                return Err(ValidationError::Invalid("genesis carries transactions"));
            }
            return Ok(());
        }

        let Some(first) = block.transactions.first() else {
            return Err(ValidationError::Invalid("block is missing its coinbase"));
        };
        if !first.is_coinbase() {
            return Err(ValidationError::Invalid(
                "first transaction must be the coinbase",
            ));
        }
        if first.amount != self.mining_reward {
            return Err(ValidationError::Custom(format!(
                "coinbase amount {} does not match reward {}",
                first.amount, self.mining_reward
            )));
        }
        if block.transactions.iter().skip(1).any(|tx| tx.is_coinbase()) {
            return Err(ValidationError::Invalid("more than one coinbase in block"));
        }

        // In-block balance deltas, applied in transaction order.
        let mut deltas: HashMap<&Address, i128> = HashMap::new();

        for tx in &block.transactions {
            if tx.is_coinbase() {
                *deltas.entry(&tx.addr_to).or_default() += i128::from(tx.amount);
                continue;
            }

            let signature = tx
                .signature
                .as_ref()
                .ok_or(ValidationError::Invalid("transaction is missing a signature"))?;
            let verified = self
                .verifier
                .verify(&tx.addr_from, signature, &tx.signing_payload())
                .map_err(|e| ValidationError::Custom(format!("signature check failed: {e}")))?;
            if !verified {
                return Err(ValidationError::Invalid("wrong signature"));
            }

            let available =
                balance_of(ancestors, &tx.addr_from) + deltas.get(&tx.addr_from).copied().unwrap_or(0);
            if available < i128::from(tx.amount) {
                return Err(ValidationError::Invalid("balance not enough"));
            }

            *deltas.entry(&tx.addr_from).or_default() -= i128::from(tx.amount);
            *deltas.entry(&tx.addr_to).or_default() += i128::from(tx.amount);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecdsa::{generate_keypair, sign_message, K256Verifier, Keypair};
    use crate::types::{tx::signing_payload, Transaction, GENESIS_TIMESTAMP};

    fn signed_transfer(from: &Keypair, to: &Address, amount: u64) -> Transaction {
        let payload = signing_payload(&from.address, to, amount);
        let signature = sign_message(&from.secret_hex, &payload).expect("sign");
        Transaction::transfer(from.address.clone(), to.clone(), amount, signature)
    }

    /// One ancestor block crediting `miner` with a single coinbase.
    fn funding_chain(miner: &Address, reward: u64) -> Vec<Block> {
        let genesis = Block::genesis();
        let funding = Block::new(
            1,
            GENESIS_TIMESTAMP + 30,
            vec![Transaction::coinbase(miner, reward)],
            genesis.public_key.clone(),
            Some(genesis.header_hash()),
        );
        vec![genesis, funding]
    }

    fn block_with(txs: Vec<Transaction>) -> Block {
        let genesis = Block::genesis();
        Block::new(
            2,
            GENESIS_TIMESTAMP + 60,
            txs,
            genesis.public_key.clone(),
            Some(genesis.header_hash()),
        )
    }

    fn validator() -> LedgerValidity<K256Verifier> {
        LedgerValidity::new(K256Verifier, &ConsensusConfig::default())
    }

    #[test]
    fn funded_transfer_validates() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let miner = Address::new("miner");
        let ancestors = funding_chain(&alice.address, 100);

        let block = block_with(vec![
            Transaction::coinbase(&miner, 100),
            signed_transfer(&alice, &bob.address, 40),
        ]);
        assert!(validator().validate(&block, &ancestors).is_ok());
    }

    #[test]
    fn overspend_is_rejected() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let ancestors = funding_chain(&alice.address, 100);

        let block = block_with(vec![
            Transaction::coinbase(&Address::new("miner"), 100),
            signed_transfer(&alice, &bob.address, 101),
        ]);
        let err = validator().validate(&block, &ancestors).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid("balance not enough")));
    }

    #[test]
    fn same_block_credit_can_be_spent() {
        // A -> B 40, then B -> C 30 inside the same block.
        let alice = generate_keypair();
        let bob = generate_keypair();
        let carol = generate_keypair();
        let ancestors = funding_chain(&alice.address, 100);

        let block = block_with(vec![
            Transaction::coinbase(&Address::new("miner"), 100),
            signed_transfer(&alice, &bob.address, 40),
            signed_transfer(&bob, &carol.address, 30),
        ]);
        assert!(validator().validate(&block, &ancestors).is_ok());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let ancestors = funding_chain(&alice.address, 100);

        let mut tx = signed_transfer(&alice, &bob.address, 10);
        tx.amount = 11; // signature no longer covers the payload
        let block = block_with(vec![Transaction::coinbase(&Address::new("miner"), 100), tx]);

        let err = validator().validate(&block, &ancestors).unwrap_err();
        assert!(matches!(err, ValidationError::Invalid("wrong signature")));
    }

    #[test]
    fn missing_coinbase_is_rejected() {
        let alice = generate_keypair();
        let bob = generate_keypair();
        let ancestors = funding_chain(&alice.address, 100);

        let block = block_with(vec![signed_transfer(&alice, &bob.address, 10)]);
        assert!(validator().validate(&block, &ancestors).is_err());
    }

    #[test]
    fn second_coinbase_is_rejected() {
        let miner = Address::new("miner");
        let ancestors = funding_chain(&miner, 100);
        let block = block_with(vec![
            Transaction::coinbase(&miner, 100),
            Transaction::coinbase(&miner, 100),
        ]);
        assert!(validator().validate(&block, &ancestors).is_err());
    }

    #[test]
    fn balances_accumulate_over_history() {
        let miner = Address::new("miner");
        let ancestors = funding_chain(&miner, 100);
        assert_eq!(balance_of(&ancestors, &miner), 100);
        assert_eq!(balance_of(&ancestors, &Address::new("nobody")), 0);
    }

    #[test]
    fn genesis_must_be_empty() {
        let mut genesis = Block::genesis();
        genesis
            .transactions
            .push(Transaction::coinbase(&Address::new("miner"), 100));
        assert!(validator().validate(&genesis, &[]).is_err());
    }
}
