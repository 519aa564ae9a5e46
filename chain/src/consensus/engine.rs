//! High-level consensus engine orchestration.
//!
//! The engine wires together:
//!
//! - a [`ChainStore`] for persistence,
//! - a [`BlockValidator`] for proof-of-work and ledger validity,
//! - the key schedule for candidate assembly,
//! - the Pollard-rho miner for sealing.
//!
//! It exposes methods to assemble and mine candidate blocks, to import
//! sealed blocks into the canonical chain, to verify and adopt peer
//! chains, and to reconstruct the time-release private key a mined block
//! published.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use num_bigint::BigUint;

use crate::crypto::elgamal::{self, Ciphertext, PrivateKey};
use crate::mining::{seal, MineOutcome};
use crate::schedule::schedule_next;
use crate::types::{Address, Block, HeaderHash, Transaction};
use crate::validation::balance_of;

use super::config::ConsensusConfig;
use super::error::{ConsensusError, ValidationError};
use super::store::ChainStore;
use super::validator::BlockValidator;

/// Fully-configurable consensus engine.
///
/// This struct is generic over:
///
/// - `S`: storage backend implementing [`ChainStore`],
/// - `V`: block validator implementing [`BlockValidator`].
pub struct ChainEngine<S, V> {
    config: ConsensusConfig,
    store: S,
    validator: V,
}

impl<S, V> ChainEngine<S, V>
where
    S: ChainStore,
    V: BlockValidator,
{
    /// Creates a new consensus engine.
    pub fn new(config: ConsensusConfig, store: S, validator: V) -> Self {
        Self {
            config,
            store,
            validator,
        }
    }

    /// Writes the genesis block if the store is empty.
    pub fn init_genesis(&mut self) -> Result<(), ConsensusError> {
        if self.store.is_empty()? {
            self.store.append(&Block::genesis())?;
        }
        Ok(())
    }

    /// Returns a reference to the underlying chain store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a mutable reference to the underlying chain store.
    ///
    /// This is mainly useful for tests and tooling; consensus logic should
    /// normally go through [`import_block`](Self::import_block).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Returns the tip block, if any.
    pub fn tip(&self) -> Result<Option<Block>, ConsensusError> {
        Ok(self.store.tip()?)
    }

    /// Assembles an unsealed candidate on top of the current tip.
    ///
    /// The coinbase to `miner` comes first, then the drained pending
    /// transactions; the public key is the scheduled successor of the
    /// tip's key at `bit_length`.
    pub fn assemble_candidate(
        &self,
        miner: &Address,
        pending: Vec<Transaction>,
        timestamp: u64,
        bit_length: u64,
    ) -> Result<Block, ConsensusError> {
        let parent = self.store.tip()?.ok_or(ConsensusError::MissingParent)?;

        let mut transactions = Vec::with_capacity(pending.len() + 1);
        transactions.push(Transaction::coinbase(miner, self.config.mining_reward));
        transactions.extend(pending);

        Ok(Block::new(
            parent.height + 1,
            timestamp,
            transactions,
            schedule_next(&parent.public_key, bit_length),
            Some(parent.effective_header_hash()),
        ))
    }

    /// Runs the proof-of-work walk on `candidate` until the deadline.
    ///
    /// Returns the sealed block or [`MineOutcome::TimedOut`]; the caller
    /// decides whether to consult peers or retry with a fresh timestamp.
    pub fn mine_one(
        &self,
        candidate: &Block,
        deadline: Instant,
        stop: Option<&AtomicBool>,
    ) -> MineOutcome {
        seal(
            candidate,
            deadline,
            stop,
            self.config.accept_mirror_solutions,
            &mut rand::thread_rng(),
        )
    }

    /// Validates `block` against the local chain and appends it.
    pub fn import_block(&mut self, block: Block) -> Result<HeaderHash, ConsensusError> {
        let ancestors = self.store.all_blocks()?;
        self.validator.validate(&block, &ancestors)?;
        let hash = block.effective_header_hash();
        self.store.append(&block)?;
        Ok(hash)
    }

    /// Validates a complete chain, genesis included, against every
    /// consensus rule.
    pub fn verify_chain(&self, blocks: &[Block]) -> Result<(), ValidationError> {
        if blocks.is_empty() {
            return Err(ValidationError::Invalid("chain is empty"));
        }
        for (i, block) in blocks.iter().enumerate() {
            self.validator.validate(block, &blocks[..i])?;
        }
        Ok(())
    }

    /// Longest-chain rule over fetched peer chains.
    ///
    /// Adopts the longest valid candidate that is strictly longer than the
    /// local chain; ties keep our own. Returns whether an adoption
    /// happened. Invalid candidates are skipped silently.
    pub fn adopt_longest(&mut self, mut chains: Vec<Vec<Block>>) -> Result<bool, ConsensusError> {
        chains.sort_by_key(|chain| std::cmp::Reverse(chain.len()));

        let local_len = self.store.len()?;
        for chain in chains {
            if chain.len() as u64 <= local_len {
                break;
            }
            match self.verify_chain(&chain) {
                Ok(()) => {
                    tracing::info!(
                        local = local_len,
                        peer = chain.len(),
                        "adopting longer peer chain"
                    );
                    self.store.replace_chain(&chain)?;
                    return Ok(true);
                }
                Err(e) => {
                    tracing::debug!("discarding invalid peer chain: {e}");
                }
            }
        }
        Ok(false)
    }

    /// Full-history balance scan for `addr`.
    pub fn balance_of(&self, addr: &Address) -> Result<i128, ConsensusError> {
        Ok(balance_of(&self.store.all_blocks()?, addr))
    }

    /// Reconstructs the private key that mining the block at `height`
    /// published.
    pub fn release_key_for(&self, height: u64) -> Result<PrivateKey, ConsensusError> {
        let block = self
            .store
            .get(height)?
            .ok_or_else(|| ConsensusError::Other(format!("no block at height {height}")))?;
        let solution = block
            .solution
            .as_ref()
            .ok_or_else(|| ConsensusError::Other(format!("block {height} is not sealed")))?;
        solution
            .to_private_key(self.config.accept_mirror_solutions)
            .map_err(|e| ConsensusError::Other(format!("solution at height {height}: {e}")))
    }

    /// Decrypts a ciphertext whose release height is `height`, using the
    /// private key recovered from that block's solution.
    pub fn decrypt_at(&self, height: u64, ct: &Ciphertext) -> Result<BigUint, ConsensusError> {
        let key = self.release_key_for(height)?;
        elgamal::decrypt(&key, ct).map_err(|e| ConsensusError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::consensus::validator::CombinedValidator;
    use crate::crypto::ecdsa::{generate_keypair, sign_message, K256Verifier, Keypair};
    use crate::storage::InMemoryChainStore;
    use crate::types::{tx::signing_payload, GENESIS_TIMESTAMP};
    use crate::validation::{LedgerValidity, PowValidity};

    type TestEngine =
        ChainEngine<InMemoryChainStore, CombinedValidator<PowValidity, LedgerValidity<K256Verifier>>>;

    const TINY_BITS: u64 = 16;

    fn tiny_config() -> ConsensusConfig {
        ConsensusConfig {
            initial_bit_length: TINY_BITS,
            ..ConsensusConfig::default()
        }
    }

    fn engine() -> TestEngine {
        let cfg = tiny_config();
        let validator =
            CombinedValidator::new(PowValidity::new(&cfg), LedgerValidity::new(K256Verifier, &cfg));
        let mut engine = ChainEngine::new(cfg, InMemoryChainStore::new(), validator);
        engine.init_genesis().expect("genesis");
        engine
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(120)
    }

    /// Assembles, mines, and imports one block with the given pending set.
    fn mine_block(engine: &mut TestEngine, miner: &Address, pending: Vec<Transaction>) -> Block {
        let tip = engine.tip().expect("store").expect("tip");
        let candidate = engine
            .assemble_candidate(miner, pending, GENESIS_TIMESTAMP + 30 * (tip.height + 1), TINY_BITS)
            .expect("assemble");
        match engine.mine_one(&candidate, deadline(), None) {
            MineOutcome::Sealed(block) => {
                engine.import_block(block.clone()).expect("import");
                block
            }
            MineOutcome::TimedOut => panic!("tiny difficulty must not time out"),
        }
    }

    fn signed_transfer(from: &Keypair, to: &Address, amount: u64) -> Transaction {
        let payload = signing_payload(&from.address, to, amount);
        let signature = sign_message(&from.secret_hex, &payload).expect("sign");
        Transaction::transfer(from.address.clone(), to.clone(), amount, signature)
    }

    #[test]
    fn genesis_then_one_mined_block() {
        let mut engine = engine();
        let miner = Address::new("miner");
        let block = mine_block(&mut engine, &miner, Vec::new());

        assert_eq!(engine.store().len().expect("len"), 2);
        assert_eq!(block.height, 1);
        // Emitted blocks link by header hash and follow the key schedule.
        let genesis = engine.store().get(0).expect("read").expect("genesis");
        assert_eq!(block.prev_block_hash, Some(genesis.header_hash()));
        assert_eq!(
            block.public_key,
            schedule_next(&genesis.public_key, TINY_BITS)
        );
        assert_eq!(engine.balance_of(&miner).expect("balance"), 100);
    }

    #[test]
    fn chain_of_three_verifies_end_to_end() {
        let mut engine = engine();
        let miner = Address::new("miner");
        for _ in 0..3 {
            mine_block(&mut engine, &miner, Vec::new());
        }
        let chain = engine.store().all_blocks().expect("chain");
        assert_eq!(chain.len(), 4);
        engine.verify_chain(&chain).expect("own chain verifies");

        for pair in chain.windows(2) {
            assert_eq!(pair[1].prev_block_hash, Some(pair[0].header_hash()));
        }
    }

    #[test]
    fn time_release_message_roundtrips() {
        // S2: encrypt against the next scheduled key, mine that block,
        // decrypt with the published solution.
        let mut engine = engine();
        let tip = engine.tip().expect("store").expect("tip");
        // One block above the tip: the key the next mined block will carry.
        let future_key = schedule_next(&tip.public_key, TINY_BITS);

        let m = BigUint::from(12_345u32) % &future_key.p;
        let ct = elgamal::encrypt(&future_key, &m, &mut rand::thread_rng()).expect("encrypt");

        mine_block(&mut engine, &Address::new("miner"), Vec::new());

        let decrypted = engine.decrypt_at(1, &ct).expect("decrypt");
        assert_eq!(decrypted, m);
    }

    #[test]
    fn balances_follow_transfers_across_blocks() {
        // S3 shape: fund alice by mining to her address, then move coins
        // along alice -> bob -> carol.
        let alice = generate_keypair();
        let bob = generate_keypair();
        let carol = generate_keypair();

        let mut engine = engine();
        mine_block(&mut engine, &alice.address, Vec::new());
        mine_block(
            &mut engine,
            &alice.address,
            vec![
                signed_transfer(&alice, &bob.address, 40),
                signed_transfer(&bob, &carol.address, 30),
            ],
        );

        assert_eq!(engine.balance_of(&alice.address).expect("balance"), 160);
        assert_eq!(engine.balance_of(&bob.address).expect("balance"), 10);
        assert_eq!(engine.balance_of(&carol.address).expect("balance"), 30);
    }

    #[test]
    fn unfunded_transfer_cannot_be_imported() {
        let alice = generate_keypair();
        let bob = generate_keypair();

        let mut engine = engine();
        let candidate = engine
            .assemble_candidate(
                &Address::new("miner"),
                vec![signed_transfer(&alice, &bob.address, 1)],
                GENESIS_TIMESTAMP + 30,
                TINY_BITS,
            )
            .expect("assemble");
        let sealed = match engine.mine_one(&candidate, deadline(), None) {
            MineOutcome::Sealed(block) => block,
            MineOutcome::TimedOut => panic!("timeout"),
        };
        assert!(engine.import_block(sealed).is_err());
    }

    #[test]
    fn longer_valid_peer_chain_is_adopted() {
        // S5: a node with the shorter chain adopts the longer peer chain.
        let mut ours = engine();
        let mut peer = engine();
        let miner = Address::new("miner");

        mine_block(&mut ours, &miner, Vec::new());
        mine_block(&mut peer, &miner, Vec::new());
        mine_block(&mut peer, &miner, Vec::new());

        let peer_chain = peer.store().all_blocks().expect("peer chain");
        let peer_tip = peer.tip().expect("store").expect("peer tip").header_hash();

        let adopted = ours.adopt_longest(vec![peer_chain]).expect("adopt");
        assert!(adopted);
        assert_eq!(ours.store().len().expect("len"), 3);
        assert_eq!(
            ours.tip().expect("store").expect("tip").header_hash(),
            peer_tip
        );
    }

    #[test]
    fn equal_length_peer_chain_keeps_our_own() {
        let mut ours = engine();
        let mut peer = engine();
        let miner = Address::new("miner");

        mine_block(&mut ours, &miner, Vec::new());
        mine_block(&mut peer, &miner, Vec::new());

        let our_tip = ours.tip().expect("store").expect("tip").header_hash();
        let peer_chain = peer.store().all_blocks().expect("peer chain");
        let adopted = ours.adopt_longest(vec![peer_chain]).expect("adopt");
        assert!(!adopted);
        assert_eq!(
            ours.tip().expect("store").expect("tip").header_hash(),
            our_tip
        );
    }

    #[test]
    fn tampered_peer_chain_is_discarded() {
        // S6: altering a mined block's body breaks the chain for the
        // verifier, so the chain is rejected outright.
        let mut ours = engine();
        let mut peer = engine();
        let miner = Address::new("miner");

        mine_block(&mut peer, &miner, Vec::new());
        mine_block(&mut peer, &miner, Vec::new());

        let mut chain = peer.store().all_blocks().expect("peer chain");
        chain[1]
            .transactions
            .push(Transaction::coinbase(&Address::new("thief"), 100));

        let adopted = ours.adopt_longest(vec![chain]).expect("adopt");
        assert!(!adopted);
        assert_eq!(ours.store().len().expect("len"), 1);
    }

    #[test]
    fn release_key_requires_a_sealed_block() {
        let engine = engine();
        assert!(engine.release_key_for(0).is_err());
    }
}
