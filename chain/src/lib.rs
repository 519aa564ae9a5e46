//! Chain library crate.
//!
//! This crate provides the core building blocks of the time-release
//! blockchain, where proof of work is a discrete-log attack and sealing a
//! block publishes the private key that unlocks every ciphertext
//! scheduled for that height:
//!
//! - strongly-typed domain types (`types`),
//! - ElGamal keys, deterministic generation, and encryption (`crypto`),
//! - the header-hash oracle and Pollard-rho miner (`mining`),
//! - the chained key schedule and difficulty control (`schedule`),
//! - a modular consensus engine (`consensus`),
//! - block validity predicates (`validation`),
//! - storage backends (`storage`),
//! - peer-chain clients (`peers`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level node configuration (`config`).
//!
//! Higher-level binaries compose these pieces into nodes, miners, and
//! wallets.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod metrics;
pub mod mining;
pub mod peers;
pub mod schedule;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export top-level configuration types.
pub use config::{ChainConfig, MetricsConfig, MinerConfig, PeerConfig};

// Re-export "core" consensus types and traits.
pub use consensus::{
    AcceptAllValidator, BlockValidator, ChainEngine, ChainStore, CombinedValidator,
    ConsensusConfig, ConsensusError, LogRecord, ValidationError,
};

// Re-export cryptographic primitives.
pub use crypto::{
    decrypt, encrypt, generate_pub_key, Ciphertext, ElGamalError, K256Verifier, PrivateKey,
    PublicKey, SignatureError, SignatureVerifier,
};

// Re-export mining interfaces.
pub use mining::{seal, seal_candidate, HeaderOracle, MineOutcome, PollardRhoMiner};

// Re-export the key schedule and difficulty controller.
pub use schedule::{fast_forward, schedule_next, DifficultyController};

// Re-export storage backends.
pub use storage::{InMemoryChainStore, RocksDbChainStore, RocksDbConfig, StorageError};

// Re-export validity predicates.
pub use validation::{balance_of, LedgerValidity, PowValidity};

// Re-export peer clients.
pub use peers::{HttpPeerClient, PeerClient, PeerError};

// Re-export metrics registry and exporter.
pub use metrics::{run_prometheus_http_server, MetricsRegistry, MiningMetrics};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the default block validator stack used by a "typical"
/// node.
///
/// This composes:
///
/// - [`PowValidity`] for linkage, schedule, header, and solution checks,
/// - [`LedgerValidity<K256Verifier>`] for signatures and balances.
pub type DefaultBlockValidator = CombinedValidator<PowValidity, LedgerValidity<K256Verifier>>;

/// Type alias for the default block store backend.
pub type DefaultChainStore = RocksDbChainStore;

/// Type alias for the default consensus engine stack.
///
/// This uses:
///
/// - [`DefaultChainStore`] (RocksDB),
/// - [`DefaultBlockValidator`] (proof-of-work + ledger).
pub type DefaultChainEngine = ChainEngine<DefaultChainStore, DefaultBlockValidator>;

/// Builds the default engine stack from a [`ChainConfig`].
pub fn default_engine(cfg: &ChainConfig) -> Result<DefaultChainEngine, ConsensusError> {
    let store = RocksDbChainStore::open(&cfg.storage)?;
    let validator = CombinedValidator::new(
        PowValidity::new(&cfg.consensus),
        LedgerValidity::new(K256Verifier, &cfg.consensus),
    );
    let mut engine = ChainEngine::new(cfg.consensus.clone(), store, validator);
    engine.init_genesis()?;
    Ok(engine)
}
