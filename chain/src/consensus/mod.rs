//! Consensus engine and related abstractions.
//!
//! This module provides a modular, testable consensus layer consisting of:
//!
//! - configuration parameters ([`config::ConsensusConfig`]),
//! - error types ([`error::ConsensusError`], [`error::ValidationError`]),
//! - the storage abstraction ([`store::ChainStore`]),
//! - pluggable validity predicates ([`validator::BlockValidator`]),
//! - the engine itself ([`engine::ChainEngine`]),
//! - peer polling and longest-chain adoption ([`sync`]).

pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod sync;
pub mod validator;

pub use config::ConsensusConfig;
pub use engine::ChainEngine;
pub use error::{ConsensusError, ValidationError};
pub use store::{ChainStore, LogRecord};
pub use sync::{find_new_chains, run_consensus};
pub use validator::{AcceptAllValidator, BlockValidator, CombinedValidator};
