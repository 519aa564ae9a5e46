//! Block validity predicates for the chain.
//!
//! This module implements concrete block validators that plug into the
//! consensus layer via [`crate::consensus::validator::BlockValidator`]:
//!
//! - [`pow::PowValidity`]: linkage, key-schedule, header, and solution
//!   checks — the proof-of-work side of validity.
//! - [`ledger::LedgerValidity`]: transaction signatures and running
//!   balances via a generic [`crate::crypto::SignatureVerifier`].

pub mod ledger;
pub mod pow;

pub use ledger::{balance_of, LedgerValidity};
pub use pow::PowValidity;
