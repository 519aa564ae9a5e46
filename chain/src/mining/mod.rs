//! Proof-of-work mining: the header-hash oracle and the Pollard-rho
//! discrete-log walk it drives.
//!
//! Solving a block's proof of work *is* recovering the private key for
//! that block's public key; sealing and key publication are the same act.

pub mod oracle;
pub mod pollard_rho;

pub use oracle::HeaderOracle;
pub use pollard_rho::{seal, seal_candidate, MineOutcome, PollardRhoMiner};
