//! Clients for fetching chains from peer nodes.
//!
//! This module provides the generic [`PeerClient`] trait the consensus
//! layer polls during longest-chain rounds, and a concrete HTTP
//! implementation that talks to a peer's `/blocks` endpoint.

pub mod http;

pub use http::HttpPeerClient;

use std::fmt;

use crate::types::Block;

/// Errors that can occur while fetching a peer's chain.
#[derive(Debug)]
pub enum PeerError {
    /// Transport-level error (e.g. HTTP failure, timeout).
    Transport(String),
    /// The peer returned a malformed or undecodable chain.
    Protocol(String),
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerError::Transport(msg) => write!(f, "peer transport error: {msg}"),
            PeerError::Protocol(msg) => write!(f, "peer protocol error: {msg}"),
        }
    }
}

impl std::error::Error for PeerError {}

/// Abstract peer-chain fetcher used by consensus rounds.
///
/// Implementations are responsible for contacting the peer and decoding
/// its chain into domain blocks; validation is the engine's job.
pub trait PeerClient: Send + Sync {
    fn fetch_chain(&self, base_url: &str) -> Result<Vec<Block>, PeerError>;
}
