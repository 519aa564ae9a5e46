//! HTTP-based peer-chain client.
//!
//! This implementation of [`PeerClient`] fetches `GET <base_url>/blocks`
//! and decodes the JSON array of wire blocks. It uses the blocking
//! `reqwest` client internally; the miner loop calls it from a blocking
//! task, never from an async context directly.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::types::{Block, BlockWire};

use super::{PeerClient, PeerError};

/// Blocking HTTP client for peer `/blocks` endpoints.
///
/// Thread-safe (`Send + Sync`) and shareable across consensus rounds.
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    /// Constructs a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PeerError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn endpoint(base_url: &str) -> String {
        format!("{}/blocks", base_url.trim_end_matches('/'))
    }
}

impl PeerClient for HttpPeerClient {
    fn fetch_chain(&self, base_url: &str) -> Result<Vec<Block>, PeerError> {
        let url = Self::endpoint(base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| PeerError::Transport(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PeerError::Transport(format!(
                "peer returned HTTP status {status}"
            )));
        }

        let wire: Vec<BlockWire> = resp
            .json()
            .map_err(|e| PeerError::Protocol(format!("failed to parse chain JSON: {e}")))?;

        wire.into_iter()
            .map(|w| {
                w.into_block()
                    .map_err(|e| PeerError::Protocol(format!("bad block in peer chain: {e}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slashes() {
        assert_eq!(
            HttpPeerClient::endpoint("http://127.0.0.1:5001/"),
            "http://127.0.0.1:5001/blocks"
        );
        assert_eq!(
            HttpPeerClient::endpoint("http://127.0.0.1:5001"),
            "http://127.0.0.1:5001/blocks"
        );
    }

    #[test]
    fn unreachable_peer_is_a_transport_error() {
        // Port 9 (discard) refuses connections in the test environment.
        let client = HttpPeerClient::new(Duration::from_millis(200)).expect("build client");
        let err = client.fetch_chain("http://127.0.0.1:9").unwrap_err();
        assert!(matches!(err, PeerError::Transport(_)));
    }
}
