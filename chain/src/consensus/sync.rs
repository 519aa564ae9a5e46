//! Peer polling and longest-chain consensus.
//!
//! When mining times out, the miner loop asks every configured peer for
//! its chain and hands the results to
//! [`ChainEngine::adopt_longest`](super::engine::ChainEngine::adopt_longest).
//! Unreachable peers are skipped silently; invalid chains are discarded by
//! the engine's full validation.

use crate::peers::PeerClient;
use crate::types::Block;

use super::engine::ChainEngine;
use super::error::ConsensusError;
use super::store::ChainStore;
use super::validator::BlockValidator;

/// Fetches the chain of every reachable peer.
///
/// Fetch failures are logged at debug level and skipped; this function
/// never fails as a whole.
pub fn find_new_chains(client: &dyn PeerClient, peers: &[String]) -> Vec<Vec<Block>> {
    let mut chains = Vec::new();
    for peer in peers {
        match client.fetch_chain(peer) {
            Ok(chain) => chains.push(chain),
            Err(e) => {
                tracing::debug!(peer = %peer, "skipping unreachable peer: {e}");
            }
        }
    }
    chains
}

/// One consensus round: poll peers, adopt the longest valid chain if it is
/// strictly longer than ours. Returns whether an adoption happened.
pub fn run_consensus<S, V>(
    engine: &mut ChainEngine<S, V>,
    client: &dyn PeerClient,
    peers: &[String],
) -> Result<bool, ConsensusError>
where
    S: ChainStore,
    V: BlockValidator,
{
    let chains = find_new_chains(client, peers);
    engine.adopt_longest(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::validator::AcceptAllValidator;
    use crate::consensus::ConsensusConfig;
    use crate::peers::PeerError;
    use crate::storage::InMemoryChainStore;
    use crate::types::GENESIS_TIMESTAMP;

    /// Serves canned chains keyed by peer URL; unknown peers fail.
    struct CannedPeers {
        chains: Vec<(String, Vec<Block>)>,
    }

    impl PeerClient for CannedPeers {
        fn fetch_chain(&self, base_url: &str) -> Result<Vec<Block>, PeerError> {
            self.chains
                .iter()
                .find(|(url, _)| url == base_url)
                .map(|(_, chain)| chain.clone())
                .ok_or_else(|| PeerError::Transport("connection refused".to_string()))
        }
    }

    /// A structurally plausible chain of `len` blocks; contents do not
    /// matter because the engine under test accepts everything.
    fn dummy_chain(len: u64) -> Vec<Block> {
        let genesis = Block::genesis();
        let mut chain = vec![genesis.clone()];
        for height in 1..len {
            chain.push(Block::new(
                height,
                GENESIS_TIMESTAMP + height,
                Vec::new(),
                genesis.public_key.clone(),
                Some(chain[height as usize - 1].header_hash()),
            ));
        }
        chain
    }

    fn engine_with_len(len: u64) -> ChainEngine<InMemoryChainStore, AcceptAllValidator> {
        let mut engine = ChainEngine::new(
            ConsensusConfig::default(),
            InMemoryChainStore::new(),
            AcceptAllValidator,
        );
        for block in dummy_chain(len) {
            engine.store_mut().append(&block).expect("append");
        }
        engine
    }

    #[test]
    fn adopts_the_longest_reachable_chain() {
        // Property 8: adopted length is max(local, max of peers).
        let mut engine = engine_with_len(2);
        let client = CannedPeers {
            chains: vec![
                ("http://a".to_string(), dummy_chain(3)),
                ("http://b".to_string(), dummy_chain(5)),
            ],
        };
        let peers = vec![
            "http://a".to_string(),
            "http://b".to_string(),
            "http://down".to_string(),
        ];

        let adopted = run_consensus(&mut engine, &client, &peers).expect("consensus");
        assert!(adopted);
        assert_eq!(engine.store().len().expect("len"), 5);
    }

    #[test]
    fn shorter_and_equal_peers_change_nothing() {
        let mut engine = engine_with_len(4);
        let client = CannedPeers {
            chains: vec![
                ("http://a".to_string(), dummy_chain(3)),
                ("http://b".to_string(), dummy_chain(4)),
            ],
        };
        let peers = vec!["http://a".to_string(), "http://b".to_string()];

        let adopted = run_consensus(&mut engine, &client, &peers).expect("consensus");
        assert!(!adopted);
        assert_eq!(engine.store().len().expect("len"), 4);
    }

    #[test]
    fn unreachable_peers_are_skipped_silently() {
        let client = CannedPeers { chains: Vec::new() };
        let chains = find_new_chains(&client, &["http://down".to_string()]);
        assert!(chains.is_empty());
    }
}
