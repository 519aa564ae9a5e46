//! Top-level configuration for a chain node.
//!
//! This module aggregates configuration for:
//!
//! - consensus parameters (`ConsensusConfig`),
//! - storage (RocksDB path and creation flags),
//! - peer polling (peer base URLs + fetch timeout),
//! - miner identity (reward address + node URL),
//! - metrics exporter (enable flag + listen address).
//!
//! The goal is to have a single `ChainConfig` struct that higher-level
//! binaries can construct from defaults or from the environment
//! (`MINER_ADDRESS`, `MINER_NODE`, `MINER_PORT`, `PEER_NODES`,
//! `BLOCKCHAIN_DB_URL`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::consensus::ConsensusConfig;
use crate::storage::RocksDbConfig;

/// Configuration for peer-chain polling.
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// Base URLs of peer nodes, e.g. `"http://127.0.0.1:5001"`.
    pub nodes: Vec<String>,
    /// Request timeout for peer chain fetches.
    pub timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Miner identity and home-node location.
#[derive(Clone, Debug)]
pub struct MinerConfig {
    /// Address credited by this node's coinbase transactions.
    pub address: String,
    /// Base URL (with port) of the node the miner drains pending
    /// transactions from.
    pub node_url: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            node_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        // Safe to unwrap: this is a fixed, valid address literal.
        let addr: SocketAddr = "127.0.0.1:9898"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        Self {
            enabled: true,
            listen_addr: addr,
        }
    }
}

/// Top-level configuration for a chain node.
///
/// This aggregates all the sub-configs needed to wire up a typical node:
///
/// - consensus tuning (`consensus`),
/// - persistent storage (`storage`),
/// - peer polling (`peers`),
/// - miner identity (`miner`),
/// - Prometheus metrics exporter (`metrics`).
#[derive(Clone, Debug, Default)]
pub struct ChainConfig {
    pub consensus: ConsensusConfig,
    pub storage: RocksDbConfig,
    pub peers: PeerConfig,
    pub miner: MinerConfig,
    pub metrics: MetricsConfig,
}

impl ChainConfig {
    /// Builds a config from defaults overridden by the environment.
    ///
    /// Recognised variables: `MINER_ADDRESS`, `MINER_NODE` (base URL
    /// without port), `MINER_PORT`, `PEER_NODES` (comma-separated base
    /// URLs), `BLOCKCHAIN_DB_URL` (RocksDB directory).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(address) = std::env::var("MINER_ADDRESS") {
            cfg.miner.address = address;
        }
        if let Ok(node) = std::env::var("MINER_NODE") {
            let port = std::env::var("MINER_PORT").unwrap_or_else(|_| "5000".to_string());
            cfg.miner.node_url = format!("{node}:{port}");
        }
        if let Ok(peers) = std::env::var("PEER_NODES") {
            cfg.peers.nodes = peers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(db_path) = std::env::var("BLOCKCHAIN_DB_URL") {
            cfg.storage.path = db_path;
        }

        cfg
    }
}
