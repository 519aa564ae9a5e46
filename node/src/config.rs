//! Node HTTP configuration.
//!
//! Only the listen address lives here; everything chain-related comes
//! from `chain::ChainConfig::from_env()`.

use std::net::SocketAddr;

/// Configuration for the node HTTP server.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for NodeConfig {
    fn default() -> Self {
        // Safe to unwrap: fixed, valid address literal. Bind to all
        // interfaces so container port mappings reach the node.
        let addr: SocketAddr = "0.0.0.0:5000"
            .parse()
            .expect("hard-coded node listen address should parse");
        Self { listen_addr: addr }
    }
}

impl NodeConfig {
    /// Defaults overridden by `MINER_PORT`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(port) = std::env::var("MINER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                cfg.listen_addr = SocketAddr::new(cfg.listen_addr.ip(), port);
            }
        }
        cfg
    }
}
