/// Consensus configuration parameters.
///
/// This includes both protocol-level knobs (target block time, difficulty
/// term) and policy switches (mirror-solution acceptance).
#[derive(Clone, Debug)]
pub struct ConsensusConfig {
    /// Target seconds between blocks; also the mining deadline.
    pub block_time_secs: u64,
    /// Blocks between difficulty adjustments.
    pub term_blocks: u64,
    /// Bit length used until the first adjustment.
    pub initial_bit_length: u64,
    /// Difficulty floor.
    pub min_bit_length: u64,
    /// Difficulty ceiling the safe-prime search can sustain in real time.
    pub max_bit_length: u64,
    /// Coinbase amount per block.
    pub mining_reward: u64,
    /// Whether the miner loop adjusts difficulty at term boundaries.
    pub difficulty_adjustable: bool,
    /// Accept `g^x + h ≡ p` alongside `g^x ≡ h` when verifying recovered
    /// private keys. Kept switchable so the acceptance rule can be
    /// tightened once the sign-flip artifact is understood.
    pub accept_mirror_solutions: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            block_time_secs: 30,
            term_blocks: 120,
            initial_bit_length: 32,
            min_bit_length: 16,
            max_bit_length: 64,
            mining_reward: 100,
            difficulty_adjustable: false,
            accept_mirror_solutions: true,
        }
    }
}
