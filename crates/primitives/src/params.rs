use alloy_genesis::GenesisAccount;
use alloy_primitives::Address;
use std::collections::BTreeMap;

/// The parameters of a sequencer devnet deployment.
///
/// These directly shape how a verifier behaves when the sequencer goes away: a short sequencing
/// window forces verifiers onto L1-derived blocks quickly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerDevnetParams {
    /// Maximum allowed drift between the L2 timestamp and its L1 origin timestamp, in seconds.
    pub max_seq_drift: u64,
    /// Length of the sequencing window, in L1 blocks.
    pub seq_window_size: u64,
    /// Number of L1 blocks a channel may stay open for.
    pub chan_timeout: u64,
    /// Extra accounts to pre-fund in the L2 genesis.
    pub additional_genesis_allocs: BTreeMap<Address, GenesisAccount>,
}

impl SequencerDevnetParams {
    /// Returns new [`SequencerDevnetParams`] without any additional allocations.
    pub const fn new(max_seq_drift: u64, seq_window_size: u64, chan_timeout: u64) -> Self {
        Self { max_seq_drift, seq_window_size, chan_timeout, additional_genesis_allocs: BTreeMap::new() }
    }

    /// Adds an L2 genesis allocation.
    pub fn with_alloc(mut self, address: Address, account: GenesisAccount) -> Self {
        self.additional_genesis_allocs.insert(address, account);
        self
    }
}

impl Default for SequencerDevnetParams {
    fn default() -> Self {
        Self::new(10, 4, 40)
    }
}
