use crate::block::Block;
use crate::coinbase::{serialize_coinbase_payload, CoinbaseData};
use crate::constants::{BLOCK_VERSION, TX_VERSION};
use crate::header::Header;
use crate::merkle::calc_hash_merkle_root;
use crate::subnets::SUBNETWORK_ID_COINBASE;
use crate::tx::Transaction;
use crate::KType;
use sedra_multiset::Multiset;
use sedra_hashes::ZERO_HASH;

/// Consensus parameters of a Sedra network.
#[derive(Clone, Debug)]
pub struct Params {
    pub ghostdag_k: KType,
    /// Maximum future drift, counted in target block times; the past median
    /// time window is derived from the same figure
    pub timestamp_deviation_tolerance: u64,
    /// Target seconds per block
    pub target_time_per_block: u64,
    pub difficulty_window_size: usize,
    pub max_block_parents: u8,
    /// Blocks per finality window
    pub finality_interval: u64,
    pub coinbase_maturity: u64,
    pub base_subsidy: u64,
    pub subsidy_reduction_interval: u64,
    pub max_coinbase_payload_len: usize,
    pub max_block_mass: u64,
    pub mass_per_tx_byte: u64,
    pub mass_per_script_pub_key_byte: u64,
    pub mass_per_sig_op: u64,
    /// Maximum serialized block size
    pub max_block_payload: u64,
    pub max_orphan_blocks: usize,
    pub skip_proof_of_work: bool,
    pub pow_limit_bits: u32,
    pub genesis_timestamp: i64,
    pub genesis_bits: u32,
    pub genesis_nonce: u64,
}

impl Params {
    pub fn max_sigops_per_block(&self) -> u64 {
        self.max_block_payload / 50
    }

    /// Seconds a block timestamp may run ahead of adjusted time
    pub fn max_allowed_time_drift(&self) -> i64 {
        (self.timestamp_deviation_tolerance * self.target_time_per_block) as i64
    }

    pub fn finality_score(&self, blue_score: u64) -> u64 {
        blue_score / self.finality_interval
    }

    /// Block subsidy at the given blue score: the base subsidy halved once
    /// per reduction interval (integer shift, never floats)
    pub fn block_subsidy(&self, blue_score: u64) -> u64 {
        let reductions = blue_score / self.subsidy_reduction_interval;
        if reductions >= 64 {
            return 0;
        }
        self.base_subsidy >> reductions
    }

    /// Builds the deterministic genesis block of this network. Its coinbase
    /// carries no outputs, so the genesis UTXO set is empty and the header
    /// commits to the empty multiset.
    pub fn genesis_block(&self) -> Block {
        let payload = serialize_coinbase_payload(
            &CoinbaseData { blue_score: 0, subsidy: 0, script_public_key: vec![], extra_data: b"sedra-genesis".to_vec() },
            self.max_coinbase_payload_len,
        )
        .expect("the genesis payload is within bounds");
        let coinbase = Transaction::new(TX_VERSION, vec![], vec![], 0, SUBNETWORK_ID_COINBASE, 0, payload);
        let hash_merkle_root = calc_hash_merkle_root(std::iter::once(&coinbase));
        let header = Header::new(
            BLOCK_VERSION,
            vec![],
            hash_merkle_root,
            ZERO_HASH,
            Multiset::new().finalize(),
            self.genesis_timestamp,
            self.genesis_bits,
            self.genesis_nonce,
        );
        Block::new(header, vec![coinbase])
    }
}

pub const MAINNET_PARAMS: Params = Params {
    ghostdag_k: 18,
    timestamp_deviation_tolerance: 132,
    target_time_per_block: 1,
    difficulty_window_size: 2640,
    max_block_parents: 10,
    finality_interval: 100,
    coinbase_maturity: 100,
    base_subsidy: 5_000_000_000,
    subsidy_reduction_interval: 210_000,
    max_coinbase_payload_len: 150,
    max_block_mass: 10_000_000,
    mass_per_tx_byte: 1,
    mass_per_script_pub_key_byte: 10,
    mass_per_sig_op: 10_000,
    max_block_payload: 1_048_576,
    max_orphan_blocks: 100,
    skip_proof_of_work: false,
    pow_limit_bits: 0x1e7fffff,
    genesis_timestamp: 1_626_000_000,
    genesis_bits: 0x1e7fffff,
    genesis_nonce: 0x2ca7,
};

/// Simulation-network parameters: tiny K, no proof-of-work, immediately
/// spendable coinbases. The configuration scenario and integration tests run
/// against.
pub const SIMNET_PARAMS: Params = Params {
    ghostdag_k: 1,
    timestamp_deviation_tolerance: 300,
    target_time_per_block: 1,
    difficulty_window_size: 8,
    max_block_parents: 10,
    finality_interval: 100,
    coinbase_maturity: 0,
    base_subsidy: 5_000_000_000,
    subsidy_reduction_interval: 210_000,
    max_coinbase_payload_len: 150,
    max_block_mass: 10_000_000,
    mass_per_tx_byte: 1,
    mass_per_script_pub_key_byte: 10,
    mass_per_sig_op: 10_000,
    max_block_payload: 1_048_576,
    max_orphan_blocks: 100,
    skip_proof_of_work: true,
    pow_limit_bits: 0x207fffff,
    genesis_timestamp: 1_626_000_000,
    genesis_bits: 0x207fffff,
    genesis_nonce: 0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_deterministic() {
        let a = SIMNET_PARAMS.genesis_block();
        let b = SIMNET_PARAMS.genesis_block();
        assert_eq!(a.hash(), b.hash());
        assert!(a.header.is_genesis());
        assert_eq!(a.transactions.len(), 1);
        assert!(a.transactions[0].is_coinbase());
        assert!(a.transactions[0].outputs.is_empty());
    }

    #[test]
    fn test_subsidy_schedule() {
        let params = &MAINNET_PARAMS;
        assert_eq!(params.block_subsidy(0), 5_000_000_000);
        assert_eq!(params.block_subsidy(params.subsidy_reduction_interval - 1), 5_000_000_000);
        assert_eq!(params.block_subsidy(params.subsidy_reduction_interval), 2_500_000_000);
        assert_eq!(params.block_subsidy(params.subsidy_reduction_interval * 64), 0);
    }
}
