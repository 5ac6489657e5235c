mod tx_validation_in_isolation;
mod tx_validation_in_utxo_context;

pub use tx_validation_in_utxo_context::SequenceLock;

/// Stateless per-transaction validation: the context-free checks every
/// transaction must pass, and the UTXO-context checks run once inputs are
/// resolved against a block's past set.
#[derive(Clone)]
pub struct TransactionValidator {
    pub(crate) max_block_payload: u64,
    pub(crate) max_coinbase_payload_len: usize,
    pub(crate) coinbase_maturity: u64,
}

impl TransactionValidator {
    pub fn new(max_block_payload: u64, max_coinbase_payload_len: usize, coinbase_maturity: u64) -> Self {
        Self { max_block_payload, max_coinbase_payload_len, coinbase_maturity }
    }
}
