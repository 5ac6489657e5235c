use sedra_consensus_core::coinbase::{deserialize_coinbase_payload, serialize_coinbase_payload, CoinbaseData};
use sedra_consensus_core::constants::TX_VERSION;
use sedra_consensus_core::errors::block::{BlockProcessResult, RuleError};
use sedra_consensus_core::subnets::SUBNETWORK_ID_COINBASE;
use sedra_consensus_core::tx::{ScriptPublicKey, Transaction, TransactionOutput};

#[derive(Clone)]
pub struct CoinbaseManager {
    max_coinbase_payload_len: usize,
    base_subsidy: u64,
    subsidy_reduction_interval: u64,
}

impl CoinbaseManager {
    pub fn new(max_coinbase_payload_len: usize, base_subsidy: u64, subsidy_reduction_interval: u64) -> Self {
        Self { max_coinbase_payload_len, base_subsidy, subsidy_reduction_interval }
    }

    pub fn calc_block_subsidy(&self, blue_score: u64) -> u64 {
        let reductions = blue_score / self.subsidy_reduction_interval;
        if reductions >= 64 {
            return 0;
        }
        self.base_subsidy >> reductions
    }

    /// Builds the coinbase a block at `blue_score` collecting `total_fees`
    /// must carry, paying subsidy plus fees to the miner script.
    pub fn expected_coinbase_transaction(
        &self,
        blue_score: u64,
        script_public_key: ScriptPublicKey,
        extra_data: &[u8],
        total_fees: u64,
    ) -> BlockProcessResult<Transaction> {
        let subsidy = self.calc_block_subsidy(blue_score);
        let payload = serialize_coinbase_payload(
            &CoinbaseData { blue_score, subsidy, script_public_key: script_public_key.clone(), extra_data: extra_data.to_vec() },
            self.max_coinbase_payload_len,
        )
        .map_err(RuleError::BadCoinbasePayload)?;

        let payout = subsidy + total_fees;
        let outputs = if payout > 0 { vec![TransactionOutput::new(payout, script_public_key)] } else { vec![] };
        Ok(Transaction::new(TX_VERSION, vec![], outputs, 0, SUBNETWORK_ID_COINBASE, 0, payload))
    }

    /// Validates a block's coinbase against its blue score and the fees its
    /// transactions collected: structured payload, matching subsidy, exact
    /// payout.
    pub fn validate_coinbase_transaction(&self, coinbase: &Transaction, blue_score: u64, total_fees: u64) -> BlockProcessResult<()> {
        let data = deserialize_coinbase_payload(&coinbase.payload, self.max_coinbase_payload_len).map_err(RuleError::BadCoinbasePayload)?;
        if data.blue_score != blue_score {
            return Err(RuleError::BadCoinbaseBlueScore(data.blue_score, blue_score));
        }
        let subsidy = self.calc_block_subsidy(blue_score);
        if data.subsidy != subsidy {
            return Err(RuleError::BadCoinbasePayout(data.subsidy, subsidy));
        }
        let paid: u64 = coinbase.outputs.iter().map(|output| output.value).sum();
        let expected = subsidy + total_fees;
        if paid != expected {
            return Err(RuleError::BadCoinbasePayout(paid, expected));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_coinbase_validates() {
        let manager = CoinbaseManager::new(150, 5_000_000_000, 210_000);
        let coinbase = manager.expected_coinbase_transaction(7, vec![0xac; 25], b"miner", 123).unwrap();
        assert!(coinbase.is_coinbase());
        manager.validate_coinbase_transaction(&coinbase, 7, 123).unwrap();

        // Wrong fee total is rejected
        assert!(matches!(
            manager.validate_coinbase_transaction(&coinbase, 7, 124),
            Err(RuleError::BadCoinbasePayout(_, _))
        ));
        // Wrong blue score is rejected
        assert!(matches!(
            manager.validate_coinbase_transaction(&coinbase, 8, 123),
            Err(RuleError::BadCoinbaseBlueScore(7, 8))
        ));
    }

    #[test]
    fn test_subsidy_halving() {
        let manager = CoinbaseManager::new(150, 5_000_000_000, 100);
        assert_eq!(manager.calc_block_subsidy(99), 5_000_000_000);
        assert_eq!(manager.calc_block_subsidy(100), 2_500_000_000);
        assert_eq!(manager.calc_block_subsidy(200), 1_250_000_000);
        assert_eq!(manager.calc_block_subsidy(100 * 64), 0);
    }
}
