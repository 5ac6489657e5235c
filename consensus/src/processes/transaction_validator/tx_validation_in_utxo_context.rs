use super::TransactionValidator;
use sedra_consensus_core::constants::{
    LOCK_TIME_THRESHOLD, MAX_SEDI, SEQUENCE_LOCK_TIME_DISABLED, SEQUENCE_LOCK_TIME_GRANULARITY, SEQUENCE_LOCK_TIME_IS_SECONDS,
    SEQUENCE_LOCK_TIME_MASK,
};
use sedra_consensus_core::errors::tx::{TxResult, TxRuleError};
use sedra_consensus_core::tx::PopulatedTransaction;

/// The relative timelock a transaction must wait out, as the maximum over
/// its inputs. The defaults (-1) are satisfied by every context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceLock {
    pub seconds: i64,
    pub blue_score: i64,
}

impl SequenceLock {
    pub fn unrestricted() -> Self {
        Self { seconds: -1, blue_score: -1 }
    }

    /// Spendable only when both components are strictly in the context's past.
    pub fn is_satisfied_by(&self, context_median_time: i64, context_blue_score: u64) -> bool {
        self.seconds < context_median_time && self.blue_score < context_blue_score as i64
    }
}

impl TransactionValidator {
    /// Validates a transaction whose inputs were resolved against a block's
    /// past UTXO set and returns its fee. `utxo_median_time` resolves the
    /// past median time of the chain block a given blue score falls into,
    /// which seconds-type sequence locks are anchored to.
    pub fn validate_populated_transaction(
        &self,
        populated: &PopulatedTransaction,
        context_median_time: i64,
        context_blue_score: u64,
        utxo_median_time: impl Fn(u64) -> i64,
    ) -> TxResult<u64> {
        self.check_transaction_coinbase_maturity(populated, context_blue_score)?;
        let total_in = self.check_transaction_input_amounts(populated)?;
        let total_out = populated.tx.outputs.iter().map(|output| output.value).sum::<u64>();
        if total_in < total_out {
            return Err(TxRuleError::SpendTooHigh(total_in, total_out));
        }
        check_transaction_finalized(populated, context_median_time, context_blue_score)?;
        let lock = calc_sequence_lock(populated, utxo_median_time);
        if !lock.is_satisfied_by(context_median_time, context_blue_score) {
            return Err(TxRuleError::UnmetSequenceLock);
        }
        Ok(total_in - total_out)
    }

    fn check_transaction_coinbase_maturity(&self, populated: &PopulatedTransaction, context_blue_score: u64) -> TxResult<()> {
        if let Some((input, entry)) = populated.populated_inputs().find(|(_, entry)| {
            entry.is_coinbase && entry.block_blue_score + self.coinbase_maturity > context_blue_score
        }) {
            return Err(TxRuleError::ImmatureCoinbaseSpend {
                outpoint: input.previous_outpoint,
                utxo_blue_score: entry.block_blue_score,
                spending_blue_score: context_blue_score,
                maturity: self.coinbase_maturity,
            });
        }
        Ok(())
    }

    fn check_transaction_input_amounts(&self, populated: &PopulatedTransaction) -> TxResult<u64> {
        let mut total: u64 = 0;
        for (_, entry) in populated.populated_inputs() {
            total = total.checked_add(entry.amount).ok_or(TxRuleError::InputsValueOverflow)?;
            if total > MAX_SEDI {
                return Err(TxRuleError::InputsValueOverflow);
            }
        }
        Ok(total)
    }
}

fn check_transaction_finalized(populated: &PopulatedTransaction, context_median_time: i64, context_blue_score: u64) -> TxResult<()> {
    let lock_time = populated.tx.lock_time;
    if lock_time == 0 {
        return Ok(());
    }
    // Below the threshold the lock time is a blue score, above it a timestamp
    let limit = if lock_time < LOCK_TIME_THRESHOLD { context_blue_score } else { context_median_time as u64 };
    if lock_time < limit {
        return Ok(());
    }
    // A transaction with all-final sequences is finalized regardless
    if populated.tx.inputs.iter().all(|input| input.sequence == u64::MAX) {
        return Ok(());
    }
    Err(TxRuleError::UnfinalizedTx(lock_time))
}

/// Relative timelocks over blue score and median time. Each input may
/// encode a lock, in blue-score units or in seconds anchored at the past
/// median time of its UTXO's accepting chain block; the transaction waits
/// for the maximum.
fn calc_sequence_lock(populated: &PopulatedTransaction, utxo_median_time: impl Fn(u64) -> i64) -> SequenceLock {
    let mut lock = SequenceLock::unrestricted();
    if populated.tx.is_coinbase() {
        return lock;
    }
    for (input, entry) in populated.populated_inputs() {
        if input.sequence & SEQUENCE_LOCK_TIME_DISABLED != 0 {
            continue;
        }
        let masked = input.sequence & SEQUENCE_LOCK_TIME_MASK;
        if input.sequence & SEQUENCE_LOCK_TIME_IS_SECONDS != 0 {
            let anchor = utxo_median_time(entry.block_blue_score);
            lock.seconds = lock.seconds.max(anchor + ((masked << SEQUENCE_LOCK_TIME_GRANULARITY) as i64) - 1);
        } else {
            lock.blue_score = lock.blue_score.max(entry.block_blue_score as i64 + masked as i64 - 1);
        }
    }
    lock
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedra_consensus_core::subnets::SUBNETWORK_ID_NATIVE;
    use sedra_consensus_core::tx::{Transaction, TransactionInput, TransactionOutpoint, TransactionOutput, UtxoEntry};

    fn validator_with_maturity(maturity: u64) -> TransactionValidator {
        TransactionValidator::new(1_048_576, 150, maturity)
    }

    fn spend(sequence: u64, out_value: u64) -> Transaction {
        Transaction::new(
            1,
            vec![TransactionInput::new(TransactionOutpoint::new(1.into(), 0), vec![], sequence)],
            vec![TransactionOutput::new(out_value, vec![])],
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    #[test]
    fn test_fee_calculation() {
        let tx = spend(u64::MAX, 70);
        let populated = PopulatedTransaction::new(&tx, vec![UtxoEntry::new(100, vec![], 5, false)]);
        let fee = validator_with_maturity(0).validate_populated_transaction(&populated, 1000, 10, |_| 0).unwrap();
        assert_eq!(fee, 30);
    }

    #[test]
    fn test_spend_too_high() {
        let tx = spend(u64::MAX, 170);
        let populated = PopulatedTransaction::new(&tx, vec![UtxoEntry::new(100, vec![], 5, false)]);
        assert!(matches!(
            validator_with_maturity(0).validate_populated_transaction(&populated, 1000, 10, |_| 0),
            Err(TxRuleError::SpendTooHigh(100, 170))
        ));
    }

    #[test]
    fn test_coinbase_maturity_boundary() {
        let tx = spend(u64::MAX, 70);
        let populated = PopulatedTransaction::new(&tx, vec![UtxoEntry::new(100, vec![], 5, true)]);
        let validator = validator_with_maturity(10);
        // Exactly at maturity: spender score - funder score == maturity
        assert!(validator.validate_populated_transaction(&populated, 1000, 15, |_| 0).is_ok());
        // One unit earlier fails
        assert!(matches!(
            validator.validate_populated_transaction(&populated, 1000, 14, |_| 0),
            Err(TxRuleError::ImmatureCoinbaseSpend { .. })
        ));
    }

    #[test]
    fn test_blue_score_sequence_lock() {
        // Lock of 5 blue-score units over a utxo accepted at score 10
        let tx = spend(5, 70);
        let populated = PopulatedTransaction::new(&tx, vec![UtxoEntry::new(100, vec![], 10, false)]);
        let validator = validator_with_maturity(0);
        // Spendable when the context is strictly past 10 + 5 - 1
        assert!(validator.validate_populated_transaction(&populated, 1000, 15, |_| 0).is_ok());
        assert!(matches!(
            validator.validate_populated_transaction(&populated, 1000, 14, |_| 0),
            Err(TxRuleError::UnmetSequenceLock)
        ));
    }

    #[test]
    fn test_seconds_sequence_lock() {
        let sequence = SEQUENCE_LOCK_TIME_IS_SECONDS | 2; // 2 << 9 = 1024 seconds
        let tx = spend(sequence, 70);
        let populated = PopulatedTransaction::new(&tx, vec![UtxoEntry::new(100, vec![], 10, false)]);
        let validator = validator_with_maturity(0);
        let anchor = 5_000;
        assert!(validator.validate_populated_transaction(&populated, anchor + 1024, 100, |_| anchor).is_ok());
        assert!(matches!(
            validator.validate_populated_transaction(&populated, anchor + 1023, 100, |_| anchor),
            Err(TxRuleError::UnmetSequenceLock)
        ));
    }

    #[test]
    fn test_disabled_sequence_lock() {
        let tx = spend(SEQUENCE_LOCK_TIME_DISABLED | 500, 70);
        let populated = PopulatedTransaction::new(&tx, vec![UtxoEntry::new(100, vec![], 10, false)]);
        assert!(validator_with_maturity(0).validate_populated_transaction(&populated, 0, 11, |_| 0).is_ok());
    }
}
