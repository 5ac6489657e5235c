use super::TransactionValidator;
use sedra_consensus_core::constants::MAX_SEDI;
use sedra_consensus_core::errors::tx::{TxResult, TxRuleError};
use sedra_consensus_core::serialization::wire::transaction_serialized_size;
use sedra_consensus_core::tx::Transaction;
use sedra_hashes::{Hasher, HasherBase, PayloadHash};
use std::collections::HashSet;

impl TransactionValidator {
    pub fn validate_tx_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        self.check_transaction_inputs_in_isolation(tx)?;
        self.check_transaction_outputs_in_isolation(tx)?;
        self.check_transaction_size(tx)?;
        self.check_coinbase_payload_length(tx)?;
        check_duplicate_transaction_inputs(tx)?;
        check_gas(tx)?;
        check_registry_payload(tx)?;
        check_transaction_payload(tx)
    }

    fn check_transaction_inputs_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        if !tx.is_coinbase() && tx.inputs.is_empty() {
            return Err(TxRuleError::NoTxInputs);
        }
        if !tx.is_coinbase() && tx.inputs.iter().any(|input| input.previous_outpoint.is_null()) {
            return Err(TxRuleError::PreviousOutpointIsNull);
        }
        Ok(())
    }

    fn check_transaction_outputs_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        let mut total: u64 = 0;
        for output in tx.outputs.iter() {
            if output.value > MAX_SEDI {
                return Err(TxRuleError::OutputValueTooHigh(output.value, MAX_SEDI));
            }
            total = total.checked_add(output.value).ok_or(TxRuleError::OutputsValueOverflow)?;
            if total > MAX_SEDI {
                return Err(TxRuleError::OutputValueTooHigh(total, MAX_SEDI));
            }
        }
        Ok(())
    }

    fn check_transaction_size(&self, tx: &Transaction) -> TxResult<()> {
        let size = transaction_serialized_size(tx);
        if size > self.max_block_payload {
            return Err(TxRuleError::TxTooBig(size, self.max_block_payload));
        }
        Ok(())
    }

    fn check_coinbase_payload_length(&self, tx: &Transaction) -> TxResult<()> {
        if tx.is_coinbase() && tx.payload.len() > self.max_coinbase_payload_len {
            return Err(TxRuleError::CoinbasePayloadTooLong(tx.payload.len(), self.max_coinbase_payload_len));
        }
        Ok(())
    }
}

fn check_duplicate_transaction_inputs(tx: &Transaction) -> TxResult<()> {
    let mut existing = HashSet::new();
    for input in &tx.inputs {
        if !existing.insert(input.previous_outpoint) {
            return Err(TxRuleError::DuplicateTxInputs(input.previous_outpoint));
        }
    }
    Ok(())
}

fn check_gas(tx: &Transaction) -> TxResult<()> {
    // Gas accounting applies only to application subnetworks; the gas limit
    // itself is enforced contextually against the registry
    if tx.subnetwork_id.is_builtin_or_native() && tx.gas > 0 {
        return Err(TxRuleError::TxHasGas);
    }
    Ok(())
}

fn check_registry_payload(tx: &Transaction) -> TxResult<()> {
    if tx.subnetwork_id == sedra_consensus_core::subnets::SUBNETWORK_ID_REGISTRY && tx.payload.len() != 8 {
        return Err(TxRuleError::InvalidSubnetworkRegistryPayload);
    }
    Ok(())
}

fn check_transaction_payload(tx: &Transaction) -> TxResult<()> {
    if tx.subnetwork_id.is_native() {
        if !tx.payload.is_empty() {
            return Err(TxRuleError::NativeTxHasPayload);
        }
        if tx.payload_hash.is_some() {
            return Err(TxRuleError::WrongPayloadHash(tx.payload_hash, None));
        }
        return Ok(());
    }
    let mut hasher = PayloadHash::new();
    hasher.update(&tx.payload);
    let expected = Some(hasher.finalize());
    if tx.payload_hash != expected {
        return Err(TxRuleError::WrongPayloadHash(tx.payload_hash, expected));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedra_consensus_core::subnets::{SUBNETWORK_ID_COINBASE, SUBNETWORK_ID_NATIVE};
    use sedra_consensus_core::tx::{TransactionInput, TransactionOutpoint, TransactionOutput};

    fn validator() -> TransactionValidator {
        TransactionValidator::new(1_048_576, 150, 100)
    }

    fn valid_spend() -> Transaction {
        Transaction::new(
            1,
            vec![TransactionInput::new(TransactionOutpoint::new(1.into(), 0), vec![], u64::MAX)],
            vec![TransactionOutput::new(100, vec![1])],
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    #[test]
    fn test_valid_tx_passes() {
        validator().validate_tx_in_isolation(&valid_spend()).unwrap();
    }

    #[test]
    fn test_no_inputs() {
        let mut tx = valid_spend();
        tx.inputs.clear();
        tx.finalize();
        assert!(matches!(validator().validate_tx_in_isolation(&tx), Err(TxRuleError::NoTxInputs)));
    }

    #[test]
    fn test_null_outpoint_rejected_outside_coinbase() {
        let mut tx = valid_spend();
        tx.inputs[0].previous_outpoint = TransactionOutpoint::null();
        tx.finalize();
        assert!(matches!(validator().validate_tx_in_isolation(&tx), Err(TxRuleError::PreviousOutpointIsNull)));
    }

    #[test]
    fn test_duplicate_inputs() {
        let mut tx = valid_spend();
        let duplicate = tx.inputs[0].clone();
        tx.inputs.push(duplicate);
        tx.finalize();
        assert!(matches!(validator().validate_tx_in_isolation(&tx), Err(TxRuleError::DuplicateTxInputs(_))));
    }

    #[test]
    fn test_output_value_limits() {
        let mut tx = valid_spend();
        tx.outputs[0].value = MAX_SEDI + 1;
        tx.finalize();
        assert!(matches!(validator().validate_tx_in_isolation(&tx), Err(TxRuleError::OutputValueTooHigh(_, _))));

        let mut tx = valid_spend();
        tx.outputs = vec![TransactionOutput::new(MAX_SEDI, vec![]), TransactionOutput::new(MAX_SEDI, vec![])];
        tx.finalize();
        assert!(validator().validate_tx_in_isolation(&tx).is_err());
    }

    #[test]
    fn test_payload_rules() {
        let mut tx = valid_spend();
        tx.payload = vec![1, 2, 3];
        tx.finalize();
        assert!(matches!(validator().validate_tx_in_isolation(&tx), Err(TxRuleError::NativeTxHasPayload)));

        // A coinbase with a corrupted payload hash
        let mut coinbase = Transaction::new(1, vec![], vec![], 0, SUBNETWORK_ID_COINBASE, 0, vec![0; 17]);
        coinbase.payload_hash = Some(7.into());
        assert!(matches!(validator().validate_tx_in_isolation(&coinbase), Err(TxRuleError::WrongPayloadHash(_, _))));
    }

    #[test]
    fn test_gas_forbidden_in_builtin() {
        let mut coinbase = Transaction::new(1, vec![], vec![], 0, SUBNETWORK_ID_COINBASE, 0, vec![0; 17]);
        coinbase.gas = 1;
        coinbase.finalize();
        assert!(matches!(validator().validate_tx_in_isolation(&coinbase), Err(TxRuleError::TxHasGas)));
    }
}
