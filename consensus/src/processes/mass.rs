use sedra_consensus_core::serialization::wire::transaction_serialized_size;
use sedra_consensus_core::tx::{PopulatedTransaction, Transaction};
use sedra_txscript::{count_p2sh_sig_ops, count_sig_ops, is_pay_to_script_hash};

/// The weighted size metric bounding per-block resource use.
#[derive(Clone)]
pub struct MassCalculator {
    mass_per_tx_byte: u64,
    mass_per_script_pub_key_byte: u64,
    mass_per_sig_op: u64,
}

impl MassCalculator {
    pub fn new(mass_per_tx_byte: u64, mass_per_script_pub_key_byte: u64, mass_per_sig_op: u64) -> Self {
        Self { mass_per_tx_byte, mass_per_script_pub_key_byte, mass_per_sig_op }
    }

    /// Signature operations of a transaction's own scripts, countable
    /// without UTXO context. Multisig ops count at their worst case.
    pub fn standalone_sig_ops(&self, tx: &Transaction) -> u64 {
        tx.inputs.iter().map(|input| count_sig_ops(&input.signature_script, false)).sum::<u64>()
            + tx.outputs.iter().map(|output| count_sig_ops(&output.script_public_key, false)).sum::<u64>()
    }

    /// Full signature-operation count, including the precise count of the
    /// redeem script for inputs spending pay-to-script-hash outputs.
    pub fn populated_sig_ops(&self, populated: &PopulatedTransaction) -> u64 {
        self.standalone_sig_ops(populated.tx)
            + populated
                .populated_inputs()
                .filter(|(_, entry)| is_pay_to_script_hash(&entry.script_public_key))
                .map(|(input, _)| count_p2sh_sig_ops(&input.signature_script))
                .sum::<u64>()
    }

    /// mass = serialized_size·c1 + Σ output-script size·c2 + sig-ops·c3
    pub fn calc_tx_mass(&self, populated: &PopulatedTransaction) -> u64 {
        transaction_serialized_size(populated.tx) * self.mass_per_tx_byte
            + populated.tx.outputs.iter().map(|output| output.script_public_key.len() as u64).sum::<u64>()
                * self.mass_per_script_pub_key_byte
            + self.populated_sig_ops(populated) * self.mass_per_sig_op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedra_consensus_core::subnets::SUBNETWORK_ID_NATIVE;
    use sedra_consensus_core::tx::{TransactionInput, TransactionOutpoint, TransactionOutput, UtxoEntry};

    #[test]
    fn test_mass_components() {
        let calculator = MassCalculator::new(1, 10, 10_000);
        let tx = Transaction::new(
            1,
            vec![TransactionInput::new(TransactionOutpoint::new(1.into(), 0), vec![], u64::MAX)],
            vec![TransactionOutput::new(100, vec![0xac])], // a bare OP_CHECKSIG output
            0,
            SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        );
        let populated = PopulatedTransaction::new(&tx, vec![UtxoEntry::new(200, vec![], 0, false)]);
        let size = transaction_serialized_size(&tx);
        // one output script byte and one sig op
        assert_eq!(calculator.calc_tx_mass(&populated), size + 10 + 10_000);
    }
}
