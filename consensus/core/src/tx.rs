use crate::hashing;
use crate::subnets::{self, SubnetworkId};
use sedra_hashes::{Hash, Hasher, HasherBase, PayloadHash};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// COINBASE_TRANSACTION_INDEX is the index of the coinbase transaction in every block
pub const COINBASE_TRANSACTION_INDEX: usize = 0;

/// A transaction id: the double-SHA256 of the transaction serialized without
/// its signature scripts, so signature malleation does not change the id.
pub type TransactionId = Hash;

/// A raw output script
pub type ScriptPublicKey = Vec<u8>;

/// Holds details about an individual transaction output in a utxo set, such
/// as whether or not it was contained in a coinbase tx, the blue score of the
/// block that accepts the tx, its public key script, and how much it pays.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub amount: u64,
    pub script_public_key: ScriptPublicKey,
    pub block_blue_score: u64,
    pub is_coinbase: bool,
}

impl UtxoEntry {
    pub fn new(amount: u64, script_public_key: ScriptPublicKey, block_blue_score: u64, is_coinbase: bool) -> Self {
        Self { amount, script_public_key, block_blue_score, is_coinbase }
    }
}

pub type TransactionIndexType = u32;

/// Represents a Sedra transaction outpoint
#[derive(Eq, Default, Hash, PartialEq, Debug, Copy, Clone, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TransactionOutpoint {
    pub transaction_id: TransactionId,
    pub index: TransactionIndexType,
}

impl TransactionOutpoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self { transaction_id, index }
    }

    /// The designated outpoint of coinbase inputs; references nothing.
    pub fn null() -> Self {
        Self { transaction_id: Default::default(), index: u32::MAX }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

impl Display for TransactionOutpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.transaction_id, self.index)
    }
}

/// Represents a Sedra transaction input
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    pub previous_outpoint: TransactionOutpoint,
    pub signature_script: Vec<u8>,
    pub sequence: u64,
}

impl TransactionInput {
    pub fn new(previous_outpoint: TransactionOutpoint, signature_script: Vec<u8>, sequence: u64) -> Self {
        Self { previous_outpoint, signature_script, sequence }
    }
}

/// Represents a Sedra transaction output
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    pub value: u64,
    pub script_public_key: ScriptPublicKey,
}

impl TransactionOutput {
    pub fn new(value: u64, script_public_key: ScriptPublicKey) -> Self {
        Self { value, script_public_key }
    }
}

/// Represents a Sedra transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u64,
    pub subnetwork_id: SubnetworkId,
    pub gas: u64,
    /// Double-SHA256 of `payload`; present exactly on non-native subnetworks
    pub payload_hash: Option<Hash>,
    pub payload: Vec<u8>,

    // Cached transaction ID. Always read through `self.id()`.
    id: TransactionId,
}

impl Transaction {
    pub fn new(
        version: i32,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u64,
        subnetwork_id: SubnetworkId,
        gas: u64,
        payload: Vec<u8>,
    ) -> Self {
        let payload_hash = match subnetwork_id.is_native() {
            true => None,
            false => {
                let mut hasher = PayloadHash::new();
                hasher.update(&payload);
                Some(hasher.finalize())
            }
        };
        let mut tx =
            Self { version, inputs, outputs, lock_time, subnetwork_id, gas, payload_hash, payload, id: Default::default() };
        tx.finalize();
        tx
    }

    /// Determines whether or not a transaction is a coinbase transaction. A
    /// coinbase is a special transaction created by miners that distributes
    /// fees and block subsidy to the miners of accepted blocks.
    #[inline]
    pub fn is_coinbase(&self) -> bool {
        self.subnetwork_id == subnets::SUBNETWORK_ID_COINBASE
    }

    /// Recompute and finalize the tx id based on updated tx fields
    pub fn finalize(&mut self) {
        self.id = hashing::tx::id(self);
    }

    /// Returns the transaction ID
    #[inline]
    pub fn id(&self) -> TransactionId {
        self.id
    }
}

/// A transaction paired with the entries its inputs spend. Built during
/// input resolution, consumed by fee calculation and script verification.
pub struct PopulatedTransaction<'a> {
    pub tx: &'a Transaction,
    pub entries: Vec<UtxoEntry>,
}

impl<'a> PopulatedTransaction<'a> {
    pub fn new(tx: &'a Transaction, entries: Vec<UtxoEntry>) -> Self {
        assert_eq!(tx.inputs.len(), entries.len());
        Self { tx, entries }
    }

    pub fn populated_inputs(&self) -> impl ExactSizeIterator<Item = (&TransactionInput, &UtxoEntry)> {
        self.tx.inputs.iter().zip(self.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ignores_signature_scripts() {
        let outpoint = TransactionOutpoint::new(Hash::from_u64_word(7), 0);
        let mut tx = Transaction::new(
            1,
            vec![TransactionInput::new(outpoint, vec![1, 2, 3], 0)],
            vec![TransactionOutput::new(100, vec![4, 5])],
            0,
            subnets::SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        );
        let id = tx.id();
        tx.inputs[0].signature_script = vec![9, 9, 9, 9];
        tx.finalize();
        assert_eq!(tx.id(), id);

        tx.outputs[0].value = 101;
        tx.finalize();
        assert_ne!(tx.id(), id);
    }

    #[test]
    fn test_payload_hash_presence() {
        let native = Transaction::new(1, vec![], vec![], 0, subnets::SUBNETWORK_ID_NATIVE, 0, vec![]);
        assert_eq!(native.payload_hash, None);

        let coinbase = Transaction::new(1, vec![], vec![], 0, subnets::SUBNETWORK_ID_COINBASE, 0, vec![1, 2, 3]);
        assert!(coinbase.payload_hash.is_some());
        assert!(coinbase.is_coinbase());
    }
}
