use crate::serialization::wire;
use crate::tx::Transaction;
use sedra_hashes::{Hash, Hasher, TransactionHash, TransactionIdHash};

/// The transaction id commits to the serialization with signature scripts
/// blanked, so signing (or malleating a signature) never changes the id.
pub fn id(tx: &Transaction) -> Hash {
    TransactionIdHash::hash(wire::serialize_transaction(tx, false))
}

/// The transaction hash commits to the full serialization.
pub fn hash(tx: &Transaction) -> Hash {
    TransactionHash::hash(wire::serialize_transaction(tx, true))
}
