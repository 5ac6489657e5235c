use crate::hashing;
use sedra_hashes::Hash;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Cached hash of the serialized header
    pub hash: Hash,
    pub version: i32,
    /// Direct parents, required to be in ascending hash order with no duplicates
    pub parents: Vec<Hash>,
    pub hash_merkle_root: Hash,
    pub accepted_id_merkle_root: Hash,
    pub utxo_commitment: Hash,
    /// Unix seconds
    pub timestamp: i64,
    /// Compact difficulty target
    pub bits: u32,
    pub nonce: u64,
}

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: i32,
        parents: Vec<Hash>,
        hash_merkle_root: Hash,
        accepted_id_merkle_root: Hash,
        utxo_commitment: Hash,
        timestamp: i64,
        bits: u32,
        nonce: u64,
    ) -> Self {
        let mut header = Self {
            hash: Default::default(),
            version,
            parents,
            hash_merkle_root,
            accepted_id_merkle_root,
            utxo_commitment,
            timestamp,
            bits,
            nonce,
        };
        header.finalize();
        header
    }

    /// Recompute the cached hash after field mutation (e.g. a nonce change)
    pub fn finalize(&mut self) {
        self.hash = hashing::header::hash(self);
    }

    pub fn direct_parents(&self) -> &[Hash] {
        &self.parents
    }

    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }
}
