use crate::{header::Header, tx::Transaction};
use sedra_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Arc<Vec<Transaction>>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions: Arc::new(transactions) }
    }

    pub fn from_header(header: Header) -> Self {
        Self { header, transactions: Arc::new(Vec::new()) }
    }

    #[inline]
    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn is_header_only(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The coinbase is always the first block transaction
    pub fn coinbase_transaction(&self) -> Option<&Transaction> {
        self.transactions.first()
    }
}
