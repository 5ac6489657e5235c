use sedra_consensus_core::errors::block::RuleError;
use sedra_database::prelude::StoreError;
use sedra_hashes::Hash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsensusError {
    /// A consensus violation by the processed block; the peer-facing error
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("block {0} not found in the DAG")]
    BlockNotFound(Hash),

    #[error("no chain block has blue score {0}")]
    BlueScoreNotFound(u64),

    /// An internal invariant failure; never caused by peer input and not
    /// recoverable. The caller is expected to abort
    #[error("consensus invariant violated: {0}")]
    Assert(String),

    /// The storage layer returned malformed bytes; not recoverable
    #[error("storage corruption: {0}")]
    Corruption(String),

    /// A transient storage failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("the stored local subnetwork id {stored:?} does not match the configured one {configured:?}")]
    LocalSubnetworkMismatch { stored: Option<String>, configured: Option<String> },

    #[error("interrupt requested during initialization")]
    Cancelled,
}

pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;
