use crate::errors::{coinbase::CoinbaseError, tx::TxRuleError};
use crate::subnets::SubnetworkId;
use crate::tx::TransactionId;
use crate::utxo::utxo_error::UtxoAlgebraError;
use sedra_hashes::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("block is already known")]
    DuplicateBlock,

    #[error("serialized block size of {0} exceeds the limit of {1}")]
    BlockSizeTooBig(u64, u64),

    #[error("block has no parents")]
    NoParents,

    #[error("block has too many parents: got {0} when the limit is {1}")]
    TooManyParents(usize, usize),

    #[error("block parent hashes are not sorted in ascending order")]
    WrongParentsOrder,

    #[error("block lists parent {0} more than once")]
    DuplicateParents(Hash),

    #[error("block has missing parents: {0:?}")]
    MissingParents(Vec<Hash>),

    #[error("parent {0} is an ancestor of parent {1}")]
    InvalidParentsRelation(Hash, Hash),

    #[error("parent {0} precedes the last finality point")]
    FinalizedParent(Hash),

    #[error("block difficulty bits of {0:#x} are not the expected value of {1:#x}")]
    UnexpectedDifficulty(u32, u32),

    #[error("block hash {0} is above the target implied by its difficulty bits")]
    HighHash(Hash),

    #[error("block timestamp of {0} is not after the past median time {1}")]
    TimeTooOld(i64, i64),

    #[error("checkpoint mismatch at blue score {0}: expected block {1}")]
    BadCheckpoint(u64, Hash),

    #[error("invalid merkle root: header indicates {0} but calculated value is {1}")]
    BadMerkleRoot(Hash, Hash),

    #[error("invalid accepted-id merkle root: header indicates {0} but calculated value is {1}")]
    BadAcceptedIDMerkleRoot(Hash, Hash),

    #[error("invalid utxo commitment: header indicates {0} but calculated value is {1}")]
    BadUTXOCommitment(Hash, Hash),

    #[error("block has no transactions")]
    NoTransactions,

    #[error("block first transaction is not coinbase")]
    FirstTxNotCoinbase,

    #[error("block has a second coinbase transaction at index {0}")]
    MultipleCoinbases(usize),

    #[error("block transactions are not sorted by subnetwork id")]
    TransactionsNotSorted,

    #[error("transaction {0} is found more than once in the block")]
    DuplicateTransactions(TransactionId),

    #[error("outpoint {0} is spent more than once in the same block")]
    DoubleSpendInSameBlock(crate::tx::TransactionOutpoint),

    #[error("block has {0} signature operations where the limit is {1}")]
    TooManySigOps(u64, u64),

    #[error("block mass of {0} exceeds the limit of {1}")]
    MassTooHigh(u64, u64),

    #[error("transaction in isolation validation failed for tx {0}: {1}")]
    TxInIsolationValidationFailed(TransactionId, TxRuleError),

    #[error("transaction in context validation failed for tx {0}: {1}")]
    TxInContextFailed(TransactionId, TxRuleError),

    #[error("bad coinbase payload: {0}")]
    BadCoinbasePayload(CoinbaseError),

    #[error("coinbase pays {0} where the expected payout is {1}")]
    BadCoinbasePayout(u64, u64),

    #[error("coinbase payload declares blue score {0} while the block's blue score is {1}")]
    BadCoinbaseBlueScore(u64, u64),

    #[error("transactions on subnetwork {0} declare total gas of {1} above the subnetwork limit of {2}")]
    GasLimitExceeded(SubnetworkId, u64, u64),

    #[error("block {0} is an ancestor-invalid block")]
    InvalidAncestor(Hash),

    #[error("block is known to be invalid")]
    KnownInvalid,

    #[error("block violates the finality rules")]
    ViolatingFinality,

    #[error("delayed blocks are not allowed in this context")]
    DelayedBlockNotAllowed,

    #[error("orphan blocks are not allowed in this context")]
    OrphanBlockNotAllowed,

    #[error("utxo diff algebra conflict: {0}")]
    UtxoAlgebra(#[from] UtxoAlgebraError),
}

pub type BlockProcessResult<T> = std::result::Result<T, RuleError>;
