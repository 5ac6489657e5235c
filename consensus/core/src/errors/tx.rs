use crate::tx::TransactionOutpoint;
use sedra_hashes::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxRuleError {
    #[error("transaction has no inputs")]
    NoTxInputs,

    #[error("transaction size of {0} is larger than max allowed size of {1}")]
    TxTooBig(u64, u64),

    #[error("transaction output value of {0} is higher than max allowed value of {1}")]
    OutputValueTooHigh(u64, u64),

    #[error("the sum of transaction outputs overflows")]
    OutputsValueOverflow,

    #[error("transaction contains a duplicate input for outpoint {0}")]
    DuplicateTxInputs(TransactionOutpoint),

    #[error("a non-coinbase input references the null previous outpoint")]
    PreviousOutpointIsNull,

    #[error("coinbase payload length of {0} exceeds the maximum of {1}")]
    CoinbasePayloadTooLong(usize, usize),

    #[error("transaction payload hash is {0:?} while the payload hashes to {1:?}")]
    WrongPayloadHash(Option<Hash>, Option<Hash>),

    #[error("a native-subnetwork transaction carries a payload")]
    NativeTxHasPayload,

    #[error("a transaction in a built-in or native subnetwork declares gas")]
    TxHasGas,

    #[error("subnetwork {0} not found")]
    SubnetworkNotFound(crate::subnets::SubnetworkId),

    #[error("a subnetwork registry transaction must carry an 8-byte gas limit payload")]
    InvalidSubnetworkRegistryPayload,

    #[error("transaction input refers to a missing or already-spent output {0}")]
    MissingTxOut(TransactionOutpoint),

    #[error(
        "tried to spend coinbase output {outpoint} created at blue score {utxo_blue_score} at spending blue score {spending_blue_score} while coinbase maturity is {maturity}"
    )]
    ImmatureCoinbaseSpend { outpoint: TransactionOutpoint, utxo_blue_score: u64, spending_blue_score: u64, maturity: u64 },

    #[error("the sum of transaction inputs overflows")]
    InputsValueOverflow,

    #[error("total inputs of {0} are less than total outputs of {1}")]
    SpendTooHigh(u64, u64),

    #[error("transaction sequence locks are not yet satisfied")]
    UnmetSequenceLock,

    #[error("transaction is not finalized at lock time {0}")]
    UnfinalizedTx(u64),

    #[error("script validation failed for input {0}: {1}")]
    ScriptCheckFailed(usize, String),
}

pub type TxResult<T> = std::result::Result<T, TxRuleError>;
