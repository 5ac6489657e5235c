use crate::tx::TransactionOutpoint;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum UtxoAlgebraError {
    #[error("outpoint {0} both in this and in other diff removes")]
    DuplicateRemovePoint(TransactionOutpoint),

    #[error("outpoint {0} both in this and in other diff adds")]
    DuplicateAddPoint(TransactionOutpoint),

    #[error("diffs are not from the same base: outpoint {0} {1}")]
    DiffIntersectionPoint(TransactionOutpoint, &'static str),

    #[error("utxo algebra error: {0}")]
    General(&'static str),
}

// Errors compare by kind and outpoint; explanatory strings are for humans
impl PartialEq for UtxoAlgebraError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DuplicateRemovePoint(a), Self::DuplicateRemovePoint(b)) => a == b,
            (Self::DuplicateAddPoint(a), Self::DuplicateAddPoint(b)) => a == b,
            (Self::DiffIntersectionPoint(a, _), Self::DiffIntersectionPoint(b, _)) => a == b,
            (Self::General(_), Self::General(_)) => true,
            _ => false,
        }
    }
}

impl Eq for UtxoAlgebraError {}

pub type UtxoResult<T> = std::result::Result<T, UtxoAlgebraError>;
