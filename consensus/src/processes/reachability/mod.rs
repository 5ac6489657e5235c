pub mod interval;
pub mod inquirer;
mod reindex;
mod tree;

use sedra_database::prelude::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReachabilityError {
    #[error("data store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("interval allocation overflow")]
    DataOverflow,
}

pub type Result<T> = std::result::Result<T, ReachabilityError>;
