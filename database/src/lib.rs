mod access;
mod cache;
mod db;
mod errors;
mod item;
mod key;
mod registry;
mod writer;

pub mod prelude {
    pub use super::access::CachedDbAccess;
    pub use super::cache::Cache;
    pub use super::db::{create_temp_db, open_db, TempDbLifetime, DB};
    pub use super::errors::{StoreError, StoreResult, StoreResultExtensions};
    pub use super::item::CachedDbItem;
    pub use super::key::DbKey;
    pub use super::registry::DatabaseStorePrefixes;
    pub use super::writer::{BatchDbWriter, DbWriter, DirectDbWriter};
}
