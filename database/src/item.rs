use crate::prelude::{DbKey, DbWriter, StoreError, StoreResult, DB};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// A cached DB item, where the item is a single value under a fixed key.
#[derive(Clone)]
pub struct CachedDbItem<T> {
    db: Arc<DB>,
    key: &'static [u8],
    cached_item: Arc<RwLock<Option<T>>>,
}

impl<T> CachedDbItem<T> {
    pub fn new(db: Arc<DB>, key: &'static [u8]) -> Self {
        Self { db, key, cached_item: Arc::new(RwLock::new(None)) }
    }

    pub fn read(&self) -> StoreResult<T>
    where
        T: Clone + DeserializeOwned,
    {
        if let Some(item) = self.cached_item.read().clone() {
            return Ok(item);
        }
        if let Some(slice) = self.db.get_pinned(self.key)? {
            let item: T = bincode::deserialize(&slice)?;
            *self.cached_item.write() = Some(item.clone());
            Ok(item)
        } else {
            Err(StoreError::KeyNotFound(DbKey::prefix_only(self.key)))
        }
    }

    pub fn write(&self, mut writer: impl DbWriter, item: &T) -> StoreResult<()>
    where
        T: Clone + Serialize,
    {
        *self.cached_item.write() = Some(item.clone());
        let bin_data = bincode::serialize(item)?;
        writer.put(DbKey::prefix_only(self.key), bin_data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{create_temp_db, DirectDbWriter, StoreResultExtensions};

    #[test]
    fn test_item_roundtrip() {
        let (_lifetime, db) = create_temp_db();
        let item = CachedDbItem::<u64>::new(db.clone(), b"the-answer");
        assert!(item.read().unwrap_option().is_none());
        item.write(DirectDbWriter::new(&db), &42).unwrap();
        assert_eq!(item.read().unwrap(), 42);

        // A fresh accessor reads through to disk
        let fresh = CachedDbItem::<u64>::new(db, b"the-answer");
        assert_eq!(fresh.read().unwrap(), 42);
    }
}
