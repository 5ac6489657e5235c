use crate::cache::Cache;
use crate::db::DB;
use crate::errors::{StoreError, StoreResult};
use crate::prelude::{DbKey, DbWriter};
use rocksdb::{Direction, IteratorMode, ReadOptions};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::Arc;

/// A concurrent DB store access with typed caching.
#[derive(Clone)]
pub struct CachedDbAccess<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    db: Arc<DB>,
    cache: Cache<TKey, TData, S>,
    prefix: Vec<u8>,
}

impl<TKey, TData, S> CachedDbAccess<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
    S: BuildHasher + Default,
{
    pub fn new(db: Arc<DB>, cache_size: u64, prefix: Vec<u8>) -> Self {
        Self { db, cache: Cache::new(cache_size), prefix }
    }

    pub fn has(&self, key: TKey) -> StoreResult<bool>
    where
        TKey: AsRef<[u8]>,
    {
        Ok(self.cache.contains_key(&key) || self.db.get_pinned(DbKey::new(&self.prefix, key))?.is_some())
    }

    pub fn read(&self, key: TKey) -> StoreResult<TData>
    where
        TKey: AsRef<[u8]>,
        TData: DeserializeOwned, // `DeserializeOwned` since the slice coming from `db.get_pinned` has a short lifetime
    {
        if let Some(data) = self.cache.get(&key) {
            return Ok(data);
        }
        let db_key = DbKey::new(&self.prefix, key.clone());
        if let Some(slice) = self.db.get_pinned(&db_key)? {
            let data: TData = bincode::deserialize(&slice)?;
            self.cache.insert(key, data.clone());
            Ok(data)
        } else {
            Err(StoreError::KeyNotFound(db_key))
        }
    }

    pub fn write(&self, mut writer: impl DbWriter, key: TKey, data: TData) -> StoreResult<()>
    where
        TKey: AsRef<[u8]>,
        TData: Serialize,
    {
        let bin_data = bincode::serialize(&data)?;
        self.cache.insert(key.clone(), data);
        writer.put(DbKey::new(&self.prefix, key), bin_data)?;
        Ok(())
    }

    pub fn delete(&self, mut writer: impl DbWriter, key: TKey) -> StoreResult<()>
    where
        TKey: AsRef<[u8]>,
    {
        self.cache.remove(&key);
        writer.delete(DbKey::new(&self.prefix, key))?;
        Ok(())
    }

    /// Iterates the store's entries in ascending raw-key order.
    pub fn iterator(&self) -> impl Iterator<Item = StoreResult<(Box<[u8]>, TData)>> + '_
    where
        TData: DeserializeOwned,
    {
        self.seek_iterator(None, usize::MAX, false)
    }

    /// Iterates in ascending raw-key order, optionally seeking to a start key
    /// first. `skip_first` skips the seek key itself so it is not re-yielded.
    pub fn seek_iterator(
        &self,
        seek_from: Option<&[u8]>,
        limit: usize,
        skip_first: bool,
    ) -> impl Iterator<Item = StoreResult<(Box<[u8]>, TData)>> + '_
    where
        TData: DeserializeOwned,
    {
        let prefix_key = DbKey::prefix_only(&self.prefix);
        let mut read_opts = ReadOptions::default();
        read_opts.set_iterate_range(rocksdb::PrefixRange(prefix_key.as_ref()));

        let mut db_iterator = match seek_from {
            Some(seek_key) => {
                self.db.iterator_opt(IteratorMode::From(DbKey::new(&self.prefix, seek_key).as_ref(), Direction::Forward), read_opts)
            }
            None => self.db.iterator_opt(IteratorMode::From(prefix_key.as_ref(), Direction::Forward), read_opts),
        };
        if skip_first {
            db_iterator.next();
        }

        let prefix_len = self.prefix.len();
        db_iterator.take(limit).map(move |item| match item {
            Ok((key_bytes, data_bytes)) => match bincode::deserialize::<TData>(&data_bytes) {
                Ok(data) => Ok((key_bytes[prefix_len..].into(), data)),
                Err(e) => Err(StoreError::DeserializationError(e)),
            },
            Err(e) => Err(StoreError::DbError(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{create_temp_db, BatchDbWriter, DirectDbWriter};
    use rocksdb::WriteBatch;
    use sedra_hashes::Hash;

    #[test]
    fn test_write_read_delete() {
        let (_lifetime, db) = create_temp_db();
        let access = CachedDbAccess::<Hash, u64>::new(db.clone(), 2, vec![1]);

        access.write(DirectDbWriter::new(&db), 7.into(), 77).unwrap();
        assert!(access.has(7.into()).unwrap());
        assert_eq!(access.read(7.into()).unwrap(), 77);

        access.delete(DirectDbWriter::new(&db), 7.into()).unwrap();
        assert!(!access.has(7.into()).unwrap());
    }

    #[test]
    fn test_batched_writes_are_atomic() {
        let (_lifetime, db) = create_temp_db();
        let access = CachedDbAccess::<Hash, u64>::new(db.clone(), 0, vec![2]);

        let mut batch = WriteBatch::default();
        for i in 0..4u64 {
            access.write(BatchDbWriter::new(&mut batch), i.into(), i).unwrap();
        }
        // With a zero-sized cache nothing is visible until the batch commits
        assert!(!access.has(0.into()).unwrap());
        db.write(batch).unwrap();
        assert!(access.has(0.into()).unwrap());
        assert_eq!(access.iterator().count(), 4);
    }

    #[test]
    fn test_prefix_isolation() {
        let (_lifetime, db) = create_temp_db();
        let left = CachedDbAccess::<Hash, u64>::new(db.clone(), 0, vec![3]);
        let right = CachedDbAccess::<Hash, u64>::new(db.clone(), 0, vec![4]);

        left.write(DirectDbWriter::new(&db), 1.into(), 1).unwrap();
        right.write(DirectDbWriter::new(&db), 2.into(), 2).unwrap();
        assert_eq!(left.iterator().count(), 1);
        assert_eq!(right.iterator().count(), 1);
        assert!(!left.has(2.into()).unwrap());
    }
}
