use crate::prelude::{DbKey, StoreError, DB};
use rocksdb::WriteBatch;

/// Abstracts an entry sink, allowing store code to be written once for both
/// direct writes and batched atomic writes.
pub trait DbWriter {
    fn put<V: AsRef<[u8]>>(&mut self, key: DbKey, value: V) -> Result<(), StoreError>;
    fn delete(&mut self, key: DbKey) -> Result<(), StoreError>;
}

pub struct DirectDbWriter<'a> {
    db: &'a DB,
}

impl<'a> DirectDbWriter<'a> {
    pub fn new(db: &'a DB) -> Self {
        Self { db }
    }
}

impl DbWriter for DirectDbWriter<'_> {
    fn put<V: AsRef<[u8]>>(&mut self, key: DbKey, value: V) -> Result<(), StoreError> {
        self.db.put(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: DbKey) -> Result<(), StoreError> {
        self.db.delete(key)?;
        Ok(())
    }
}

pub struct BatchDbWriter<'a> {
    batch: &'a mut WriteBatch,
}

impl<'a> BatchDbWriter<'a> {
    pub fn new(batch: &'a mut WriteBatch) -> Self {
        Self { batch }
    }
}

impl DbWriter for BatchDbWriter<'_> {
    fn put<V: AsRef<[u8]>>(&mut self, key: DbKey, value: V) -> Result<(), StoreError> {
        self.batch.put(key, value);
        Ok(())
    }

    fn delete(&mut self, key: DbKey) -> Result<(), StoreError> {
        self.batch.delete(key);
        Ok(())
    }
}

impl<T: DbWriter> DbWriter for &mut T {
    #[inline]
    fn put<V: AsRef<[u8]>>(&mut self, key: DbKey, value: V) -> Result<(), StoreError> {
        (*self).put(key, value)
    }

    #[inline]
    fn delete(&mut self, key: DbKey) -> Result<(), StoreError> {
        (*self).delete(key)
    }
}
