//! Per-node UTXO diff metadata: the diff to apply on top of the diff
//! child's set (or the virtual's set when no child is present) to obtain the
//! node's own set.

use sedra_consensus_core::serialization::utxo::{deserialize_outpoint, deserialize_utxo_entry, serialize_outpoint, serialize_utxo_entry};
use sedra_consensus_core::serialization::{write_var_int, ByteReader, SerializationError};
use sedra_consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use sedra_consensus_core::utxo::utxo_collection::UtxoCollection;
use sedra_consensus_core::utxo::utxo_diff::UtxoDiff;
use sedra_database::prelude::{Cache, DatabaseStorePrefixes, DbKey, DbWriter, StoreError, StoreResult, DB};
use sedra_hashes::Hash;
use sedra_multiset::Multiset;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct BlockUtxoDiffData {
    pub diff: UtxoDiff,
    pub diff_child: Option<Hash>,
}

pub fn serialize_diff_data(data: &BlockUtxoDiffData) -> Vec<u8> {
    let mut buf = Vec::new();
    match data.diff_child {
        Some(child) => {
            buf.push(1);
            buf.extend_from_slice(&child.as_bytes());
        }
        None => buf.push(0),
    }
    serialize_collection(&mut buf, &data.diff.add);
    serialize_collection(&mut buf, &data.diff.remove);
    buf.extend_from_slice(&data.diff.multiset.serialize());
    buf
}

fn serialize_collection(buf: &mut Vec<u8>, collection: &UtxoCollection) {
    write_var_int(buf, collection.len() as u64);
    // Maps have no inherent order; sort by outpoint so bytes are canonical
    let mut entries: Vec<(&TransactionOutpoint, &UtxoEntry)> = collection.iter().collect();
    entries.sort_by_key(|(outpoint, _)| **outpoint);
    for (outpoint, entry) in entries {
        buf.extend_from_slice(&serialize_outpoint(outpoint));
        buf.extend_from_slice(&serialize_utxo_entry(entry));
    }
}

pub fn deserialize_diff_data(data: &[u8]) -> Result<BlockUtxoDiffData, SerializationError> {
    let mut reader = ByteReader::new(data);
    let diff_child = match reader.read_u8()? {
        0 => None,
        1 => Some(reader.read_hash()?),
        other => return Err(SerializationError::Malformed(format!("invalid diff-child flag {other}"))),
    };
    let add = deserialize_collection(&mut reader)?;
    let remove = deserialize_collection(&mut reader)?;
    let multiset_bytes: [u8; 64] = reader.read_bytes(64)?.try_into().unwrap();
    let multiset =
        Multiset::deserialize(multiset_bytes).map_err(|e| SerializationError::Malformed(format!("invalid multiset: {e}")))?;
    if !reader.is_empty() {
        return Err(SerializationError::TrailingBytes);
    }
    // Use the persisted sum; recomputing it costs a curve op per entry
    let diff = UtxoDiff::from_parts(add, remove, multiset);
    Ok(BlockUtxoDiffData { diff, diff_child })
}

fn deserialize_collection(reader: &mut ByteReader) -> Result<UtxoCollection, SerializationError> {
    let count = reader.read_var_int()?;
    let mut collection = UtxoCollection::with_capacity(count.min(4096) as usize);
    for _ in 0..count {
        let (outpoint, consumed) = deserialize_outpoint(reader.peek_rest())?;
        reader.advance(consumed)?;
        let (entry, consumed) = deserialize_utxo_entry(reader.peek_rest())?;
        reader.advance(consumed)?;
        collection.insert(outpoint, entry);
    }
    Ok(collection)
}

/// Rocksdb-backed diff store with a small cache; hot nodes are the tips.
#[derive(Clone)]
pub struct DbUtxoDiffsStore {
    db: Arc<DB>,
    cache: Cache<Hash, Arc<BlockUtxoDiffData>>,
    prefix: Vec<u8>,
}

impl DbUtxoDiffsStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self { db, cache: Cache::new(cache_size), prefix: vec![DatabaseStorePrefixes::UtxoDiffs.into()] }
    }

    pub fn has(&self, hash: Hash) -> StoreResult<bool> {
        Ok(self.cache.contains_key(&hash) || self.db.get_pinned(DbKey::new(&self.prefix, hash))?.is_some())
    }

    pub fn get(&self, hash: Hash) -> StoreResult<Arc<BlockUtxoDiffData>> {
        if let Some(data) = self.cache.get(&hash) {
            return Ok(data);
        }
        let db_key = DbKey::new(&self.prefix, hash);
        match self.db.get_pinned(&db_key)? {
            Some(slice) => {
                let data = Arc::new(
                    deserialize_diff_data(&slice).map_err(|e| StoreError::DataError(format!("diff data for {hash}: {e}")))?,
                );
                self.cache.insert(hash, Arc::clone(&data));
                Ok(data)
            }
            None => Err(StoreError::KeyNotFound(db_key)),
        }
    }

    pub fn write(&self, mut writer: impl DbWriter, hash: Hash, data: Arc<BlockUtxoDiffData>) -> StoreResult<()> {
        let bytes = serialize_diff_data(&data);
        self.cache.insert(hash, data);
        writer.put(DbKey::new(&self.prefix, hash), bytes)?;
        Ok(())
    }

    pub fn delete(&self, mut writer: impl DbWriter, hash: Hash) -> StoreResult<()> {
        self.cache.remove(&hash);
        writer.delete(DbKey::new(&self.prefix, hash))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_data_roundtrip() {
        let mut diff = UtxoDiff::default();
        diff.add_entry(TransactionOutpoint::new(5.into(), 1), UtxoEntry::new(700, vec![9, 9], 3, false)).unwrap();
        diff.add_entry(TransactionOutpoint::new(5.into(), 0), UtxoEntry::new(900, vec![], 3, true)).unwrap();
        diff.remove_entry(&TransactionOutpoint::new(6.into(), 0), &UtxoEntry::new(50, vec![1], 2, false)).unwrap();

        for diff_child in [None, Some(Hash::from_u64_word(77))] {
            let data = BlockUtxoDiffData { diff: diff.clone(), diff_child };
            let bytes = serialize_diff_data(&data);
            let restored = deserialize_diff_data(&bytes).unwrap();
            assert_eq!(restored.diff, data.diff);
            assert_eq!(restored.diff_child, data.diff_child);
            assert_eq!(restored.diff.multiset, data.diff.multiset);
        }
    }

    #[test]
    fn test_serialization_is_canonical() {
        // Two maps with different insertion orders serialize identically
        let op1 = TransactionOutpoint::new(1.into(), 0);
        let op2 = TransactionOutpoint::new(2.into(), 0);
        let entry = UtxoEntry::new(10, vec![], 1, false);

        let mut diff_a = UtxoDiff::default();
        diff_a.add_entry(op1, entry.clone()).unwrap();
        diff_a.add_entry(op2, entry.clone()).unwrap();
        let mut diff_b = UtxoDiff::default();
        diff_b.add_entry(op2, entry.clone()).unwrap();
        diff_b.add_entry(op1, entry).unwrap();

        let a = serialize_diff_data(&BlockUtxoDiffData { diff: diff_a, diff_child: None });
        let b = serialize_diff_data(&BlockUtxoDiffData { diff: diff_b, diff_child: None });
        assert_eq!(a, b);
    }
}
