//! The persistent block index. Keys are big-endian blue score followed by
//! the block hash, so a prefix scan yields blocks in ascending blue-score
//! order (hash-tiebroken); values are the serialized block node: header
//! bytes, one status byte, the selected-parent hash (zero for genesis), the
//! blue score, the blues and the blue-anticone sizes.

use crate::model::stores::ghostdag::{GhostdagData, HashKTypeMap};
use sedra_consensus_core::blockhash::{BlockHashExtensions, BlockHashes, NONE, ORIGIN};
use sedra_consensus_core::blockstatus::BlockStatus;
use sedra_consensus_core::header::Header;
use sedra_consensus_core::serialization::{wire, write_var_int, ByteReader, SerializationError};
use sedra_database::prelude::{DatabaseStorePrefixes, DbKey, DbWriter, StoreError, StoreResult, DB};
use sedra_hashes::{Hash, HASH_SIZE};
use std::collections::HashMap;
use std::sync::Arc;

const KEY_SIZE: usize = 8 + HASH_SIZE;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockIndexKey([u8; KEY_SIZE]);

impl BlockIndexKey {
    pub fn new(blue_score: u64, hash: Hash) -> Self {
        let mut key = [0u8; KEY_SIZE];
        key[..8].copy_from_slice(&blue_score.to_be_bytes());
        key[8..].copy_from_slice(&hash.as_bytes());
        Self(key)
    }

    pub fn block_hash(&self) -> Hash {
        Hash::from_slice(&self.0[8..]).unwrap()
    }
}

impl AsRef<[u8]> for BlockIndexKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A deserialized index entry: everything needed to rebuild the in-memory
/// node at startup.
pub struct BlockIndexEntry {
    pub header: Header,
    pub status: BlockStatus,
    pub ghostdag_data: GhostdagData,
}

pub fn serialize_block_node(header: &Header, status: BlockStatus, ghostdag_data: &GhostdagData) -> Vec<u8> {
    let mut buf = wire::serialize_header(header);
    buf.push(status.bits());
    // The origin sentinel is persisted as the zero hash
    let selected_parent = if ghostdag_data.selected_parent.is_origin() { NONE } else { ghostdag_data.selected_parent };
    buf.extend_from_slice(&selected_parent.as_bytes());
    buf.extend_from_slice(&ghostdag_data.blue_score.to_le_bytes());
    write_var_int(&mut buf, ghostdag_data.mergeset_blues.len() as u64);
    for blue in ghostdag_data.mergeset_blues.iter() {
        buf.extend_from_slice(&blue.as_bytes());
    }
    write_var_int(&mut buf, ghostdag_data.blues_anticone_sizes.len() as u64);
    let mut sizes: Vec<(&Hash, &u8)> = ghostdag_data.blues_anticone_sizes.iter().collect();
    sizes.sort_by_key(|(hash, _)| **hash);
    for (hash, size) in sizes {
        buf.extend_from_slice(&hash.as_bytes());
        buf.push(*size);
    }
    buf
}

pub fn deserialize_block_node(data: &[u8]) -> Result<BlockIndexEntry, SerializationError> {
    let mut reader = ByteReader::new(data);
    let header = wire::read_header(&mut reader)?;
    let status = BlockStatus::from_bits(reader.read_u8()?)
        .ok_or_else(|| SerializationError::Malformed("unknown status bits".into()))?;
    let stored_selected_parent = reader.read_hash()?;
    let selected_parent = if stored_selected_parent.is_none() { ORIGIN } else { stored_selected_parent };
    let blue_score = reader.read_u64()?;
    let blues_count = reader.read_var_int()?;
    let mut mergeset_blues = Vec::with_capacity(blues_count.min(1024) as usize);
    for _ in 0..blues_count {
        mergeset_blues.push(reader.read_hash()?);
    }
    let sizes_count = reader.read_var_int()?;
    let mut blues_anticone_sizes = HashMap::with_capacity(sizes_count.min(1024) as usize);
    for _ in 0..sizes_count {
        let hash = reader.read_hash()?;
        let size = reader.read_u8()?;
        blues_anticone_sizes.insert(hash, size);
    }
    if !reader.is_empty() {
        return Err(SerializationError::TrailingBytes);
    }
    Ok(BlockIndexEntry {
        header,
        status,
        ghostdag_data: GhostdagData::new(
            blue_score,
            selected_parent,
            BlockHashes::new(mergeset_blues),
            HashKTypeMap::new(blues_anticone_sizes),
        ),
    })
}

/// The rocksdb-backed index store. Uncached: entries are read only during
/// startup rebuild and ordered chain queries.
#[derive(Clone)]
pub struct DbBlockIndexStore {
    db: Arc<DB>,
    prefix: Vec<u8>,
}

impl DbBlockIndexStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db, prefix: vec![DatabaseStorePrefixes::BlockIndex.into()] }
    }

    pub fn write(&self, mut writer: impl DbWriter, key: BlockIndexKey, entry_bytes: Vec<u8>) -> StoreResult<()> {
        writer.put(DbKey::new(&self.prefix, key), entry_bytes)
    }

    /// Iterates entries in ascending (blue score, hash) order, optionally
    /// starting from a given key.
    pub fn iterator_from(
        &self,
        seek_from: Option<BlockIndexKey>,
    ) -> impl Iterator<Item = StoreResult<(BlockIndexKey, BlockIndexEntry)>> + '_ {
        let prefix_key = DbKey::prefix_only(&self.prefix);
        let mut read_opts = rocksdb::ReadOptions::default();
        read_opts.set_iterate_range(rocksdb::PrefixRange(prefix_key.as_ref()));
        let seek_key: Vec<u8> = match seek_from {
            Some(key) => DbKey::new(&self.prefix, key).as_ref().to_vec(),
            None => prefix_key.as_ref().to_vec(),
        };
        let prefix_len = self.prefix.len();
        let db_iterator = self.db.iterator_opt(rocksdb::IteratorMode::From(&seek_key, rocksdb::Direction::Forward), read_opts);
        db_iterator.map(move |item| match item {
            Ok((key_bytes, value_bytes)) => {
                let raw_key: [u8; KEY_SIZE] = key_bytes[prefix_len..]
                    .try_into()
                    .map_err(|_| StoreError::DataError(format!("malformed block index key: {key_bytes:?}")))?;
                let entry = deserialize_block_node(&value_bytes)
                    .map_err(|e| StoreError::DataError(format!("malformed block index entry: {e}")))?;
                Ok((BlockIndexKey(raw_key), entry))
            }
            Err(e) => Err(StoreError::DbError(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedra_consensus_core::header::Header;

    #[test]
    fn test_block_node_roundtrip() {
        let header = Header::new(1, vec![Hash::from_u64_word(3)], 5.into(), 6.into(), 7.into(), 1_700_000_000, 0x207fffff, 9);
        let mut sizes = HashMap::new();
        sizes.insert(Hash::from_u64_word(3), 0u8);
        sizes.insert(Hash::from_u64_word(4), 1u8);
        let data = GhostdagData::new(
            11,
            Hash::from_u64_word(3),
            BlockHashes::new(vec![Hash::from_u64_word(3), Hash::from_u64_word(4)]),
            HashKTypeMap::new(sizes),
        );
        let status = BlockStatus::DATA_STORED | BlockStatus::VALID;

        let bytes = serialize_block_node(&header, status, &data);
        let entry = deserialize_block_node(&bytes).unwrap();
        assert_eq!(entry.header, header);
        assert_eq!(entry.status, status);
        assert_eq!(entry.ghostdag_data, data);

        // Anticone sizes serialize hash-sorted, so the bytes are canonical
        assert_eq!(bytes, serialize_block_node(&header, status, &data));
    }

    #[test]
    fn test_genesis_selected_parent_sentinel() {
        let header = Header::new(1, vec![], 5.into(), 6.into(), 7.into(), 0, 0x207fffff, 0);
        let data = GhostdagData::new(0, ORIGIN, BlockHashes::new(vec![]), HashKTypeMap::new(HashMap::new()));
        let bytes = serialize_block_node(&header, BlockStatus::VALID, &data);
        // The origin marker is stored as the zero hash
        let entry = deserialize_block_node(&bytes).unwrap();
        assert_eq!(entry.ghostdag_data.selected_parent, ORIGIN);
    }

    #[test]
    fn test_index_key_orders_by_blue_score() {
        let low = BlockIndexKey::new(1, Hash::from_u64_word(u64::MAX));
        let high = BlockIndexKey::new(256, Hash::from_u64_word(0));
        // Big-endian score prefix dominates the raw byte order
        assert!(low.as_ref() < high.as_ref());
        assert_eq!(high.block_hash(), Hash::from_u64_word(0));
    }
}
