//! The persistent virtual UTXO set: one record per unspent output in the
//! on-disk entry format, kept in lockstep with the in-memory
//! [`FullUtxoSet`] through the per-admission write batch.

use sedra_consensus_core::serialization::utxo::{
    deserialize_outpoint, deserialize_utxo_entry, serialize_outpoint, serialize_utxo_entry,
};
use sedra_consensus_core::tx::{TransactionOutpoint, UtxoEntry};
use sedra_consensus_core::utxo::utxo_diff::UtxoDiff;
use sedra_database::prelude::{DatabaseStorePrefixes, DbKey, DbWriter, StoreError, StoreResult, DB};
use std::sync::Arc;

#[derive(Clone)]
pub struct DbUtxoSetStore {
    db: Arc<DB>,
    prefix: Vec<u8>,
}

impl DbUtxoSetStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db, prefix: vec![DatabaseStorePrefixes::VirtualUtxoSet.into()] }
    }

    /// Stages a melded diff: removed outpoints are deleted, added ones are
    /// written in the on-disk entry format.
    pub fn write_diff(&self, mut writer: impl DbWriter, diff: &UtxoDiff) -> StoreResult<()> {
        for outpoint in diff.remove.keys() {
            writer.delete(DbKey::new(&self.prefix, serialize_outpoint(outpoint)))?;
        }
        for (outpoint, entry) in diff.add.iter() {
            writer.put(DbKey::new(&self.prefix, serialize_outpoint(outpoint)), serialize_utxo_entry(entry))?;
        }
        Ok(())
    }

    /// Streams every stored entry; used to rebuild the in-memory set at
    /// startup.
    pub fn iterate_all(&self) -> impl Iterator<Item = StoreResult<(TransactionOutpoint, UtxoEntry)>> + '_ {
        let prefix_key = DbKey::prefix_only(&self.prefix);
        let mut read_opts = rocksdb::ReadOptions::default();
        read_opts.set_iterate_range(rocksdb::PrefixRange(prefix_key.as_ref()));
        let prefix_len = self.prefix.len();
        self.db
            .iterator_opt(rocksdb::IteratorMode::From(prefix_key.as_ref(), rocksdb::Direction::Forward), read_opts)
            .map(move |item| match item {
                Ok((key_bytes, value_bytes)) => {
                    let (outpoint, _) = deserialize_outpoint(&key_bytes[prefix_len..])
                        .map_err(|e| StoreError::DataError(format!("malformed utxo key: {e}")))?;
                    let (entry, _) = deserialize_utxo_entry(&value_bytes)
                        .map_err(|e| StoreError::DataError(format!("malformed utxo entry: {e}")))?;
                    Ok((outpoint, entry))
                }
                Err(e) => Err(StoreError::DbError(e)),
            })
    }
}
