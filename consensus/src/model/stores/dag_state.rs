use sedra_consensus_core::subnets::SubnetworkId;
use sedra_database::prelude::{DatabaseStorePrefixes, DbKey, DbWriter, StoreError, StoreResult, DB};
use sedra_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The root state blob: the DAG tips, the last finality point and the local
/// subnetwork. Persisted as JSON under a fixed key; loaded first on startup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DagState {
    #[serde(rename = "TipHashes")]
    pub tip_hashes: Vec<Hash>,
    #[serde(rename = "LastFinalityPoint")]
    pub last_finality_point: Hash,
    #[serde(rename = "localSubnetworkID")]
    pub local_subnetwork_id: Option<SubnetworkId>,
}

#[derive(Clone)]
pub struct DbDagStateStore {
    db: Arc<DB>,
    prefix: Vec<u8>,
}

impl DbDagStateStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db, prefix: vec![DatabaseStorePrefixes::DagState.into()] }
    }

    pub fn get(&self) -> StoreResult<Option<DagState>> {
        match self.db.get_pinned(DbKey::prefix_only(&self.prefix))? {
            Some(slice) => {
                let state: DagState =
                    serde_json::from_slice(&slice).map_err(|e| StoreError::DataError(format!("malformed dag state: {e}")))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    pub fn write(&self, mut writer: impl DbWriter, state: &DagState) -> StoreResult<()> {
        let bytes = serde_json::to_vec(state).map_err(|e| StoreError::DataError(format!("dag state encoding: {e}")))?;
        writer.put(DbKey::prefix_only(&self.prefix), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedra_database::prelude::{create_temp_db, DirectDbWriter};

    #[test]
    fn test_state_roundtrip_and_shape() {
        let (_lifetime, db) = create_temp_db();
        let store = DbDagStateStore::new(db.clone());
        assert_eq!(store.get().unwrap(), None);

        let state = DagState {
            tip_hashes: vec![Hash::from_u64_word(1), Hash::from_u64_word(2)],
            last_finality_point: Hash::from_u64_word(3),
            local_subnetwork_id: None,
        };
        store.write(DirectDbWriter::new(&db), &state).unwrap();
        assert_eq!(store.get().unwrap(), Some(state.clone()));

        // The blob is JSON with the canonical field names
        let raw = db.get(DbKey::prefix_only(&[DatabaseStorePrefixes::DagState.into()])).unwrap().unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("\"TipHashes\""));
        assert!(text.contains("\"LastFinalityPoint\""));
        assert!(text.contains("\"localSubnetworkID\""));
    }
}
