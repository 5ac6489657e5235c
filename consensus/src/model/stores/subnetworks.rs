use sedra_consensus_core::subnets::{SubnetworkId, SUBNETWORK_ID_SIZE};
use sedra_consensus_core::tx::TransactionId;
use sedra_database::prelude::{CachedDbAccess, DatabaseStorePrefixes, DbWriter, StoreResult, DB};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The subnetwork id introduced by an accepted registry transaction is
/// derived from the registering transaction's id.
pub fn subnetwork_id_from_registry_tx_id(tx_id: TransactionId) -> SubnetworkId {
    SubnetworkId::from_slice(&tx_id.as_bytes()[..SUBNETWORK_ID_SIZE]).unwrap()
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubnetworkData {
    pub gas_limit: u64,
}

/// Registered subnetworks and their gas limits.
#[derive(Clone)]
pub struct DbSubnetworksStore {
    access: CachedDbAccess<SubnetworkId, SubnetworkData>,
}

impl DbSubnetworksStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self { access: CachedDbAccess::new(db, cache_size, vec![DatabaseStorePrefixes::Subnetworks.into()]) }
    }

    pub fn has(&self, id: SubnetworkId) -> StoreResult<bool> {
        self.access.has(id)
    }

    pub fn get(&self, id: SubnetworkId) -> StoreResult<SubnetworkData> {
        self.access.read(id)
    }

    pub fn register(&self, writer: impl DbWriter, id: SubnetworkId, data: SubnetworkData) -> StoreResult<()> {
        self.access.write(writer, id, data)
    }
}
