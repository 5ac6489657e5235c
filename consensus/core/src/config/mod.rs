pub mod params;

use crate::subnets::SubnetworkId;
use params::Params;
use sedra_hashes::Hash;

#[derive(Clone)]
pub struct Config {
    pub params: Params,
    /// The subnetwork this node fully validates. `None` marks a full node
    /// validating all subnetworks.
    pub local_subnetwork_id: Option<SubnetworkId>,
    /// Hard-coded (blue score, block hash) pairs the chain must match
    pub checkpoints: Vec<(u64, Hash)>,
}

impl Config {
    pub fn new(params: Params) -> Self {
        Self { params, local_subnetwork_id: None, checkpoints: Vec::new() }
    }

    pub fn with_checkpoints(mut self, checkpoints: Vec<(u64, Hash)>) -> Self {
        self.checkpoints = checkpoints;
        self
    }
}

impl AsRef<Params> for Config {
    fn as_ref(&self) -> &Params {
        &self.params
    }
}
