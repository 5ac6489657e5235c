use crate::header::Header;
use crate::serialization::wire;
use sedra_hashes::{BlockHash, Hash, Hasher};

/// A block hash commits to the full serialized header.
pub fn hash(header: &Header) -> Hash {
    BlockHash::hash(wire::serialize_header(header))
}
