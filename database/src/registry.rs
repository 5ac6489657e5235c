/// Fixed prefixes bucketing the database by store. Values are persisted and
/// must never be reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DatabaseStorePrefixes {
    Headers = 1,
    RelationsParents = 2,
    RelationsChildren = 3,
    Statuses = 4,
    Ghostdag = 5,
    Reachability = 6,
    ReachabilityReindexRoot = 7,
    UtxoDiffs = 8,
    VirtualUtxoSet = 9,
    BlockTransactions = 10,
    BlockIndex = 11,
    DagState = 12,
    Subnetworks = 13,
}

impl From<DatabaseStorePrefixes> for u8 {
    fn from(value: DatabaseStorePrefixes) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for DatabaseStorePrefixes {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Headers),
            2 => Ok(Self::RelationsParents),
            3 => Ok(Self::RelationsChildren),
            4 => Ok(Self::Statuses),
            5 => Ok(Self::Ghostdag),
            6 => Ok(Self::Reachability),
            7 => Ok(Self::ReachabilityReindexRoot),
            8 => Ok(Self::UtxoDiffs),
            9 => Ok(Self::VirtualUtxoSet),
            10 => Ok(Self::BlockTransactions),
            11 => Ok(Self::BlockIndex),
            12 => Ok(Self::DagState),
            13 => Ok(Self::Subnetworks),
            other => Err(other),
        }
    }
}

impl AsRef<[u8]> for DatabaseStorePrefixes {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: repr(u8) with a stable discriminant layout
        std::slice::from_ref(unsafe { &*(self as *const Self as *const u8) })
    }
}
