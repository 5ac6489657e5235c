/// The current block version
pub const BLOCK_VERSION: i32 = 1;

/// The current transaction version
pub const TX_VERSION: i32 = 1;

/// The number of base units in a single coin
pub const COIN: u64 = 100_000_000;

/// The largest transferable amount, in base units
pub const MAX_SEDI: u64 = 21_000_000 * COIN;

/// Marks an output that was emitted by a block but not yet accepted by any
/// block. Such entries are re-stamped with the accepting blue score once a
/// block in their future accepts them.
pub const UNACCEPTED_BLUE_SCORE: u64 = u64::MAX;

/// Lock times below this threshold are interpreted as a blue score,
/// at or above it as a Unix timestamp
pub const LOCK_TIME_THRESHOLD: u64 = 500_000_000_000;

/// Sequence-lock encoding (relative timelocks over blue score / seconds)
pub const SEQUENCE_LOCK_TIME_DISABLED: u64 = 1 << 63;
pub const SEQUENCE_LOCK_TIME_IS_SECONDS: u64 = 1 << 22;
pub const SEQUENCE_LOCK_TIME_MASK: u64 = 0x0000_ffff;
pub const SEQUENCE_LOCK_TIME_GRANULARITY: u64 = 9;
