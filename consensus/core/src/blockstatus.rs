use bitflags::bitflags;

bitflags! {
    /// The validation state of a block node. Flags accumulate; they are
    /// never cleared once set.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct BlockStatus: u8 {
        /// The block's data was stored, though it may not have been fully validated yet
        const DATA_STORED = 1;
        /// The block was fully validated and connected to the DAG
        const VALID = 1 << 1;
        /// The block failed validation
        const VALIDATE_FAILED = 1 << 2;
        /// One of the block's ancestors failed validation
        const INVALID_ANCESTOR = 1 << 3;
    }
}

impl BlockStatus {
    pub const KNOWN_INVALID: BlockStatus = BlockStatus::VALIDATE_FAILED.union(BlockStatus::INVALID_ANCESTOR);

    #[inline]
    pub fn is_known_invalid(self) -> bool {
        self.intersects(Self::KNOWN_INVALID)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.contains(Self::VALID)
    }

    #[inline]
    pub fn has_data(self) -> bool {
        self.contains(Self::DATA_STORED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_algebra() {
        let mut status = BlockStatus::DATA_STORED;
        assert!(status.has_data());
        assert!(!status.is_known_invalid());

        status |= BlockStatus::INVALID_ANCESTOR;
        assert!(status.is_known_invalid());
        assert!(!status.is_valid());

        assert!((BlockStatus::DATA_STORED | BlockStatus::VALIDATE_FAILED).is_known_invalid());
        assert!((BlockStatus::DATA_STORED | BlockStatus::VALID).is_valid());
    }
}
