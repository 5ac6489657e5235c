pub mod block_processor;
pub mod delayed;
pub mod orphans;
pub mod template;
pub mod virtual_processor;

use bitflags::bitflags;

bitflags! {
    /// Modifiers of `process_block` behavior for special call sites
    /// (unorphaning, delayed reprocessing, trusted bootstrap).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct BehaviorFlags: u8 {
        /// The block was delayed and is now being reprocessed; skip the
        /// future-timestamp gate
        const AFTER_DELAY = 1;
        /// The block left the orphan pool after its parents arrived
        const WAS_UNORPHANED = 1 << 1;
        /// Refuse blocks that would be delayed
        const DISALLOW_DELAY = 1 << 2;
        /// Refuse blocks with missing parents
        const DISALLOW_ORPHANS = 1 << 3;
        /// Skip the proof-of-work check (trusted sources and tests)
        const NO_POW_CHECK = 1 << 4;
    }
}

/// The tri-state outcome of `process_block`: fully admitted, held as an
/// orphan, or queued for delayed processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub is_orphan: bool,
    pub is_delayed: bool,
}

impl ProcessOutcome {
    pub fn admitted() -> Self {
        Default::default()
    }

    pub fn orphaned() -> Self {
        Self { is_orphan: true, is_delayed: false }
    }

    pub fn delayed() -> Self {
        Self { is_orphan: false, is_delayed: true }
    }
}
