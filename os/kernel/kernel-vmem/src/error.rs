use crate::frame_alloc::AllocError;
use crate::level::Level;
use crate::table::TableIndex;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_registers::MaintenanceError;

/// The hierarchy can no longer be trusted; boot must halt.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FatalError {
    #[error("cannot allocate a directory table: {0}")]
    AllocatorExhausted(#[from] AllocError),
    #[error("bad {level} entry {raw:#018x} at index {index}")]
    BadEntry {
        level: Level,
        index: TableIndex,
        raw: u64,
    },
    #[error("cannot invalidate superseded translations: {0}")]
    InvalidationUnavailable(#[from] MaintenanceError),
}

/// A mapping request failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MapError {
    /// Rejected without touching the hierarchy.
    #[error("not creating mapping for {phys} at {virt} - outside kernel range")]
    OutsideKernelRange {
        phys: PhysicalAddress,
        virt: VirtualAddress,
    },
    /// Rejected without touching the hierarchy.
    #[error("not creating identity mapping for {phys} - beyond the identity directory")]
    IdentityOutOfRange { phys: PhysicalAddress },
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl MapError {
    /// Whether the error invalidates the hierarchy (as opposed to a rejected
    /// request that left it untouched).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}
