use crate::table::TableIndex;
use core::fmt;
use kernel_info::memory::{PAGE_SHIFT, PGDIR_SHIFT, PMD_SHIFT, PUD_SHIFT};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// One level of the four-level translation hierarchy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Level {
    /// L0, the top-level directory (`PGD`). Entries span 512 GiB.
    Top,
    /// L1, the upper directory (`PUD`). Entries span 1 GiB.
    Upper,
    /// L2, the middle directory (`PMD`). Entries span 2 MiB.
    Mid,
    /// L3, the leaf table (`PTE`). Entries map 4 KiB.
    Leaf,
}

impl Level {
    /// Walk order, top-down.
    pub const ALL: [Self; 4] = [Self::Top, Self::Upper, Self::Mid, Self::Leaf];

    #[inline]
    #[must_use]
    pub const fn shift(self) -> u32 {
        match self {
            Self::Top => PGDIR_SHIFT,
            Self::Upper => PUD_SHIFT,
            Self::Mid => PMD_SHIFT,
            Self::Leaf => PAGE_SHIFT,
        }
    }

    /// Bytes covered by one entry at this level.
    #[inline]
    #[must_use]
    pub const fn entry_span(self) -> u64 {
        1 << self.shift()
    }

    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Top => Some(Self::Upper),
            Self::Upper => Some(Self::Mid),
            Self::Mid => Some(Self::Leaf),
            Self::Leaf => None,
        }
    }

    /// Whether a block descriptor may terminate the walk here.
    #[inline]
    #[must_use]
    pub const fn supports_blocks(self) -> bool {
        matches!(self, Self::Upper | Self::Mid)
    }

    #[inline]
    #[must_use]
    pub const fn index_of(self, va: VirtualAddress) -> TableIndex {
        TableIndex::new(va.table_index(self.shift()))
    }

    /// End of the entry containing `addr`, clamped to `end`.
    ///
    /// Both bounds are compared minus one so that an `end` of zero (the top of
    /// the address space) and an entry boundary that wraps to zero order
    /// correctly.
    #[inline]
    #[must_use]
    pub const fn span_end(self, addr: VirtualAddress, end: VirtualAddress) -> VirtualAddress {
        let span = self.entry_span();
        let boundary = addr.as_u64().wrapping_add(span) & !(span - 1);
        if boundary.wrapping_sub(1) < end.as_u64().wrapping_sub(1) {
            VirtualAddress::new(boundary)
        } else {
            end
        }
    }

    /// Whether `[addr, next)` backed by `phys` can be a single block at this level.
    #[inline]
    #[must_use]
    pub const fn is_block_aligned(
        self,
        addr: VirtualAddress,
        next: VirtualAddress,
        phys: PhysicalAddress,
    ) -> bool {
        (addr.as_u64() | next.as_u64() | phys.as_u64()) & (self.entry_span() - 1) == 0
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "PGD",
            Self::Upper => "PUD",
            Self::Mid => "PMD",
            Self::Leaf => "PTE",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
