//! # Memory Layout
//!
//! AArch64, 4 KiB translation granule, 48-bit virtual addresses, four levels
//! of translation.
//!
//! ```text
//! 0x0000_0000_0000_0000 ┌──────────────────────────────┐
//!                       │ TTBR0 range (identity map)   │
//! 0x0000_FFFF_FFFF_FFFF ├──────────────────────────────┤
//!                       │ non-canonical hole           │
//! VMALLOC_START         ├──────────────────────────────┤ 0xFFFF_0000_0000_0000
//!                       │ vmalloc / static I/O / vmemmap│
//! PAGE_OFFSET           ├──────────────────────────────┤ 0xFFFF_8000_0000_0000
//!                       │ linear map of RAM            │
//! 0xFFFF_FFFF_FFFF_FFFF └──────────────────────────────┘
//! ```

use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Width of a virtual address.
pub const VA_BITS: u32 = 48;

pub const PAGE_SHIFT: u32 = 12;
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;
pub const PAGE_MASK: u64 = !(PAGE_SIZE - 1);

/// Span of one mid-level (L2) entry: a 2 MiB section.
pub const PMD_SHIFT: u32 = 21;
pub const PMD_SIZE: u64 = 1 << PMD_SHIFT;
pub const PMD_MASK: u64 = !(PMD_SIZE - 1);

/// Span of one upper-level (L1) entry: a 1 GiB block.
pub const PUD_SHIFT: u32 = 30;
pub const PUD_SIZE: u64 = 1 << PUD_SHIFT;
pub const PUD_MASK: u64 = !(PUD_SIZE - 1);

/// Span of one top-level (L0) entry: 512 GiB.
pub const PGDIR_SHIFT: u32 = 39;
pub const PGDIR_SIZE: u64 = 1 << PGDIR_SHIFT;
pub const PGDIR_MASK: u64 = !(PGDIR_SIZE - 1);

/// Entries per directory table at every level.
pub const PTRS_PER_TABLE: usize = 512;

/// Lowest kernel virtual address a mapping may be created at.
pub const VMALLOC_START: u64 = u64::MAX << VA_BITS;

/// Base of the linear map of physical memory.
pub const PAGE_OFFSET: u64 = u64::MAX << (VA_BITS - 1);

/// Physical address of the start of RAM on the reference board.
pub const PHYS_OFFSET: u64 = 0x8000_0000;

/// Number of top-level entries available to the identity map.
pub const IDMAP_PGD_ENTRIES: usize = 1 << (VA_BITS - PGDIR_SHIFT);

const _: () = {
    assert!(VMALLOC_START == 0xFFFF_0000_0000_0000);
    assert!(PAGE_OFFSET == 0xFFFF_8000_0000_0000);
    assert!(PAGE_OFFSET > VMALLOC_START);
    assert!(PHYS_OFFSET.is_multiple_of(PUD_SIZE));
    assert!(IDMAP_PGD_ENTRIES == PTRS_PER_TABLE);
    assert!(
        PGDIR_SHIFT == PUD_SHIFT + 9 && PUD_SHIFT == PMD_SHIFT + 9 && PMD_SHIFT == PAGE_SHIFT + 9
    );
};

/// The runtime view of the memory layout.
///
/// Defaults to the compile-time constants above; boards (and tests) that
/// place RAM elsewhere override [`MemoryLayout::phys_offset`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryLayout {
    pub va_bits: u32,
    /// Base of the linear map.
    pub page_offset: VirtualAddress,
    /// Physical address that [`MemoryLayout::page_offset`] maps to.
    pub phys_offset: PhysicalAddress,
    /// Kernel mappings below this address are rejected.
    pub kernel_floor: VirtualAddress,
    pub idmap_entries: usize,
}

impl MemoryLayout {
    pub const DEFAULT: Self = Self {
        va_bits: VA_BITS,
        page_offset: VirtualAddress::new(PAGE_OFFSET),
        phys_offset: PhysicalAddress::new(PHYS_OFFSET),
        kernel_floor: VirtualAddress::new(VMALLOC_START),
        idmap_entries: IDMAP_PGD_ENTRIES,
    };

    #[must_use]
    pub const fn with_phys_offset(mut self, phys_offset: PhysicalAddress) -> Self {
        self.phys_offset = phys_offset;
        self
    }

    /// Linear-map address of a physical address.
    #[inline]
    #[must_use]
    pub const fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        self.page_offset
            .wrapping_add(pa.wrapping_distance(self.phys_offset))
    }

    /// Physical address behind a linear-map address.
    #[inline]
    #[must_use]
    pub const fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress {
        self.phys_offset
            .wrapping_add(va.wrapping_distance(self.page_offset))
    }

    /// Whether `va` may host a kernel mapping.
    #[inline]
    #[must_use]
    pub const fn accepts_kernel_mapping(&self, va: VirtualAddress) -> bool {
        va.as_u64() >= self.kernel_floor.as_u64()
    }

    /// Whether the page-aligned range `[start, start + length)` may host a
    /// kernel mapping: it starts at or above the floor and does not run past
    /// the top of the address space. Ending exactly at the top is fine.
    #[inline]
    #[must_use]
    pub const fn accepts_kernel_range(&self, start: VirtualAddress, length: u64) -> bool {
        let room = 0u64.wrapping_sub(start.as_u64());
        self.accepts_kernel_mapping(start) && (room == 0 || length <= room)
    }

    /// Whether the identity map can cover `pa` at the top level.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn identity_covers(&self, pa: PhysicalAddress) -> bool {
        ((pa.as_u64() >> PGDIR_SHIFT) as usize) < self.idmap_entries
    }

    /// Whether every byte of `[start, start + length)` lies below the last
    /// top-level entry of the identity directory.
    #[inline]
    #[must_use]
    pub const fn identity_covers_range(&self, start: PhysicalAddress, length: u64) -> bool {
        if length == 0 {
            return self.identity_covers(start);
        }
        match start.as_u64().checked_add(length - 1) {
            Some(last) => {
                self.identity_covers(start) && self.identity_covers(PhysicalAddress::new(last))
            }
            None => false,
        }
    }

    /// Ceiling for early table allocations while the linear map is built:
    /// the first gigabyte of RAM, which the boot page tables already cover.
    #[inline]
    #[must_use]
    pub const fn early_alloc_limit(&self) -> PhysicalAddress {
        self.phys_offset.wrapping_add(PUD_SIZE)
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}
