//! # Early Boot Allocator
//!
//! Hands out physical memory for translation tables (and the few other boot
//! structures that need it) before the page allocator exists.
//!
//! Allocation is a monotonic cursor walking the RAM banks upwards:
//!
//! ```text
//!  bank 0                         bank 1
//! ┌──────────┬─────┬─────────────┐   ┌──────────────────────┐
//! │ handed   │ rsv │ free        │   │ free                 │
//! │ out      │     │             │   │                      │
//! └──────────┴─────┴─────────────┘   └──────────────────────┘
//!            ^ cursor skips reserved ranges      ▲
//!                             limit ─────────────┘
//! ```
//!
//! Nothing is ever handed out at or above the current [`AllocLimit`]. Pages
//! given back through [`FrameAlloc::free`] go to a small reclaim pool that
//! page-sized requests drain first.

use crate::region::{MemoryMap, MemoryRegion};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::PhysicalAddress;
use kernel_vmem::{AllocError, FrameAlloc};

/// Maximum number of reserved ranges (kernel image, device tree, ...).
pub const MAX_RESERVED_RANGES: usize = 16;

/// Pages the reclaim pool can hold; further frees are leaked.
pub const RECLAIM_CAPACITY: usize = 256;

/// Upper bound for allocations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AllocLimit {
    /// Allocations must end at or below the address.
    Bounded(PhysicalAddress),
    Anywhere,
}

impl AllocLimit {
    /// Whether an allocation ending (exclusively) at `end` is allowed.
    #[inline]
    #[must_use]
    pub const fn admits(self, end: u64) -> bool {
        match self {
            Self::Bounded(limit) => end <= limit.as_u64(),
            Self::Anywhere => true,
        }
    }
}

pub struct BootAllocator {
    memory: MemoryMap,
    reserved: [MemoryRegion; MAX_RESERVED_RANGES],
    reserved_len: usize,
    cursor: u64,
    limit: AllocLimit,
    reclaimed: [PhysicalAddress; RECLAIM_CAPACITY],
    reclaimed_len: usize,
    allocated: u64,
}

impl BootAllocator {
    #[must_use]
    pub fn new(memory: MemoryMap) -> Self {
        let cursor = memory.first().map_or(0, |r| r.base.as_u64());
        Self {
            memory,
            reserved: [MemoryRegion::default(); MAX_RESERVED_RANGES],
            reserved_len: 0,
            cursor,
            limit: AllocLimit::Anywhere,
            reclaimed: [PhysicalAddress::zero(); RECLAIM_CAPACITY],
            reclaimed_len: 0,
            allocated: 0,
        }
    }

    /// Excludes `region` from allocation. Returns `false` if the reserved
    /// table is full.
    pub fn reserve(&mut self, region: MemoryRegion) -> bool {
        if self.reserved_len == MAX_RESERVED_RANGES {
            log::warn!("cannot reserve {region:?}, reserved table full");
            return false;
        }
        self.reserved[self.reserved_len] = region;
        self.reserved_len += 1;
        true
    }

    pub fn set_limit(&mut self, limit: AllocLimit) {
        log::debug!("early allocation limit {:?} -> {limit:?}", self.limit);
        self.limit = limit;
    }

    #[must_use]
    pub const fn limit(&self) -> AllocLimit {
        self.limit
    }

    #[must_use]
    pub const fn memory(&self) -> &MemoryMap {
        &self.memory
    }

    /// Bytes currently handed out.
    #[must_use]
    pub const fn allocated_bytes(&self) -> u64 {
        self.allocated
    }

    /// Pages waiting in the reclaim pool.
    #[must_use]
    pub fn reclaimed(&self) -> &[PhysicalAddress] {
        &self.reclaimed[..self.reclaimed_len]
    }

    fn reserved(&self) -> &[MemoryRegion] {
        &self.reserved[..self.reserved_len]
    }

    fn take_reclaimed(&mut self) -> Option<PhysicalAddress> {
        let limit = self.limit;
        let at = self
            .reclaimed()
            .iter()
            .rposition(|p| limit.admits(p.as_u64() + PAGE_SIZE))?;
        let page = self.reclaimed[at];
        self.reclaimed_len -= 1;
        self.reclaimed[at] = self.reclaimed[self.reclaimed_len];
        Some(page)
    }

    /// Lowest base at or above the cursor that fits `size` bytes.
    fn find_fit(&self, size: u64, align: u64) -> Option<u64> {
        for bank in self.memory.regions() {
            let bank_end = bank.end().as_u64();
            let mut candidate = self.cursor.max(bank.base.as_u64());

            'bank: loop {
                candidate = candidate.checked_add(align - 1)? & !(align - 1);
                let end = candidate.checked_add(size)?;
                if end > bank_end || !self.limit.admits(end) {
                    break 'bank;
                }

                match self.reserved().iter().find(|r| r.overlaps(candidate, end)) {
                    Some(r) => candidate = r.end().as_u64(),
                    None => return Some(candidate),
                }
            }
        }
        None
    }
}

impl FrameAlloc for BootAllocator {
    fn alloc(&mut self, size: u64, align: u64) -> Result<PhysicalAddress, AllocError> {
        if !align.is_power_of_two() {
            return Err(AllocError::BadAlignment(align));
        }

        if size == PAGE_SIZE
            && align <= PAGE_SIZE
            && let Some(page) = self.take_reclaimed()
        {
            log::trace!("reusing reclaimed page {page}");
            self.allocated += PAGE_SIZE;
            return Ok(page);
        }

        let Some(base) = self.find_fit(size, align) else {
            log::error!(
                "early allocation of {size:#x} bytes (align {align:#x}) failed below {:?}",
                self.limit
            );
            return Err(AllocError::Exhausted { size, align });
        };

        self.cursor = base + size;
        self.allocated += size;
        log::trace!("early allocation {base:#x}+{size:#x}");
        Ok(PhysicalAddress::new(base))
    }

    fn free(&mut self, base: PhysicalAddress, size: u64) {
        debug_assert!(base.is_aligned_to(PAGE_SIZE));
        self.allocated = self.allocated.saturating_sub(size);

        let mut page = base;
        let end = base.wrapping_add(size);
        while page < end {
            if self.reclaimed_len == RECLAIM_CAPACITY {
                log::warn!("reclaim pool full, leaking {page}");
            } else {
                self.reclaimed[self.reclaimed_len] = page;
                self.reclaimed_len += 1;
            }
            page += PAGE_SIZE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator(banks: &[(u64, u64)]) -> BootAllocator {
        BootAllocator::new(
            banks
                .iter()
                .map(|&(base, size)| MemoryRegion::new(PhysicalAddress::new(base), size))
                .collect(),
        )
    }

    #[test]
    fn allocations_are_aligned_and_monotonic() {
        let mut alloc = allocator(&[(0x8000_0000, 0x40_0000)]);
        let a = alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        let b = alloc.alloc(0x20_0000, 0x20_0000).unwrap();
        let c = alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        assert_eq!(a.as_u64(), 0x8000_0000);
        assert_eq!(b.as_u64(), 0x8020_0000);
        assert!(c > b);
        assert_eq!(alloc.allocated_bytes(), 0x20_0000 + 2 * PAGE_SIZE);
    }

    #[test]
    fn reserved_ranges_are_skipped() {
        let mut alloc = allocator(&[(0x8000_0000, 0x10_0000)]);
        alloc.reserve(MemoryRegion::new(PhysicalAddress::new(0x8000_0000), 0x8000));
        let a = alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        assert_eq!(a.as_u64(), 0x8000_8000);
    }

    #[test]
    fn spills_into_the_next_bank() {
        let mut alloc = allocator(&[(0x8000_0000, 0x2000), (0x9000_0000, 0x10_0000)]);
        alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        assert_eq!(alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap().as_u64(), 0x9000_0000);
    }

    #[test]
    fn limit_bounds_allocations() {
        let mut alloc = allocator(&[(0x8000_0000, 0x10_0000)]);
        alloc.set_limit(AllocLimit::Bounded(PhysicalAddress::new(0x8000_1000)));
        alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        assert_eq!(
            alloc.alloc(PAGE_SIZE, PAGE_SIZE),
            Err(AllocError::Exhausted {
                size: PAGE_SIZE,
                align: PAGE_SIZE
            })
        );

        alloc.set_limit(AllocLimit::Anywhere);
        assert_eq!(alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap().as_u64(), 0x8000_1000);
    }

    #[test]
    fn freed_pages_are_reused_first() {
        let mut alloc = allocator(&[(0x8000_0000, 0x10_0000)]);
        let a = alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        let _b = alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap();
        alloc.free(a, PAGE_SIZE);
        assert_eq!(alloc.reclaimed(), &[a]);

        assert_eq!(alloc.alloc(PAGE_SIZE, PAGE_SIZE).unwrap(), a);
        assert!(alloc.reclaimed().is_empty());
        // larger requests bypass the pool
        alloc.free(a, PAGE_SIZE);
        assert_eq!(alloc.alloc(0x2000, PAGE_SIZE).unwrap().as_u64(), 0x8000_2000);
    }

    #[test]
    fn bad_alignment() {
        let mut alloc = allocator(&[(0x8000_0000, 0x10_0000)]);
        assert_eq!(alloc.alloc(PAGE_SIZE, 0x1800), Err(AllocError::BadAlignment(0x1800)));
    }

    #[test]
    fn empty_map_is_exhausted() {
        let mut alloc = allocator(&[]);
        assert!(alloc.alloc(PAGE_SIZE, PAGE_SIZE).is_err());
    }
}
