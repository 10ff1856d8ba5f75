//! # Physical Memory Map
//!
//! The RAM banks discovered at boot, kept sorted by base address in a
//! fixed-capacity table so it can be built before any heap exists.

use core::fmt;
use kernel_memory_addresses::{FrameNumber, PhysicalAddress};

/// Maximum number of RAM banks tracked.
pub const MAX_MEMORY_REGIONS: usize = 32;

/// A contiguous range `[base, base + size)` of physical memory.
#[derive(Copy, Clone, Default, Eq, PartialEq)]
pub struct MemoryRegion {
    pub base: PhysicalAddress,
    pub size: u64,
}

impl MemoryRegion {
    #[inline]
    #[must_use]
    pub const fn new(base: PhysicalAddress, size: u64) -> Self {
        Self { base, size }
    }

    /// Exclusive end of the region.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        self.base.wrapping_add(self.size)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, pa: PhysicalAddress) -> bool {
        pa.as_u64() >= self.base.as_u64() && pa.wrapping_distance(self.base) < self.size
    }

    /// Whether `[start, end)` shares at least one byte with this region.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, start: u64, end: u64) -> bool {
        start < self.end().as_u64() && self.base.as_u64() < end
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.base, self.end())
    }
}

/// Sorted, fixed-capacity set of RAM banks.
#[derive(Clone, Debug)]
pub struct MemoryMap {
    regions: [MemoryRegion; MAX_MEMORY_REGIONS],
    len: usize,
}

impl MemoryMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: [MemoryRegion::new(PhysicalAddress::zero(), 0); MAX_MEMORY_REGIONS],
            len: 0,
        }
    }

    /// Inserts `region` in base-address order.
    ///
    /// Empty regions and regions wrapping past the top of the physical
    /// address space are ignored. Returns `false` if the map is full.
    pub fn add(&mut self, region: MemoryRegion) -> bool {
        if region.is_empty() || region.base.checked_add(region.size).is_none() {
            log::debug!("ignoring memory region {region:?}");
            return true;
        }

        if self.len == MAX_MEMORY_REGIONS {
            log::warn!("memory map full, dropping {region:?}");
            return false;
        }

        let at = self
            .regions()
            .iter()
            .position(|r| r.base > region.base)
            .unwrap_or(self.len);
        self.regions.copy_within(at..self.len, at + 1);
        self.regions[at] = region;
        self.len += 1;
        true
    }

    #[must_use]
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions[..self.len]
    }

    #[must_use]
    pub fn first(&self) -> Option<&MemoryRegion> {
        self.regions().first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `pa` is RAM.
    #[must_use]
    pub fn contains(&self, pa: PhysicalAddress) -> bool {
        self.regions().iter().any(|r| r.contains(pa))
    }

    /// Whether the frame `pfn` is RAM.
    #[must_use]
    pub fn contains_frame(&self, pfn: FrameNumber) -> bool {
        self.contains(pfn.address())
    }

    /// Bytes of RAM across all banks.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.regions().iter().map(|r| r.size).sum()
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<MemoryRegion> for MemoryMap {
    fn from_iter<I: IntoIterator<Item = MemoryRegion>>(iter: I) -> Self {
        let mut map = Self::new();
        for region in iter {
            map.add(region);
        }
        map
    }
}
