//! # Static I/O Regions
//!
//! Board code describes fixed device windows with [`MapDesc`]; each one is
//! mapped once at boot and recorded as a [`StaticRegion`] in a registry kept
//! in ascending virtual-address order. Records are never removed.

use alloc::vec::Vec;
use bitflags::bitflags;
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{FrameNumber, PhysicalAddress, Size4K, VirtualAddress};
use kernel_registers::MemoryType;

/// A statically mapped region as described by board code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MapDesc {
    pub virt: VirtualAddress,
    pub pfn: FrameNumber,
    pub length: u64,
    pub mem_type: MemoryType,
}

impl MapDesc {
    #[must_use]
    pub const fn new(
        virt: VirtualAddress,
        pfn: FrameNumber,
        length: u64,
        mem_type: MemoryType,
    ) -> Self {
        Self {
            virt,
            pfn,
            length,
            mem_type,
        }
    }
}

bitflags! {
    /// Flags of a [`StaticRegion`].
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct RegionFlags: u32 {
        /// Device memory window.
        const IOREMAP = 0x0000_0001;
        /// Created at boot, never unmapped.
        const STATIC_MAPPING = 0x4000_0000;
        /// Memory type of the window, see [`RegionFlags::with_mtype`].
        const MTYPE = 0x1F << 20;
    }
}

impl RegionFlags {
    pub const MTYPE_SHIFT: u32 = 20;

    /// `self` with the memory type field set to `mem_type`.
    #[must_use]
    pub const fn with_mtype(self, mem_type: MemoryType) -> Self {
        let bits = self.bits() & !Self::MTYPE.bits();
        Self::from_bits_retain(bits | ((mem_type.into_bits() as u32) << Self::MTYPE_SHIFT))
    }

    #[must_use]
    pub const fn mtype(self) -> u8 {
        #[allow(clippy::cast_possible_truncation)]
        let raw = ((self.bits() & Self::MTYPE.bits()) >> Self::MTYPE_SHIFT) as u8;
        raw
    }
}

/// Which registration path produced a region.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegionCaller {
    IoTable,
    IoTableExec,
}

impl RegionCaller {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IoTable => "iotable_init",
            Self::IoTableExec => "iotable_init_exec",
        }
    }
}

/// A registered static mapping.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StaticRegion {
    /// Page-aligned start.
    pub virt: VirtualAddress,
    /// Page-aligned size, including the in-page offset of the descriptor.
    pub size: u64,
    pub phys: PhysicalAddress,
    pub flags: RegionFlags,
    pub mem_type: MemoryType,
    pub caller: RegionCaller,
    /// `false` if the mapping request was rejected; the range stays
    /// reserved regardless.
    pub mapped: bool,
}

impl StaticRegion {
    #[must_use]
    pub const fn new(desc: &MapDesc, caller: RegionCaller, mapped: bool) -> Self {
        let offset = desc.virt.offset_in::<Size4K>();
        let size = VirtualAddress::new(desc.length.wrapping_add(offset))
            .align_up_to(PAGE_SIZE)
            .as_u64();
        Self {
            virt: desc.virt.align_down::<Size4K>(),
            size,
            phys: desc.pfn.address(),
            flags: RegionFlags::IOREMAP
                .union(RegionFlags::STATIC_MAPPING)
                .with_mtype(desc.mem_type),
            mem_type: desc.mem_type,
            caller,
            mapped,
        }
    }

    /// Exclusive end.
    #[must_use]
    pub const fn end(&self) -> VirtualAddress {
        self.virt.wrapping_add(self.size)
    }

    #[must_use]
    pub const fn contains(&self, va: VirtualAddress) -> bool {
        va.as_u64() >= self.virt.as_u64() && va.wrapping_distance(self.virt) < self.size
    }
}

/// Static regions in ascending virtual-address order.
#[derive(Clone, Debug, Default)]
pub struct StaticRegionRegistry {
    regions: Vec<StaticRegion>,
}

impl StaticRegionRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self { regions: Vec::new() }
    }

    /// Inserts `region` before the first region starting above it, so
    /// regions with equal start addresses keep their insertion order.
    pub fn insert(&mut self, region: StaticRegion) {
        let at = self
            .regions
            .iter()
            .position(|r| r.virt > region.virt)
            .unwrap_or(self.regions.len());
        self.regions.insert(at, region);
    }

    #[must_use]
    pub fn regions(&self) -> &[StaticRegion] {
        &self.regions
    }

    /// The region containing `va`.
    #[must_use]
    pub fn find(&self, va: VirtualAddress) -> Option<&StaticRegion> {
        self.regions
            .iter()
            .take_while(|r| r.virt <= va)
            .filter(|r| r.contains(va))
            .last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(virt: u64, pfn: u64, length: u64) -> MapDesc {
        MapDesc::new(
            VirtualAddress::new(virt),
            FrameNumber::new(pfn),
            length,
            MemoryType::DeviceNGnRE,
        )
    }

    fn region(virt: u64, pfn: u64, length: u64, caller: RegionCaller) -> StaticRegion {
        StaticRegion::new(&desc(virt, pfn, length), caller, true)
    }

    #[test]
    fn record_covers_the_in_page_offset() {
        let region = region(0xFFFF_0000_1000_0800, 0x10000, 0x1000, RegionCaller::IoTable);
        assert_eq!(region.virt.as_u64(), 0xFFFF_0000_1000_0000);
        assert_eq!(region.size, 0x2000);
        assert_eq!(region.phys.as_u64(), 0x1000_0000);
        assert!(region.flags.contains(RegionFlags::IOREMAP | RegionFlags::STATIC_MAPPING));
        assert_eq!(region.flags.mtype(), MemoryType::DeviceNGnRE.into_bits());
        assert!(region.contains(VirtualAddress::new(0xFFFF_0000_1000_1FFF)));
        assert!(!region.contains(VirtualAddress::new(0xFFFF_0000_1000_2000)));
    }

    #[test]
    fn mtype_replaces_previous_value() {
        let flags = RegionFlags::IOREMAP
            .with_mtype(MemoryType::Normal)
            .with_mtype(MemoryType::DeviceGRE);
        assert_eq!(flags.mtype(), 2);
        assert!(flags.contains(RegionFlags::IOREMAP));
    }

    #[test]
    fn registry_stays_sorted() {
        let mut registry = StaticRegionRegistry::new();
        for virt in [0xFFFF_0000_3000_0000, 0xFFFF_0000_1000_0000, 0xFFFF_0000_2000_0000] {
            registry.insert(region(virt, 0x10000, 0x1000, RegionCaller::IoTable));
        }

        let starts: Vec<u64> = registry.regions().iter().map(|r| r.virt.as_u64()).collect();
        assert_eq!(starts, [0xFFFF_0000_1000_0000, 0xFFFF_0000_2000_0000, 0xFFFF_0000_3000_0000]);
    }

    #[test]
    fn equal_addresses_keep_insertion_order() {
        let mut registry = StaticRegionRegistry::new();
        registry.insert(region(0xFFFF_0000_1000_0000, 1, 0x1000, RegionCaller::IoTable));
        registry.insert(region(0xFFFF_0000_1000_0000, 2, 0x1000, RegionCaller::IoTableExec));

        assert_eq!(registry.regions()[0].caller, RegionCaller::IoTable);
        assert_eq!(registry.regions()[1].caller, RegionCaller::IoTableExec);
    }

    #[test]
    fn find_by_address() {
        let mut registry = StaticRegionRegistry::new();
        registry.insert(region(0xFFFF_0000_1000_0000, 1, 0x3000, RegionCaller::IoTable));
        registry.insert(region(0xFFFF_0000_2000_0000, 2, 0x1000, RegionCaller::IoTable));

        assert_eq!(
            registry.find(VirtualAddress::new(0xFFFF_0000_1000_2010)).unwrap().phys.as_u64(),
            0x1000
        );
        assert!(registry.find(VirtualAddress::new(0xFFFF_0000_1000_3000)).is_none());
        assert!(registry.find(VirtualAddress::new(0xFFFF_0000_0000_0000)).is_none());
    }
}
