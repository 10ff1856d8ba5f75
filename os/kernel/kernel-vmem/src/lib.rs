//! # Virtual Memory Support
//!
//! Construction of `AArch64` stage 1 translation tables for the kernel: a
//! four-level hierarchy built on demand from an early allocator, using the
//! largest block each stretch of a mapping request is aligned for.
//!
//! ## What you get
//! - A [`MappingTree`] holding the kernel and identity hierarchies.
//! - Typed [`Descriptor`]s ([`TableDescriptor`], [`LeafDescriptor`]) decoded
//!   per [`Level`].
//! - Attribute profiles and the [`MemoryPolicy`] that selects them.
//! - A 4 KiB-aligned [`DirectoryTable`] and its [`TableIndex`].
//! - A tiny allocator/mapper interface ([`FrameAlloc`], [`PhysMapper`]).
//! - A [`Journal`] of supersede transactions for inspection.
//!
//! ## `AArch64` Virtual Address → Physical Address Walk
//!
//! With the 4 KiB granule and 48-bit virtual addresses, every address is
//! divided into five fields:
//!
//! ```text
//! | 47‒39 | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! |  L0   |  L1   |  L2   |  L3   | Offset |
//! ```
//!
//! ```text
//!  L0 (PGD) →  L1 (PUD) →  L2 (PMD) →  L3 (PTE) → Physical Page
//!   │            │            │            │
//!   │            │            │            └──► page descriptor  → maps 4 KiB
//!   │            │            └───────────────► block descriptor → maps 2 MiB
//!   │            └────────────────────────────► block descriptor → maps 1 GiB
//!   └─────────────────────────────────────────► table descriptor only
//! ```
//!
//! ### Levels and their roles
//!
//! | Level | Name | Entry span | Terminal entry |
//! |:------|:-----|:-----------|:---------------|
//! | L0 | [`Top`](Level::Top) | 512 GiB | never |
//! | L1 | [`Upper`](Level::Upper) | 1 GiB | block, if the policy allows huge blocks |
//! | L2 | [`Mid`](Level::Mid) | 2 MiB | block |
//! | L3 | [`Leaf`](Level::Leaf) | 4 KiB | page, always |
//!
//! ## Building a mapping
//!
//! For each stride of the request, a level installs a block if the virtual
//! start, the virtual end and the physical start are all aligned to its span;
//! otherwise it descends, allocating the child table if needed. A block that
//! already covers a finer request is split into an equivalent table first.
//!
//! Replacing a live entry is a *supersede*: the new descriptor is written,
//! all TLB entries are invalidated, and only then is storage of the replaced
//! subtree released. Only the upper level releases anything.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::inline_always)]

extern crate alloc;

mod attributes;
mod builder;
mod descriptor;
mod error;
mod frame_alloc;
mod journal;
mod level;
mod mapper;
mod table;
mod tree;
mod vmemmap;
mod walk;

#[cfg(any(test, feature = "software-emulation"))]
pub mod emulated;

pub use crate::attributes::{
    AccessPermissions, MemoryPolicy, PAGE_KERNEL_EXEC, PROT_DEVICE_NGNRE, PROT_NORMAL_NC,
    PROT_SECT_DEVICE_NGNRE, PROT_SECT_NORMAL, PROT_SECT_NORMAL_EXEC, PROT_SECT_NORMAL_NC,
    Shareability,
};
pub use crate::descriptor::{Descriptor, DescriptorKind, LeafDescriptor, TableDescriptor};
pub use crate::error::{FatalError, MapError};
pub use crate::frame_alloc::{AllocError, FrameAlloc};
pub use crate::journal::{Journal, SupersedeRecord, SupersedeStep};
pub use crate::level::Level;
pub use crate::mapper::PhysMapper;
pub use crate::table::{DirectoryTable, TableIndex, TablePage};
pub use crate::tree::{MappingDescriptor, MappingTree};
pub use crate::walk::{Translation, TreeCensus, census, translate};

/// Re-export constants as info module.
pub use kernel_info::memory as info;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulated::{BumpFrameAlloc, EmulatedPhysMemory};
    use kernel_info::memory::{MemoryLayout, PAGE_SIZE, PGDIR_SIZE, PMD_SIZE, PUD_SIZE};
    use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
    use kernel_registers::{MaintenanceError, RecordingMaintenance};

    const LINEAR: u64 = 0xFFFF_8000_0000_0000;

    /// Table memory lives at 1 GiB, mapped RAM at 2 GiB.
    struct Harness {
        tree: MappingTree<EmulatedPhysMemory>,
        alloc: BumpFrameAlloc,
        maintenance: RecordingMaintenance,
    }

    impl Harness {
        fn with_table_memory(bytes: u64) -> Self {
            Self::build(bytes, MemoryLayout::DEFAULT)
        }

        fn with_layout(layout: MemoryLayout) -> Self {
            Self::build(16 * 1024 * 1024, layout)
        }

        fn build(bytes: u64, layout: MemoryLayout) -> Self {
            let mut alloc = BumpFrameAlloc::new(
                PhysicalAddress::new(0x4000_0000),
                PhysicalAddress::new(0x4000_0000 + bytes),
            );
            let tree =
                MappingTree::new(EmulatedPhysMemory::new(), &mut alloc, layout).expect("roots");
            Self {
                tree,
                alloc,
                maintenance: RecordingMaintenance::new(),
            }
        }

        fn new() -> Self {
            Self::with_table_memory(16 * 1024 * 1024)
        }

        fn map(
            &mut self,
            phys: u64,
            virt: u64,
            length: u64,
            policy: MemoryPolicy,
        ) -> Result<(), MapError> {
            let request = MappingDescriptor::new(
                PhysicalAddress::new(phys),
                VirtualAddress::new(virt),
                length,
                policy,
            );
            self.tree
                .map_kernel(&mut self.alloc, &mut self.maintenance, &request)
        }

        fn translate(&self, va: u64) -> Option<Translation> {
            self.tree.translate(VirtualAddress::new(va))
        }

        /// The table linked from the `level` entry covering `va`.
        fn child(&self, table: TablePage, level: Level, va: u64) -> TablePage {
            match self
                .tree
                .table(table)
                .get(level.index_of(VirtualAddress::new(va)))
                .kind(level)
            {
                DescriptorKind::Table(t) => t.next_table(),
                other => panic!("expected a table at {level}, found {other:?}"),
            }
        }
    }

    #[test]
    fn aligned_2m_maps_one_section_and_no_leaf_table() {
        let mut h = Harness::new();
        h.map(0x8020_0000, LINEAR + 0x20_0000, PMD_SIZE, MemoryPolicy::Normal)
            .expect("map");

        let census = h.tree.census();
        assert_eq!(census.sections, 1);
        assert_eq!(census.leaf_tables, 0);
        assert_eq!(census.upper_tables, 1);
        assert_eq!(census.mid_tables, 1);

        let t = h.translate(LINEAR + 0x20_1234).expect("mapped");
        assert_eq!(t.phys.as_u64(), 0x8020_1234);
        assert_eq!(t.level, Level::Mid);
        assert_eq!(
            t.attributes,
            PROT_SECT_NORMAL_EXEC.mapping(PhysicalAddress::new(0x8020_0000))
        );
        assert_eq!(h.maintenance.tlb_flushes(), 0);
    }

    #[test]
    fn unaligned_4k_maps_one_page_under_a_leaf_table() {
        let mut h = Harness::new();
        let va = LINEAR + 0x20_3000;
        h.map(0x8020_3000, va, PAGE_SIZE, MemoryPolicy::Normal)
            .expect("map");

        let census = h.tree.census();
        assert_eq!(census.leaf_tables, 1);
        assert_eq!(census.pages, 1);
        assert_eq!(census.sections, 0);

        let upper = h.child(h.tree.kernel_root(), Level::Top, va);
        let mid = h.child(upper, Level::Upper, va);
        let leaf = h.child(mid, Level::Mid, va);
        assert_eq!(h.tree.table(leaf).populated().count(), 1);

        let t = h.translate(va + 0x10).expect("mapped");
        assert_eq!(t.phys.as_u64(), 0x8020_3010);
        assert_eq!(t.level, Level::Leaf);
        assert!(h.translate(va + PAGE_SIZE).is_none());
        assert!(h.translate(va - PAGE_SIZE).is_none());
    }

    #[test]
    fn in_page_offset_widens_the_request() {
        let mut h = Harness::new();
        // 0x10 bytes starting 8 bytes before a page boundary touch two pages
        h.map(0x8020_0FF8, LINEAR + 0x20_0FF8, 0x10, MemoryPolicy::Normal)
            .expect("map");

        assert_eq!(h.tree.census().pages, 2);
        assert_eq!(h.translate(LINEAR + 0x20_0000).unwrap().phys.as_u64(), 0x8020_0000);
        assert_eq!(h.translate(LINEAR + 0x20_1004).unwrap().phys.as_u64(), 0x8020_1004);
    }

    #[test]
    fn aligned_1g_normal_uses_a_huge_block() {
        let mut h = Harness::new();
        h.map(0x8000_0000, LINEAR + PUD_SIZE, PUD_SIZE, MemoryPolicy::Normal)
            .expect("map");

        let census = h.tree.census();
        assert_eq!(census.huge_blocks, 1);
        assert_eq!(census.mid_tables, 0);
        let t = h.translate(LINEAR + PUD_SIZE + 0x1234_5678).unwrap();
        assert_eq!(t.level, Level::Upper);
        assert_eq!(t.phys.as_u64(), 0x8000_0000 + 0x1234_5678);
    }

    #[test]
    fn device_memory_never_uses_huge_blocks() {
        let mut h = Harness::new();
        h.map(0xC000_0000, LINEAR + PUD_SIZE, PUD_SIZE, MemoryPolicy::Device)
            .expect("map");

        let census = h.tree.census();
        assert_eq!(census.huge_blocks, 0);
        assert_eq!(census.sections, 512);
        assert_eq!(census.mid_tables, 1);

        let t = h.translate(LINEAR + PUD_SIZE).unwrap();
        assert_eq!(t.attributes, PROT_SECT_DEVICE_NGNRE.mapping(PhysicalAddress::new(0xC000_0000)));
    }

    #[test]
    fn mixed_alignment_uses_the_largest_block_per_stride() {
        let mut h = Harness::new();
        // 4 KiB before a 2 MiB boundary, then one full section, then 4 KiB
        let va = LINEAR + 0x3F_F000;
        h.map(0x803F_F000, va, PMD_SIZE + 2 * PAGE_SIZE, MemoryPolicy::Normal)
            .expect("map");

        let census = h.tree.census();
        assert_eq!(census.sections, 1);
        assert_eq!(census.pages, 2);
        assert_eq!(census.leaf_tables, 2);
        assert_eq!(h.translate(LINEAR + 0x40_0000).unwrap().level, Level::Mid);
        assert_eq!(h.translate(LINEAR + 0x60_0000).unwrap().phys.as_u64(), 0x8060_0000);
    }

    #[test]
    fn misaligned_physical_base_forces_pages() {
        let mut h = Harness::new();
        h.map(0x8020_1000, LINEAR + 0x20_0000, PMD_SIZE, MemoryPolicy::Normal)
            .expect("map");

        let census = h.tree.census();
        assert_eq!(census.sections, 0);
        assert_eq!(census.pages, 512);
    }

    #[test]
    fn crossing_a_top_level_boundary_links_two_upper_tables() {
        let mut h = Harness::new();
        let va = 0xFFFF_807F_FFE0_0000;
        h.map(0x8000_0000, va, 2 * PMD_SIZE, MemoryPolicy::Normal)
            .expect("map");

        let census = h.tree.census();
        assert_eq!(census.upper_tables, 2);
        assert_eq!(census.sections, 2);
        assert_eq!(h.translate(va).unwrap().phys.as_u64(), 0x8000_0000);
        assert_eq!(h.translate(0xFFFF_8080_0000_0000).unwrap().phys.as_u64(), 0x8020_0000);
    }

    #[test]
    fn last_page_of_the_address_space() {
        let mut h = Harness::new();
        h.map(0x8000_0000, 0xFFFF_FFFF_FFFF_F000, PAGE_SIZE, MemoryPolicy::Normal)
            .expect("map");

        let t = h.translate(0xFFFF_FFFF_FFFF_F123).unwrap();
        assert_eq!(t.phys.as_u64(), 0x8000_0123);
        assert_eq!(h.tree.census().pages, 1);
    }

    #[test]
    fn running_past_the_top_of_the_address_space_is_rejected() {
        let mut h = Harness::new();
        let before = h.alloc.allocations();
        let err = h
            .map(0x8000_0000, 0xFFFF_FFFF_FFFF_F000, 2 * PAGE_SIZE, MemoryPolicy::Normal)
            .unwrap_err();

        assert!(matches!(err, MapError::OutsideKernelRange { .. }));
        assert_eq!(h.alloc.allocations(), before);
        assert!(h.tree.table(h.tree.kernel_root()).is_empty());
        assert!(h.translate(0xFFFF_FFFF_FFE0_0000).is_none());
    }

    #[test]
    fn wrapping_length_is_rejected() {
        let mut h = Harness::new();
        let err = h
            .map(0x8000_0000, LINEAR + 0x10, u64::MAX, MemoryPolicy::Normal)
            .unwrap_err();
        assert!(matches!(err, MapError::OutsideKernelRange { .. }));
        assert_eq!(h.tree.census(), TreeCensus::default());
    }

    #[test]
    fn zero_length_is_a_no_op() {
        let mut h = Harness::new();
        h.map(0x8000_0000, LINEAR, 0, MemoryPolicy::Normal).expect("map");
        assert_eq!(h.tree.census(), TreeCensus::default());
    }

    #[test]
    fn below_the_kernel_floor_is_rejected_without_change() {
        let mut h = Harness::new();
        let before = h.alloc.allocations();
        let err = h
            .map(0x8000_0000, 0x0000_0000_4000_0000, PMD_SIZE, MemoryPolicy::Normal)
            .unwrap_err();

        assert_eq!(
            err,
            MapError::OutsideKernelRange {
                phys: PhysicalAddress::new(0x8000_0000),
                virt: VirtualAddress::new(0x4000_0000),
            }
        );
        assert!(!err.is_fatal());
        assert_eq!(h.alloc.allocations(), before);
        assert!(h.tree.table(h.tree.kernel_root()).is_empty());
    }

    #[test]
    fn identity_beyond_the_directory_is_rejected() {
        let mut h = Harness::new();
        let err = h
            .tree
            .map_identity(
                &mut h.alloc,
                &mut h.maintenance,
                PhysicalAddress::new(1 << 48),
                PAGE_SIZE,
                false,
            )
            .unwrap_err();
        assert_eq!(
            err,
            MapError::IdentityOutOfRange {
                phys: PhysicalAddress::new(1 << 48)
            }
        );
        assert!(h.tree.table(h.tree.identity_root()).is_empty());
    }

    #[test]
    fn identity_range_ending_beyond_the_directory_is_rejected() {
        let mut h = Harness::new();
        let start = PhysicalAddress::new((1 << 48) - PUD_SIZE);
        let err = h
            .tree
            .map_identity(&mut h.alloc, &mut h.maintenance, start, 2 * PUD_SIZE, false)
            .unwrap_err();

        assert_eq!(err, MapError::IdentityOutOfRange { phys: start });
        assert!(h.tree.table(h.tree.identity_root()).is_empty());
        assert!(h.tree.translate_identity(VirtualAddress::new(0)).is_none());
    }

    #[test]
    fn identity_range_respects_a_smaller_directory() {
        let layout = MemoryLayout {
            idmap_entries: 1,
            ..MemoryLayout::DEFAULT
        };
        let mut h = Harness::with_layout(layout);
        let start = PhysicalAddress::new(PGDIR_SIZE - PUD_SIZE);

        assert!(matches!(
            h.tree
                .map_identity(&mut h.alloc, &mut h.maintenance, start, 2 * PUD_SIZE, false),
            Err(MapError::IdentityOutOfRange { .. })
        ));
        h.tree
            .map_identity(&mut h.alloc, &mut h.maintenance, start, PUD_SIZE, false)
            .expect("last gigabyte of the only entry");
        assert_eq!(h.tree.identity_census().huge_blocks, 1);
    }

    #[test]
    fn identity_mapping_uses_its_own_directory() {
        let mut h = Harness::new();
        h.tree
            .map_identity(
                &mut h.alloc,
                &mut h.maintenance,
                PhysicalAddress::new(0x9000_0000),
                PMD_SIZE,
                true,
            )
            .expect("map");

        let t = h
            .tree
            .translate_identity(VirtualAddress::new(0x9000_0040))
            .unwrap();
        assert_eq!(t.phys.as_u64(), 0x9000_0040);
        assert_eq!(t.attributes.attr_index(), kernel_registers::MemoryType::DeviceNGnRE);
        assert!(h.translate(0x9000_0040).is_none());
        assert_eq!(h.tree.census(), TreeCensus::default());
        assert_eq!(h.tree.identity_census().sections, 1);
    }

    #[test]
    fn remapping_a_block_invalidates_exactly_once() {
        let mut h = Harness::new();
        h.map(0x8020_0000, LINEAR + 0x20_0000, PMD_SIZE, MemoryPolicy::Normal)
            .unwrap();
        let census = h.tree.census();
        let allocations = h.alloc.allocations();

        h.map(0x8020_0000, LINEAR + 0x20_0000, PMD_SIZE, MemoryPolicy::Normal)
            .unwrap();

        assert_eq!(h.tree.census(), census);
        assert_eq!(h.alloc.allocations(), allocations);
        assert_eq!(h.maintenance.tlb_flushes(), 1);

        let records = h.tree.journal().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Mid);
        assert_eq!(records[0].previous, records[0].replacement);
        assert_eq!(
            records[0].steps,
            [SupersedeStep::Installed, SupersedeStep::Invalidated]
        );
    }

    #[test]
    fn huge_block_releases_the_replaced_subtree_after_invalidation() {
        let mut h = Harness::new();
        let va = LINEAR + PUD_SIZE;
        h.map(0x8000_0000, va, PAGE_SIZE, MemoryPolicy::Normal).unwrap();

        let upper = h.child(h.tree.kernel_root(), Level::Top, va);
        let mid = h.child(upper, Level::Upper, va);
        let leaf = h.child(mid, Level::Mid, va);

        h.map(0x8000_0000, va, PUD_SIZE, MemoryPolicy::Normal).unwrap();

        let records = h.tree.journal().records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, Level::Upper);
        assert_eq!(
            record.steps,
            [
                SupersedeStep::Installed,
                SupersedeStep::Invalidated,
                SupersedeStep::Released(leaf),
                SupersedeStep::Released(mid),
            ]
        );
        assert!(record.released_after_invalidation());
        assert_eq!(h.alloc.freed(), &[leaf.base(), mid.base()]);

        let census = h.tree.census();
        assert_eq!(census.huge_blocks, 1);
        assert_eq!(census.mid_tables, 0);
        assert_eq!(census.leaf_tables, 0);
    }

    #[test]
    fn section_replacing_a_leaf_table_releases_nothing() {
        let mut h = Harness::new();
        let va = LINEAR + 0x20_0000;
        h.map(0x8020_0000, va, PAGE_SIZE, MemoryPolicy::Normal).unwrap();
        h.map(0x8020_0000, va, PMD_SIZE, MemoryPolicy::Normal).unwrap();

        let record = &h.tree.journal().records()[0];
        assert_eq!(record.level, Level::Mid);
        assert_eq!(record.released().count(), 0);
        assert!(h.alloc.freed().is_empty());
        assert_eq!(h.tree.census().leaf_tables, 0);
        assert_eq!(h.tree.census().sections, 1);
    }

    #[test]
    fn failed_invalidation_is_fatal_and_keeps_the_old_tables() {
        let mut h = Harness::new();
        let va = LINEAR + PUD_SIZE;
        h.map(0x8000_0000, va, PAGE_SIZE, MemoryPolicy::Normal).unwrap();

        let mut broken = RecordingMaintenance::without_tlb_invalidation();
        let request = MappingDescriptor::new(
            PhysicalAddress::new(0x8000_0000),
            VirtualAddress::new(va),
            PUD_SIZE,
            MemoryPolicy::Normal,
        );
        let err = h
            .tree
            .map_kernel(&mut h.alloc, &mut broken, &request)
            .unwrap_err();

        assert_eq!(
            err,
            MapError::Fatal(FatalError::InvalidationUnavailable(
                MaintenanceError::TlbUnavailable
            ))
        );
        assert!(err.is_fatal());
        assert!(h.alloc.freed().is_empty());
        assert_eq!(
            h.tree.journal().records()[0].steps,
            [SupersedeStep::Installed]
        );
    }

    #[test]
    fn finer_mapping_inside_a_section_splits_it() {
        let mut h = Harness::new();
        let va = LINEAR + 0x20_0000;
        h.map(0x8020_0000, va, PMD_SIZE, MemoryPolicy::Normal).unwrap();
        h.map(0x9000_0000, va + 0x3000, PAGE_SIZE, MemoryPolicy::Normal)
            .unwrap();

        assert_eq!(h.translate(va + 0x3000).unwrap().phys.as_u64(), 0x9000_0000);
        let kept = h.translate(va + 0x5008).unwrap();
        assert_eq!(kept.phys.as_u64(), 0x8020_5008);
        assert_eq!(kept.level, Level::Leaf);
        assert_eq!(kept.attributes.attr_index(), kernel_registers::MemoryType::Normal);

        let census = h.tree.census();
        assert_eq!(census.sections, 0);
        assert_eq!(census.pages, 512);
        assert_eq!(census.leaf_tables, 1);
        assert_eq!(h.maintenance.tlb_flushes(), 1);
        assert_eq!(h.tree.journal().records()[0].level, Level::Mid);
    }

    #[test]
    fn finer_mapping_inside_a_huge_block_splits_twice() {
        let mut h = Harness::new();
        let va = LINEAR + PUD_SIZE;
        h.map(0x8000_0000, va, PUD_SIZE, MemoryPolicy::Normal).unwrap();
        h.map(0xA000_0000, va + 0x40_1000, PAGE_SIZE, MemoryPolicy::Normal)
            .unwrap();

        let census = h.tree.census();
        assert_eq!(census.huge_blocks, 0);
        assert_eq!(census.sections, 511);
        assert_eq!(census.pages, 512);
        assert_eq!(h.translate(va + 0x40_1000).unwrap().phys.as_u64(), 0xA000_0000);
        assert_eq!(h.translate(va + 0x80_0000).unwrap().phys.as_u64(), 0x8080_0000);
        assert_eq!(h.maintenance.tlb_flushes(), 2);
    }

    #[test]
    fn reserved_encoding_in_the_top_directory_is_fatal() {
        let mut h = Harness::new();
        let root = h.tree.kernel_root();
        let index = Level::Top.index_of(VirtualAddress::new(LINEAR));
        h.tree
            .mapper_mut()
            .table_mut(root)
            .set(index, Descriptor::from_bits(0x4000_0001));

        let err = h
            .map(0x8000_0000, LINEAR, PAGE_SIZE, MemoryPolicy::Normal)
            .unwrap_err();
        assert_eq!(
            err,
            MapError::Fatal(FatalError::BadEntry {
                level: Level::Top,
                index,
                raw: 0x4000_0001
            })
        );
    }

    #[test]
    fn exhausted_allocator_is_fatal() {
        let mut h = Harness::with_table_memory(2 * PAGE_SIZE);
        let err = h
            .map(0x8000_0000, LINEAR, PAGE_SIZE, MemoryPolicy::Normal)
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::Fatal(FatalError::AllocatorExhausted(AllocError::Exhausted { .. }))
        ));
    }

    #[test]
    fn new_tables_are_zeroed() {
        let mut h = Harness::new();
        // the next table page handed out follows the two roots
        let next = TablePage::containing(PhysicalAddress::new(0x4000_2000));
        h.tree
            .mapper_mut()
            .table_mut(next)
            .set(TableIndex::new(100), Descriptor::from_bits(0xDEAD_0003));

        h.map(0x8000_0000, LINEAR, PMD_SIZE, MemoryPolicy::Normal).unwrap();

        let upper = h.child(h.tree.kernel_root(), Level::Top, LINEAR);
        assert_eq!(upper, next);
        assert_eq!(h.tree.table(upper).populated().count(), 1);
    }

    #[test]
    fn vmemmap_backs_the_range_with_fresh_sections() {
        let mut h = Harness::new();
        let start = VirtualAddress::new(0xFFFF_7E00_0000_0000);
        let end = start + 2 * PMD_SIZE;
        h.tree
            .populate_vmemmap(&mut h.alloc, &mut h.maintenance, start, end)
            .unwrap();

        let census = h.tree.census();
        assert_eq!(census.sections, 2);
        let t = h.tree.translate(start).unwrap();
        assert!(t.attributes.pxn());
        assert!(t.phys.is_aligned_to(PMD_SIZE));

        let allocations = h.alloc.allocations();
        h.tree
            .populate_vmemmap(&mut h.alloc, &mut h.maintenance, start, end)
            .unwrap();
        assert_eq!(h.alloc.allocations(), allocations);
        assert_eq!(h.maintenance.tlb_flushes(), 0);
    }
}
