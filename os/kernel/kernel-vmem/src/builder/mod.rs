//! # Mapping Construction
//!
//! One director per level, each consuming the range its parent hands it:
//!
//! ```text
//! build_range ──► populate_upper ──► populate_mid ──► populate_leaf
//!  (L0 strides)    (1 GiB strides)    (2 MiB strides)   (4 KiB pages)
//!                   │                  │
//!                   └─ huge block      └─ section block
//! ```
//!
//! A level installs a block when the policy allows it and the virtual start,
//! virtual end and physical start of the stride are all aligned to the
//! level's span; otherwise it descends, allocating the child table on first
//! use. Replacing a live entry goes through a [`Supersede`] transaction.

mod leaf;
mod mid;
mod supersede;
mod top;
mod upper;

pub(crate) use supersede::{Reclaim, Supersede};
pub(crate) use top::{build_range, page_extent};

use crate::descriptor::{Descriptor, DescriptorKind, LeafDescriptor, TableDescriptor};
use crate::error::FatalError;
use crate::journal::Journal;
use crate::level::Level;
use crate::table::{TableIndex, TablePage};
use crate::{FrameAlloc, PhysMapper};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_registers::CacheMaintenance;

/// Everything a construction pass touches.
pub(crate) struct BuildContext<'a, M, A, C> {
    pub mem: &'a mut M,
    pub alloc: &'a mut A,
    pub maintenance: &'a mut C,
    pub journal: &'a mut Journal,
}

impl<M, A, C> BuildContext<'_, M, A, C>
where
    M: PhysMapper,
    A: FrameAlloc,
    C: CacheMaintenance,
{
    #[inline]
    pub fn entry(&self, table: TablePage, index: TableIndex) -> Descriptor {
        self.mem.table(table).get(index)
    }

    /// A zeroed table page from the allocator.
    pub fn allocate_table(&mut self) -> Result<TablePage, FatalError> {
        let base = self.alloc.alloc(PAGE_SIZE, PAGE_SIZE)?;
        debug_assert!(base.is_aligned_to(PAGE_SIZE));
        let page = TablePage::containing(base);
        self.mem.table_mut(page).zero();
        Ok(page)
    }

    /// The child table behind the `parent_level` entry covering `addr`,
    /// allocating it if the entry is empty and splitting a block into an
    /// equivalent table if it holds one.
    pub fn descend(
        &mut self,
        parent: TablePage,
        parent_level: Level,
        addr: VirtualAddress,
    ) -> Result<TablePage, FatalError> {
        let index = parent_level.index_of(addr);
        let entry = self.entry(parent, index);
        match entry.kind(parent_level) {
            DescriptorKind::Table(table) => Ok(table.next_table()),
            DescriptorKind::Empty => {
                let child = self.allocate_table()?;
                self.mem
                    .table_mut(parent)
                    .set(index, TableDescriptor::pointing_to(child).into());
                log::trace!("new table at {child} below {parent_level} entry {index} for {addr}");
                Ok(child)
            }
            DescriptorKind::Block(block) => {
                self.split_block(parent, parent_level, index, addr, entry, block)
            }
            DescriptorKind::Page(_) | DescriptorKind::Reserved => Err(FatalError::BadEntry {
                level: parent_level,
                index,
                raw: entry.into_bits(),
            }),
        }
    }

    /// Replaces a block with a table reproducing its mapping one level down.
    fn split_block(
        &mut self,
        parent: TablePage,
        parent_level: Level,
        index: TableIndex,
        addr: VirtualAddress,
        previous: Descriptor,
        block: LeafDescriptor,
    ) -> Result<TablePage, FatalError> {
        let Some(child_level) = parent_level.next() else {
            return Err(FatalError::BadEntry {
                level: parent_level,
                index,
                raw: previous.into_bits(),
            });
        };

        let child = self.allocate_table()?;
        let span = child_level.entry_span();
        let attributes = block.for_level(child_level);
        let base = block.output_address();
        {
            let table = self.mem.table_mut(child);
            for (i, slot) in TableIndex::all().enumerate() {
                let phys = base + (i as u64) * span;
                table.set(slot, attributes.mapping(phys).into());
            }
        }

        log::debug!(
            "splitting {parent_level} block for {addr} into {child_level} entries at {child}"
        );
        Supersede {
            table: parent,
            index,
            level: parent_level,
            virt: addr.align_down_to(parent_level.entry_span()),
            previous,
            replacement: TableDescriptor::pointing_to(child).into(),
        }
        .commit(self, Reclaim::Nothing)?;

        Ok(child)
    }

    /// Installs a block at `level` for `addr`, superseding whatever the
    /// entry held before.
    ///
    /// Only the upper level gives a replaced table back; a table replaced at
    /// the mid level stays allocated.
    pub fn install_block(
        &mut self,
        table: TablePage,
        level: Level,
        addr: VirtualAddress,
        phys: PhysicalAddress,
        attributes: LeafDescriptor,
    ) -> Result<(), FatalError> {
        debug_assert!(level.supports_blocks());
        let index = level.index_of(addr);
        let previous = self.entry(table, index);
        let replacement: Descriptor = attributes.for_level(level).mapping(phys).into();

        let reclaim = match previous.kind(level) {
            DescriptorKind::Empty => {
                self.mem.table_mut(table).set(index, replacement);
                log::trace!("{level} block {addr} -> {phys}");
                return Ok(());
            }
            DescriptorKind::Table(old) if level == Level::Upper => Reclaim::Subtree {
                table: old.next_table(),
                level: Level::Mid,
            },
            DescriptorKind::Table(_) | DescriptorKind::Block(_) => Reclaim::Nothing,
            DescriptorKind::Page(_) | DescriptorKind::Reserved => {
                return Err(FatalError::BadEntry {
                    level,
                    index,
                    raw: previous.into_bits(),
                });
            }
        };

        Supersede {
            table,
            index,
            level,
            virt: addr,
            previous,
            replacement,
        }
        .commit(self, reclaim)
    }
}
