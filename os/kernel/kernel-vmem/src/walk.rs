//! Read-only traversal of a hierarchy.

use crate::descriptor::{DescriptorKind, LeafDescriptor};
use crate::level::Level;
use crate::table::TablePage;
use crate::PhysMapper;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Where a virtual address ends up.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Translation {
    pub phys: PhysicalAddress,
    /// Level of the terminating block or page descriptor.
    pub level: Level,
    pub attributes: LeafDescriptor,
}

/// Walks from `root` to the descriptor mapping `va`.
///
/// Returns `None` for unmapped addresses and for malformed entries met on
/// the way.
pub fn translate<M: PhysMapper + ?Sized>(
    mem: &M,
    root: TablePage,
    va: VirtualAddress,
) -> Option<Translation> {
    let mut table = root;
    for level in Level::ALL {
        match mem.table(table).get(level.index_of(va)).kind(level) {
            DescriptorKind::Table(next) => table = next.next_table(),
            DescriptorKind::Block(leaf) | DescriptorKind::Page(leaf) => {
                let offset = va.as_u64() & (level.entry_span() - 1);
                return Some(Translation {
                    phys: leaf.output_address() + offset,
                    level,
                    attributes: leaf,
                });
            }
            DescriptorKind::Empty | DescriptorKind::Reserved => return None,
        }
    }
    None
}

/// Shape of a hierarchy, counted per level.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TreeCensus {
    pub upper_tables: usize,
    pub mid_tables: usize,
    pub leaf_tables: usize,
    /// 1 GiB blocks.
    pub huge_blocks: usize,
    /// 2 MiB blocks.
    pub sections: usize,
    pub pages: usize,
    pub reserved: usize,
}

impl TreeCensus {
    /// Tables below the root.
    #[must_use]
    pub const fn tables(&self) -> usize {
        self.upper_tables + self.mid_tables + self.leaf_tables
    }
}

/// Counts the tables and mappings reachable from `root`.
pub fn census<M: PhysMapper + ?Sized>(mem: &M, root: TablePage) -> TreeCensus {
    let mut census = TreeCensus::default();
    count(mem, root, Level::Top, &mut census);
    census
}

fn count<M: PhysMapper + ?Sized>(mem: &M, table: TablePage, level: Level, census: &mut TreeCensus) {
    for (_, entry) in mem.table(table).populated() {
        match entry.kind(level) {
            DescriptorKind::Table(next) => {
                let Some(child) = level.next() else {
                    continue;
                };
                match child {
                    Level::Upper => census.upper_tables += 1,
                    Level::Mid => census.mid_tables += 1,
                    Level::Leaf => census.leaf_tables += 1,
                    Level::Top => {}
                }
                count(mem, next.next_table(), child, census);
            }
            DescriptorKind::Block(_) if level == Level::Upper => census.huge_blocks += 1,
            DescriptorKind::Block(_) => census.sections += 1,
            DescriptorKind::Page(_) => census.pages += 1,
            DescriptorKind::Reserved => census.reserved += 1,
            DescriptorKind::Empty => {}
        }
    }
}
