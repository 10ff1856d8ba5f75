use crate::descriptor::Descriptor;
use crate::level::Level;
use core::fmt;
use kernel_info::memory::PTRS_PER_TABLE;
use kernel_memory_addresses::{PhysicalPage, Size4K, VirtualAddress};

/// The physical page holding a directory table. Tables are addressed by this
/// handle only; the [`PhysMapper`](crate::PhysMapper) resolves it.
pub type TablePage = PhysicalPage<Size4K>;

/// Index into a [`DirectoryTable`] (0..512).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TableIndex(u16);

impl TableIndex {
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Self {
        debug_assert!((v as usize) < PTRS_PER_TABLE);
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn of(va: VirtualAddress, level: Level) -> Self {
        level.index_of(va)
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// All indices of a table in ascending order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn all() -> impl Iterator<Item = Self> {
        (0..PTRS_PER_TABLE).map(|i| Self(i as u16))
    }
}

impl fmt::Display for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One directory level: 512 descriptors, 4 KiB aligned.
#[doc(alias = "pgd")]
#[doc(alias = "pud")]
#[doc(alias = "pmd")]
#[doc(alias = "pte")]
#[repr(C, align(4096))]
#[derive(Clone)]
pub struct DirectoryTable {
    entries: [Descriptor; PTRS_PER_TABLE],
}

const _: () = assert!(size_of::<DirectoryTable>() == 4096);

impl DirectoryTable {
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            entries: [Descriptor::EMPTY; PTRS_PER_TABLE],
        }
    }

    #[inline]
    #[must_use]
    pub const fn get(&self, i: TableIndex) -> Descriptor {
        self.entries[i.as_usize()]
    }

    #[inline]
    pub const fn set(&mut self, i: TableIndex, e: Descriptor) {
        self.entries[i.as_usize()] = e;
    }

    #[inline]
    pub fn zero(&mut self) {
        self.entries.fill(Descriptor::EMPTY);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_empty())
    }

    /// Non-empty entries with their index.
    pub fn populated(&self) -> impl Iterator<Item = (TableIndex, Descriptor)> + '_ {
        TableIndex::all()
            .zip(self.entries.iter().copied())
            .filter(|(_, e)| !e.is_empty())
    }
}

impl Default for DirectoryTable {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for DirectoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.populated()).finish()
    }
}
