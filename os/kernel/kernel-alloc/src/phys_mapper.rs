//! # Linear-Map `PhysMapper`
//!
//! Reaches directory tables through the kernel's linear map of RAM: every
//! physical address `pa` is visible at `page_offset + (pa - phys_offset)`.
//!
//! Tables allocated by the early allocator are always reachable this way
//! because the allocation limit keeps them inside the part of RAM the
//! initial kernel mapping already covers.

use kernel_info::memory::MemoryLayout;
use kernel_vmem::{DirectoryTable, PhysMapper, TablePage};

/// [`PhysMapper`] for a kernel running on its linear map.
pub struct LinearPhysMapper {
    layout: MemoryLayout,
}

impl LinearPhysMapper {
    /// # Safety
    /// For every table page later passed to [`PhysMapper::table`] or
    /// [`PhysMapper::table_mut`], the linear-map address given by `layout`
    /// must be mapped, writable and used by nothing but the page-table
    /// code while the returned reference lives.
    #[must_use]
    pub const unsafe fn new(layout: MemoryLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub const fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    #[allow(clippy::cast_possible_truncation)]
    fn pointer(&self, page: TablePage) -> *mut DirectoryTable {
        self.layout.phys_to_virt(page.base()).as_u64() as usize as *mut DirectoryTable
    }
}

impl PhysMapper for LinearPhysMapper {
    fn table(&self, page: TablePage) -> &DirectoryTable {
        // SAFETY: guaranteed by the contract of `LinearPhysMapper::new`.
        unsafe { &*self.pointer(page) }
    }

    fn table_mut(&mut self, page: TablePage) -> &mut DirectoryTable {
        // SAFETY: guaranteed by the contract of `LinearPhysMapper::new`.
        unsafe { &mut *self.pointer(page) }
    }
}
