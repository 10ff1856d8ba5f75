use crate::table::{DirectoryTable, TablePage};

/// Resolves the physical page of a directory table to the table itself.
///
/// Typical patterns:
/// - **Early boot**: identity mapped RAM, the page base is the pointer.
/// - **Kernel**: the linear map, a constant offset is added.
/// - **Host tests**: a sparse in-memory frame store.
///
/// Implementations that hand out references into real memory must only be
/// constructible under an `unsafe` contract guaranteeing that every page
/// passed in is mapped, writable, and owned by the page-table code.
pub trait PhysMapper {
    fn table(&self, page: TablePage) -> &DirectoryTable;

    fn table_mut(&mut self, page: TablePage) -> &mut DirectoryTable;
}

impl<T> PhysMapper for &mut T
where
    T: PhysMapper + ?Sized,
{
    fn table(&self, page: TablePage) -> &DirectoryTable {
        (**self).table(page)
    }

    fn table_mut(&mut self, page: TablePage) -> &mut DirectoryTable {
        (**self).table_mut(page)
    }
}
