use crate::attributes::MemoryPolicy;
use crate::builder::{BuildContext, build_range, page_extent};
use crate::error::{FatalError, MapError};
use crate::journal::Journal;
use crate::table::{DirectoryTable, TablePage};
use crate::walk::{Translation, TreeCensus, census, translate};
use crate::{FrameAlloc, PhysMapper, vmemmap};
use kernel_info::memory::MemoryLayout;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_registers::CacheMaintenance;

/// A request to map physical memory into the kernel address space.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MappingDescriptor {
    pub phys: PhysicalAddress,
    pub virt: VirtualAddress,
    pub length: u64,
    pub policy: MemoryPolicy,
}

impl MappingDescriptor {
    #[must_use]
    pub const fn new(
        phys: PhysicalAddress,
        virt: VirtualAddress,
        length: u64,
        policy: MemoryPolicy,
    ) -> Self {
        Self {
            phys,
            virt,
            length,
            policy,
        }
    }
}

/// The kernel's translation hierarchy and the separate identity hierarchy.
///
/// Owns the mapper through which every table is reached. Allocator and
/// maintenance are lent per call, so the same tree can be built with the
/// early allocator during boot and inspected later without it.
pub struct MappingTree<M> {
    mem: M,
    layout: MemoryLayout,
    kernel_root: TablePage,
    identity_root: TablePage,
    journal: Journal,
}

impl<M: PhysMapper> MappingTree<M> {
    /// Allocates and zeroes both top-level directories.
    ///
    /// # Errors
    /// [`FatalError::AllocatorExhausted`] if either root cannot be allocated.
    pub fn new<A: FrameAlloc>(
        mut mem: M,
        alloc: &mut A,
        layout: MemoryLayout,
    ) -> Result<Self, FatalError> {
        let mut allocate_root = || -> Result<TablePage, FatalError> {
            let base = alloc.alloc(kernel_info::memory::PAGE_SIZE, kernel_info::memory::PAGE_SIZE)?;
            let page = TablePage::containing(base);
            mem.table_mut(page).zero();
            Ok(page)
        };
        let kernel_root = allocate_root()?;
        let identity_root = allocate_root()?;
        log::debug!("kernel directory at {kernel_root}, identity directory at {identity_root}");
        Ok(Self::with_roots(mem, layout, kernel_root, identity_root))
    }

    /// Adopts existing top-level directories, e.g. ones reserved in the
    /// kernel image.
    #[must_use]
    pub const fn with_roots(
        mem: M,
        layout: MemoryLayout,
        kernel_root: TablePage,
        identity_root: TablePage,
    ) -> Self {
        Self {
            mem,
            layout,
            kernel_root,
            identity_root,
            journal: Journal::new(),
        }
    }

    /// Maps `request` into the kernel hierarchy.
    ///
    /// # Errors
    /// - [`MapError::OutsideKernelRange`] if the range starts below the
    ///   kernel floor or runs past the top of the address space; nothing is
    ///   changed.
    /// - [`MapError::Fatal`] if the hierarchy could not be completed.
    pub fn map_kernel<A, C>(
        &mut self,
        alloc: &mut A,
        maintenance: &mut C,
        request: &MappingDescriptor,
    ) -> Result<(), MapError>
    where
        A: FrameAlloc,
        C: CacheMaintenance,
    {
        let (start, length) = page_extent(request.virt, request.length);
        if length < request.length || !self.layout.accepts_kernel_range(start, length) {
            let error = MapError::OutsideKernelRange {
                phys: request.phys,
                virt: request.virt,
            };
            log::warn!("{error}");
            return Err(error);
        }

        let root = self.kernel_root;
        let mut ctx = self.context(alloc, maintenance);
        build_range(&mut ctx, root, request.phys, request.virt, request.length, request.policy)?;
        Ok(())
    }

    /// Maps `[phys, phys + size)` at the identical virtual address in the
    /// identity hierarchy.
    ///
    /// # Errors
    /// - [`MapError::IdentityOutOfRange`] if any part of the range lies
    ///   beyond what the identity directory can index; nothing is changed.
    /// - [`MapError::Fatal`] if the hierarchy could not be completed.
    pub fn map_identity<A, C>(
        &mut self,
        alloc: &mut A,
        maintenance: &mut C,
        phys: PhysicalAddress,
        size: u64,
        device: bool,
    ) -> Result<(), MapError>
    where
        A: FrameAlloc,
        C: CacheMaintenance,
    {
        let (start, length) = page_extent(VirtualAddress::new(phys.as_u64()), size);
        if length < size
            || !self
                .layout
                .identity_covers_range(PhysicalAddress::new(start.as_u64()), length)
        {
            let error = MapError::IdentityOutOfRange { phys };
            log::warn!("{error}");
            return Err(error);
        }

        let policy = if device {
            MemoryPolicy::Device
        } else {
            MemoryPolicy::Normal
        };
        let root = self.identity_root;
        let mut ctx = self.context(alloc, maintenance);
        build_range(&mut ctx, root, phys, VirtualAddress::new(phys.as_u64()), size, policy)?;
        Ok(())
    }

    /// Backs the kernel virtual range `[start, end)` with 2 MiB sections of
    /// fresh memory.
    ///
    /// # Errors
    /// [`FatalError`] if memory or a directory table cannot be allocated.
    pub fn populate_vmemmap<A, C>(
        &mut self,
        alloc: &mut A,
        maintenance: &mut C,
        start: VirtualAddress,
        end: VirtualAddress,
    ) -> Result<(), FatalError>
    where
        A: FrameAlloc,
        C: CacheMaintenance,
    {
        let root = self.kernel_root;
        let mut ctx = self.context(alloc, maintenance);
        vmemmap::populate(&mut ctx, root, start, end)
    }

    fn context<'a, A, C>(
        &'a mut self,
        alloc: &'a mut A,
        maintenance: &'a mut C,
    ) -> BuildContext<'a, M, A, C> {
        BuildContext {
            mem: &mut self.mem,
            alloc,
            maintenance,
            journal: &mut self.journal,
        }
    }

    /// Where `va` is mapped in the kernel hierarchy.
    #[must_use]
    pub fn translate(&self, va: VirtualAddress) -> Option<Translation> {
        translate(&self.mem, self.kernel_root, va)
    }

    /// Where `va` is mapped in the identity hierarchy.
    #[must_use]
    pub fn translate_identity(&self, va: VirtualAddress) -> Option<Translation> {
        translate(&self.mem, self.identity_root, va)
    }

    #[must_use]
    pub fn census(&self) -> TreeCensus {
        census(&self.mem, self.kernel_root)
    }

    #[must_use]
    pub fn identity_census(&self) -> TreeCensus {
        census(&self.mem, self.identity_root)
    }

    /// Direct view of one table of either hierarchy.
    #[must_use]
    pub fn table(&self, page: TablePage) -> &DirectoryTable {
        self.mem.table(page)
    }

    #[must_use]
    pub const fn kernel_root(&self) -> TablePage {
        self.kernel_root
    }

    #[must_use]
    pub const fn identity_root(&self) -> TablePage {
        self.identity_root
    }

    #[must_use]
    pub const fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// Supersede transactions performed so far.
    #[must_use]
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mem
    }

    pub const fn mapper_mut(&mut self) -> &mut M {
        &mut self.mem
    }
}
