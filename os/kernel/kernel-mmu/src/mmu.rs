//! # Boot-Time MMU Setup
//!
//! [`KernelMmu`] drives the translation tables from an empty kernel
//! directory to the final boot layout:
//!
//! 1. [`KernelMmu::apply_boot_params`] optionally changes the cache policy.
//! 2. [`KernelMmu::map_memory`] maps every RAM bank into the linear map,
//!    allocating tables only from RAM the initial mapping already covers.
//! 3. [`KernelMmu::prepare_zero_page`] flushes caches and TLB, allocates the
//!    zero page and parks `TTBR0_EL1` on it.
//! 4. [`KernelMmu::iotable_init`] / [`KernelMmu::iotable_init_exec`] map
//!    and record the board's static device windows.
//!
//! Steps 2 and 3 together are [`KernelMmu::paging_init`].

use crate::cache_policy::CachePolicy;
use crate::error::{BootError, CachePolicyError};
use crate::iotable::{MapDesc, RegionCaller, StaticRegion, StaticRegionRegistry};
use crate::stage::BootStage;
use kernel_alloc::{AllocLimit, BootAllocator, MemoryMap};
use kernel_info::cmdline::BootParams;
use kernel_info::memory::{MemoryLayout, PAGE_SIZE, PMD_MASK, PMD_SIZE};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_registers::{CacheMaintenance, SystemRegisters, Ttbr};
use kernel_vmem::{
    FatalError, FrameAlloc, MapError, MappingDescriptor, MappingTree, MemoryPolicy, PhysMapper,
    TablePage,
};

/// Translation table state of the boot CPU.
pub struct KernelMmu<M, C, R> {
    tree: MappingTree<M>,
    alloc: BootAllocator,
    maintenance: C,
    registers: R,
    stage: BootStage,
    cache_policy: Option<&'static CachePolicy>,
    zero_page: Option<PhysicalAddress>,
    regions: StaticRegionRegistry,
}

impl<M, C, R> KernelMmu<M, C, R>
where
    M: PhysMapper,
    C: CacheMaintenance,
    R: SystemRegisters,
{
    /// Allocates the kernel and identity directories from `alloc`.
    ///
    /// # Errors
    /// [`BootError::Fatal`] if the directories cannot be allocated.
    pub fn new(
        mem: M,
        mut alloc: BootAllocator,
        maintenance: C,
        registers: R,
        layout: MemoryLayout,
    ) -> Result<Self, BootError> {
        let tree = MappingTree::new(mem, &mut alloc, layout)?;
        Ok(Self::with_tree(tree, alloc, maintenance, registers))
    }

    /// Continues from directories that already exist, e.g. ones linked into
    /// the kernel image.
    #[must_use]
    pub const fn with_tree(
        tree: MappingTree<M>,
        alloc: BootAllocator,
        maintenance: C,
        registers: R,
    ) -> Self {
        Self {
            tree,
            alloc,
            maintenance,
            registers,
            stage: BootStage::Uninitialized,
            cache_policy: None,
            zero_page: None,
            regions: StaticRegionRegistry::new(),
        }
    }

    /// Switches Normal memory and table walks to the policy named `name`.
    ///
    /// # Errors
    /// - [`CachePolicyError::Unknown`] if no policy matches.
    /// - [`CachePolicyError::TooLate`] once memory has been mapped.
    /// - [`CachePolicyError::AlreadySelected`] on a second call.
    pub fn select_cache_policy(&mut self, name: &str) -> Result<&'static CachePolicy, BootError> {
        if self.stage != BootStage::Uninitialized {
            return Err(CachePolicyError::TooLate.into());
        }
        if self.cache_policy.is_some() {
            return Err(CachePolicyError::AlreadySelected.into());
        }

        let Some(policy) = CachePolicy::lookup(name) else {
            log::error!("unknown or unsupported cache policy: {name}");
            return Err(CachePolicyError::Unknown.into());
        };

        policy
            .apply(&mut self.registers, &mut self.maintenance)
            .map_err(CachePolicyError::from)?;
        self.cache_policy = Some(policy);
        log::info!("cache policy: {}", policy.name);
        Ok(policy)
    }

    /// Honors the early parameters this crate understands. Unknown cache
    /// policies are logged and ignored.
    ///
    /// # Errors
    /// As [`KernelMmu::select_cache_policy`], except for unknown names.
    pub fn apply_boot_params(&mut self, params: &BootParams<'_>) -> Result<(), BootError> {
        let Some(name) = params.cache_policy() else {
            return Ok(());
        };

        match self.select_cache_policy(name) {
            Ok(_) | Err(BootError::CachePolicy(CachePolicyError::Unknown)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Maps every RAM bank into the linear map.
    ///
    /// While this runs, the early allocator is limited to the first 1 GiB
    /// of RAM, which the initial kernel mapping covers, and further to the
    /// 2 MiB-aligned end of the first bank if that ends sooner. The start
    /// of a bank below the limit is rounded up to 2 MiB so that no leaf
    /// table is needed from memory that is not yet mapped.
    ///
    /// # Errors
    /// - [`BootError::OutOfOrder`] unless called first.
    /// - [`BootError::Fatal`] if a table cannot be allocated.
    pub fn map_memory(&mut self) -> Result<(), BootError> {
        self.expect_stage("map_memory", BootStage::Uninitialized)?;

        let layout = *self.tree.layout();
        let mut limit = layout.early_alloc_limit().as_u64();
        self.alloc.set_limit(AllocLimit::Bounded(PhysicalAddress::new(limit)));

        let banks: MemoryMap = self.alloc.memory().clone();
        for bank in banks.regions() {
            let mut start = bank.base;
            let end = bank.end();

            if start.as_u64() < limit {
                start = start.align_up_to(PMD_SIZE);
            }
            if end.as_u64() < limit {
                limit = end.as_u64() & PMD_MASK;
                self.alloc.set_limit(AllocLimit::Bounded(PhysicalAddress::new(limit)));
            }
            if start >= end {
                log::debug!("bank {bank:?} too small to map");
                continue;
            }

            let virt = layout.phys_to_virt(start);
            let length = end.wrapping_distance(start);
            let request = MappingDescriptor::new(start, virt, length, MemoryPolicy::Normal);
            if tolerate_rejection(self.map_kernel(&request))? {
                log::info!("mapped memory {start}..{end} at {virt}");
            }
        }

        self.alloc.set_limit(AllocLimit::Anywhere);
        self.advance(BootStage::MemoryMapped);
        Ok(())
    }

    /// Makes the new tables visible, allocates the zero page and points
    /// `TTBR0_EL1` at it so nothing is fetched speculatively through the
    /// lower half.
    ///
    /// # Errors
    /// - [`BootError::OutOfOrder`] unless memory was just mapped.
    /// - [`BootError::Fatal`] on allocation or maintenance failure.
    pub fn prepare_zero_page(&mut self) -> Result<PhysicalAddress, BootError> {
        self.expect_stage("prepare_zero_page", BootStage::MemoryMapped)?;

        self.maintenance.flush_cache_all()?;
        self.maintenance.flush_tlb_all()?;

        let zero = self
            .alloc
            .alloc(PAGE_SIZE, PAGE_SIZE)
            .map_err(FatalError::from)?;
        self.tree
            .mapper_mut()
            .table_mut(TablePage::containing(zero))
            .zero();
        self.zero_page = Some(zero);

        self.registers.set_ttbr0(Ttbr::from_table(zero));
        self.registers.isb();
        self.maintenance.flush_tlb_all()?;

        self.advance(BootStage::ZeroPageReady);
        Ok(zero)
    }

    /// [`KernelMmu::map_memory`] followed by
    /// [`KernelMmu::prepare_zero_page`].
    ///
    /// # Errors
    /// As the two steps.
    pub fn paging_init(&mut self) -> Result<PhysicalAddress, BootError> {
        self.map_memory()?;
        self.prepare_zero_page()
    }

    /// Maps `request` into the kernel directory.
    ///
    /// # Errors
    /// See [`MappingTree::map_kernel`].
    pub fn map_kernel(&mut self, request: &MappingDescriptor) -> Result<(), MapError> {
        self.tree
            .map_kernel(&mut self.alloc, &mut self.maintenance, request)
    }

    /// Maps `[phys, phys + size)` one-to-one into the identity directory.
    ///
    /// # Errors
    /// See [`MappingTree::map_identity`].
    pub fn map_identity(
        &mut self,
        phys: PhysicalAddress,
        size: u64,
        as_device: bool,
    ) -> Result<(), MapError> {
        self.tree
            .map_identity(&mut self.alloc, &mut self.maintenance, phys, size, as_device)
    }

    /// Maps and records each of `descs`. Executable regions are mapped as
    /// Normal memory, all others with the non-cacheable I/O profile.
    ///
    /// A descriptor whose mapping is rejected is still recorded, reserving
    /// its virtual range.
    ///
    /// # Errors
    /// - [`BootError::OutOfOrder`] before the zero page exists.
    /// - [`BootError::Fatal`] if a mapping could not be completed.
    pub fn register_regions(
        &mut self,
        descs: &[MapDesc],
        executable: bool,
    ) -> Result<(), BootError> {
        let (caller, policy) = if executable {
            (RegionCaller::IoTableExec, MemoryPolicy::Normal)
        } else {
            (RegionCaller::IoTable, MemoryPolicy::DeviceCacheable)
        };

        if self.stage < BootStage::ZeroPageReady {
            return Err(BootError::OutOfOrder {
                operation: caller.as_str(),
                required: BootStage::ZeroPageReady,
                current: self.stage,
            });
        }
        if descs.is_empty() {
            return Ok(());
        }

        for desc in descs {
            let request =
                MappingDescriptor::new(desc.pfn.address(), desc.virt, desc.length, policy);
            let mapped = tolerate_rejection(self.map_kernel(&request))?;
            let region = StaticRegion::new(desc, caller, mapped);
            log::debug!(
                "{}: {}..{} -> {}",
                caller.as_str(),
                region.virt,
                region.end(),
                region.phys
            );
            self.regions.insert(region);
        }

        self.advance(BootStage::RegionsRegistered);
        Ok(())
    }

    /// Registers non-executable device windows.
    ///
    /// # Errors
    /// See [`KernelMmu::register_regions`].
    pub fn iotable_init(&mut self, descs: &[MapDesc]) -> Result<(), BootError> {
        self.register_regions(descs, false)
    }

    /// Registers executable memory windows.
    ///
    /// # Errors
    /// See [`KernelMmu::register_regions`].
    pub fn iotable_init_exec(&mut self, descs: &[MapDesc]) -> Result<(), BootError> {
        self.register_regions(descs, true)
    }

    /// Backs `[start, end)` with 2 MiB sections of fresh memory.
    ///
    /// # Errors
    /// [`BootError::Fatal`] when memory runs out.
    pub fn populate_vmemmap(
        &mut self,
        start: VirtualAddress,
        end: VirtualAddress,
    ) -> Result<(), BootError> {
        self.tree
            .populate_vmemmap(&mut self.alloc, &mut self.maintenance, start, end)?;
        Ok(())
    }

    /// Switches `TTBR0_EL1` to the identity directory, so the MMU can be
    /// turned off from code running at its physical address.
    ///
    /// # Errors
    /// [`BootError::Fatal`] if the TLB cannot be invalidated.
    pub fn setup_mm_for_reboot(&mut self) -> Result<(), BootError> {
        let identity = self.tree.identity_root().base();
        self.registers.set_ttbr0(Ttbr::from_table(identity));
        self.registers.isb();
        self.maintenance.flush_tlb_all()?;
        log::info!("TTBR0 switched to identity directory at {identity}");
        Ok(())
    }

    /// Whether `va` is a kernel address backed by RAM.
    #[must_use]
    pub fn address_is_mapped(&self, va: VirtualAddress) -> bool {
        if !va.is_upper_half(self.tree.layout().va_bits) {
            return false;
        }

        self.tree.translate(va).is_some_and(|t| {
            self.alloc
                .memory()
                .contains_frame(t.attributes.output_address().frame_number())
        })
    }

    fn expect_stage(&self, operation: &'static str, required: BootStage) -> Result<(), BootError> {
        if self.stage == required {
            Ok(())
        } else {
            Err(BootError::OutOfOrder {
                operation,
                required,
                current: self.stage,
            })
        }
    }

    fn advance(&mut self, stage: BootStage) {
        if stage > self.stage {
            log::info!("boot stage: {} -> {}", self.stage, stage);
            self.stage = stage;
        }
    }

    #[must_use]
    pub const fn stage(&self) -> BootStage {
        self.stage
    }

    #[must_use]
    pub const fn cache_policy(&self) -> Option<&'static CachePolicy> {
        self.cache_policy
    }

    #[must_use]
    pub const fn zero_page(&self) -> Option<PhysicalAddress> {
        self.zero_page
    }

    #[must_use]
    pub const fn regions(&self) -> &StaticRegionRegistry {
        &self.regions
    }

    #[must_use]
    pub const fn tree(&self) -> &MappingTree<M> {
        &self.tree
    }

    #[must_use]
    pub const fn allocator(&self) -> &BootAllocator {
        &self.alloc
    }

    pub const fn allocator_mut(&mut self) -> &mut BootAllocator {
        &mut self.alloc
    }

    #[must_use]
    pub const fn maintenance(&self) -> &C {
        &self.maintenance
    }

    #[must_use]
    pub const fn registers(&self) -> &R {
        &self.registers
    }
}

/// `Ok(true)` if mapped, `Ok(false)` if the request was rejected (already
/// logged), `Err` if the failure is fatal.
fn tolerate_rejection(result: Result<(), MapError>) -> Result<bool, FatalError> {
    match result {
        Ok(()) => Ok(true),
        Err(MapError::Fatal(e)) => Err(e),
        Err(MapError::OutsideKernelRange { .. } | MapError::IdentityOutOfRange { .. }) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_alloc::MemoryRegion;
    use kernel_registers::{RecordingMaintenance, SoftwareRegisters};
    use kernel_vmem::emulated::EmulatedPhysMemory;

    type TestMmu = KernelMmu<EmulatedPhysMemory, RecordingMaintenance, SoftwareRegisters>;

    fn mmu() -> TestMmu {
        let alloc = BootAllocator::new(
            [MemoryRegion::new(PhysicalAddress::new(0x8000_0000), 0x4000_0000)]
                .into_iter()
                .collect(),
        );
        KernelMmu::new(
            EmulatedPhysMemory::new(),
            alloc,
            RecordingMaintenance::new(),
            SoftwareRegisters::default(),
            MemoryLayout::DEFAULT,
        )
        .unwrap()
    }

    #[test]
    fn stages_must_run_in_order() {
        let mut mmu = mmu();
        assert!(matches!(
            mmu.prepare_zero_page(),
            Err(BootError::OutOfOrder {
                required: BootStage::MemoryMapped,
                current: BootStage::Uninitialized,
                ..
            })
        ));
        assert!(matches!(mmu.iotable_init(&[]), Err(BootError::OutOfOrder { .. })));

        mmu.map_memory().unwrap();
        assert!(matches!(mmu.map_memory(), Err(BootError::OutOfOrder { .. })));
        assert_eq!(mmu.stage(), BootStage::MemoryMapped);
    }

    #[test]
    fn cache_policy_only_before_mapping() {
        let mut mmu = mmu();
        mmu.select_cache_policy("writethrough").unwrap();
        assert_eq!(
            mmu.select_cache_policy("writeback"),
            Err(BootError::CachePolicy(CachePolicyError::AlreadySelected))
        );

        let mut late = self::mmu();
        late.map_memory().unwrap();
        assert_eq!(
            late.select_cache_policy("writeback"),
            Err(BootError::CachePolicy(CachePolicyError::TooLate))
        );
    }

    #[test]
    fn rejections_are_tolerated() {
        let rejected = MapError::IdentityOutOfRange {
            phys: PhysicalAddress::new(1 << 48),
        };
        assert_eq!(tolerate_rejection(Err(rejected)), Ok(false));
        assert_eq!(tolerate_rejection(Ok(())), Ok(true));
        assert!(tolerate_rejection(Err(MapError::Fatal(FatalError::BadEntry {
            level: kernel_vmem::Level::Top,
            index: kernel_vmem::TableIndex::new(0),
            raw: 1,
        })))
        .is_err());
    }
}
