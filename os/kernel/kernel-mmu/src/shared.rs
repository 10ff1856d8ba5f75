//! Serialized access to the MMU state once secondary CPUs or drivers can
//! register regions concurrently.

use crate::error::BootError;
use crate::iotable::MapDesc;
use crate::mmu::KernelMmu;
use kernel_memory_addresses::VirtualAddress;
use kernel_registers::{CacheMaintenance, SystemRegisters};
use kernel_vmem::{MapError, MappingDescriptor, PhysMapper};
use spin::Mutex;

/// A [`KernelMmu`] behind one lock covering the registry and every table
/// update, so two callers never race on the same directory slot.
pub struct SharedMmu<M, C, R> {
    inner: Mutex<KernelMmu<M, C, R>>,
}

impl<M, C, R> SharedMmu<M, C, R>
where
    M: PhysMapper,
    C: CacheMaintenance,
    R: SystemRegisters,
{
    #[must_use]
    pub const fn new(mmu: KernelMmu<M, C, R>) -> Self {
        Self {
            inner: Mutex::new(mmu),
        }
    }

    /// Runs `f` with exclusive access.
    pub fn with<T>(&self, f: impl FnOnce(&mut KernelMmu<M, C, R>) -> T) -> T {
        let mut mmu = self.inner.lock();
        f(&mut mmu)
    }

    /// See [`KernelMmu::register_regions`].
    ///
    /// # Errors
    /// See [`KernelMmu::register_regions`].
    pub fn register_regions(&self, descs: &[MapDesc], executable: bool) -> Result<(), BootError> {
        self.with(|mmu| mmu.register_regions(descs, executable))
    }

    /// See [`KernelMmu::iotable_init`].
    ///
    /// # Errors
    /// See [`KernelMmu::register_regions`].
    pub fn iotable_init(&self, descs: &[MapDesc]) -> Result<(), BootError> {
        self.register_regions(descs, false)
    }

    /// See [`KernelMmu::iotable_init_exec`].
    ///
    /// # Errors
    /// See [`KernelMmu::register_regions`].
    pub fn iotable_init_exec(&self, descs: &[MapDesc]) -> Result<(), BootError> {
        self.register_regions(descs, true)
    }

    /// See [`KernelMmu::map_kernel`].
    ///
    /// # Errors
    /// See [`KernelMmu::map_kernel`].
    pub fn map_kernel(&self, request: &MappingDescriptor) -> Result<(), MapError> {
        self.with(|mmu| mmu.map_kernel(request))
    }

    #[must_use]
    pub fn address_is_mapped(&self, va: VirtualAddress) -> bool {
        self.inner.lock().address_is_mapped(va)
    }

    pub fn into_inner(self) -> KernelMmu<M, C, R> {
        self.inner.into_inner()
    }
}
