use kernel_memory_addresses::PhysicalAddress;

/// Early allocation failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AllocError {
    #[error("early memory exhausted allocating {size:#x} bytes aligned to {align:#x}")]
    Exhausted { size: u64, align: u64 },
    #[error("alignment {0:#x} is not a power of two")]
    BadAlignment(u64),
}

/// Source of physical memory for directory tables and other early
/// structures.
///
/// Returned memory is naturally aligned to `align` and never handed out
/// twice. The page-table code zeroes table pages itself.
pub trait FrameAlloc {
    fn alloc(&mut self, size: u64, align: u64) -> Result<PhysicalAddress, AllocError>;

    /// Returns memory obtained from [`FrameAlloc::alloc`]. Called only after
    /// every translation that could reach it has been invalidated.
    fn free(&mut self, base: PhysicalAddress, size: u64);
}

impl<T> FrameAlloc for &mut T
where
    T: FrameAlloc + ?Sized,
{
    fn alloc(&mut self, size: u64, align: u64) -> Result<PhysicalAddress, AllocError> {
        (**self).alloc(size, align)
    }

    fn free(&mut self, base: PhysicalAddress, size: u64) {
        (**self).free(base, size);
    }
}
