use crate::memory_address::address_space_type;
use crate::{FrameNumber, MemoryAddress, PageSize, PhysicalPage, Size4K};

/// Physical memory address.
///
/// A thin wrapper around [`MemoryAddress`] that denotes **physical** addresses
/// (RAM or MMIO). Page-table descriptors store the page-aligned physical base
/// of either the next-level table or the mapped output region.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::*;
/// let pa = PhysicalAddress::new(0x0000_0000_8020_0042);
/// assert_eq!(pa.page::<Size4K>().base().as_u64(), 0x8020_0000);
/// assert_eq!(pa.offset_in::<Size4K>(), 0x42);
/// assert_eq!(pa.frame_number().as_u64(), 0x80200);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(pub(crate) MemoryAddress);

address_space_type!(PhysicalAddress, "PA");

impl PhysicalAddress {
    /// The page of size `S` that contains this address.
    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> PhysicalPage<S> {
        PhysicalPage::containing(self)
    }

    /// The 4 KiB frame number of this address.
    #[inline]
    #[must_use]
    pub const fn frame_number(self) -> FrameNumber {
        FrameNumber::new(self.as_u64() >> Size4K::SHIFT)
    }
}

impl<S> From<PhysicalPage<S>> for PhysicalAddress
where
    S: PageSize,
{
    fn from(value: PhysicalPage<S>) -> Self {
        value.base()
    }
}
