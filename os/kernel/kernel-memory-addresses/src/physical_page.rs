use crate::{FrameNumber, PageSize, PhysicalAddress, Size4K};
use core::fmt;
use core::marker::PhantomData;

/// The base of a physical page of size `S`.
///
/// Directory tables are identified by the [`PhysicalPage<Size4K>`] that holds
/// them; the page is the handle, never a pointer.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage<S: PageSize> {
    base: u64,
    _size: PhantomData<S>,
}

impl<S: PageSize> PhysicalPage<S> {
    /// The page containing `addr`.
    #[inline]
    #[must_use]
    pub const fn containing(addr: PhysicalAddress) -> Self {
        Self {
            base: addr.as_u64() & S::MASK,
            _size: PhantomData,
        }
    }

    /// Interprets an aligned address as a page base.
    ///
    /// Returns `None` if `addr` is not aligned to `S`.
    #[inline]
    #[must_use]
    pub const fn from_base(addr: PhysicalAddress) -> Option<Self> {
        if addr.as_u64() & !S::MASK == 0 {
            Some(Self::containing(addr))
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.base)
    }

    /// Joins this page with an in-page offset.
    #[inline]
    #[must_use]
    pub const fn join(self, offset: u64) -> PhysicalAddress {
        debug_assert!(offset < S::SIZE);
        PhysicalAddress::new(self.base | offset)
    }
}

impl PhysicalPage<Size4K> {
    #[inline]
    #[must_use]
    pub const fn from_frame(frame: FrameNumber) -> Self {
        Self {
            base: frame.as_u64() << Size4K::SHIFT,
            _size: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn frame_number(self) -> FrameNumber {
        FrameNumber::new(self.base >> Size4K::SHIFT)
    }
}

impl<S: PageSize> fmt::Debug for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalPage<{}>(0x{:016X})", S::as_str(), self.base)
    }
}

impl<S: PageSize> fmt::Display for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size2M;

    #[test]
    fn from_base_requires_alignment() {
        assert!(PhysicalPage::<Size2M>::from_base(PhysicalAddress::new(0x4020_0000)).is_some());
        assert!(PhysicalPage::<Size2M>::from_base(PhysicalAddress::new(0x4020_1000)).is_none());
    }

    #[test]
    fn frame_round_trip() {
        let page = PhysicalPage::<Size4K>::containing(PhysicalAddress::new(0x8000_1234));
        assert_eq!(page.base().as_u64(), 0x8000_1000);
        assert_eq!(PhysicalPage::from_frame(page.frame_number()), page);
        assert_eq!(page.join(0x234).as_u64(), 0x8000_1234);
    }
}
