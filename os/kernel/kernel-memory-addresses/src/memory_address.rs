use crate::PageSize;
use core::fmt;

/// Principal raw memory address ([virtual](super::VirtualAddress) or [physical](super::PhysicalAddress)).
///
/// All arithmetic used by the page-table walkers is wrap-around: the last
/// entry of the top-level directory maps up to `2^64`, so `start + length`
/// legitimately overflows to zero there.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryAddress(u64);

impl MemoryAddress {
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Align down to a power-of-two boundary.
    #[inline]
    #[must_use]
    pub const fn align_down_to(self, align: u64) -> Self {
        debug_assert!(align.is_power_of_two());
        Self(self.0 & !(align - 1))
    }

    /// Align up to a power-of-two boundary, wrapping past the top of the
    /// address space.
    #[inline]
    #[must_use]
    pub const fn align_up_to(self, align: u64) -> Self {
        debug_assert!(align.is_power_of_two());
        Self(self.0.wrapping_add(align - 1) & !(align - 1))
    }

    #[inline]
    #[must_use]
    pub const fn is_aligned_to(self, align: u64) -> bool {
        debug_assert!(align.is_power_of_two());
        self.0 & (align - 1) == 0
    }

    /// Align down to page boundary `S`.
    #[inline]
    #[must_use]
    pub const fn align_down<S: PageSize>(self) -> Self {
        Self(self.0 & S::MASK)
    }

    /// The offset of this address within its page of size `S`.
    #[inline]
    #[must_use]
    pub const fn offset_in<S: PageSize>(self) -> u64 {
        self.0 & !S::MASK
    }

    #[inline]
    #[must_use]
    pub const fn wrapping_add(self, rhs: u64) -> Self {
        Self(self.0.wrapping_add(rhs))
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Distance in bytes from `origin` to `self`, wrapping.
    #[inline]
    #[must_use]
    pub const fn wrapping_distance(self, origin: Self) -> u64 {
        self.0.wrapping_sub(origin.0)
    }
}

impl fmt::Debug for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryAddress(0x{:016X})", self.0)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

impl From<u64> for MemoryAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<MemoryAddress> for u64 {
    #[inline]
    fn from(a: MemoryAddress) -> Self {
        a.as_u64()
    }
}

/// Generates the shared surface of the address-space wrappers.
macro_rules! address_space_type {
    ($name:ident, $tag:literal) => {
        impl $name {
            #[inline]
            #[must_use]
            pub const fn zero() -> Self {
                Self::new(0)
            }

            #[inline]
            #[must_use]
            pub const fn new(v: u64) -> Self {
                Self($crate::MemoryAddress::new(v))
            }

            #[inline]
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0.as_u64()
            }

            #[inline]
            #[must_use]
            pub const fn align_down_to(self, align: u64) -> Self {
                Self(self.0.align_down_to(align))
            }

            #[inline]
            #[must_use]
            pub const fn align_up_to(self, align: u64) -> Self {
                Self(self.0.align_up_to(align))
            }

            #[inline]
            #[must_use]
            pub const fn is_aligned_to(self, align: u64) -> bool {
                self.0.is_aligned_to(align)
            }

            #[inline]
            #[must_use]
            pub const fn align_down<S: $crate::PageSize>(self) -> Self {
                Self(self.0.align_down::<S>())
            }

            #[inline]
            #[must_use]
            pub const fn offset_in<S: $crate::PageSize>(self) -> u64 {
                self.0.offset_in::<S>()
            }

            #[inline]
            #[must_use]
            pub const fn wrapping_add(self, rhs: u64) -> Self {
                Self(self.0.wrapping_add(rhs))
            }

            #[inline]
            #[must_use]
            pub const fn checked_add(self, rhs: u64) -> Option<Self> {
                match self.0.checked_add(rhs) {
                    Some(v) => Some(Self(v)),
                    None => None,
                }
            }

            #[inline]
            #[must_use]
            pub const fn wrapping_distance(self, origin: Self) -> u64 {
                self.0.wrapping_distance(origin.0)
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($tag, "(0x{:016X})"), self.as_u64())
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "0x{:016X}", self.as_u64())
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(v: u64) -> Self {
                Self::new(v)
            }
        }

        impl From<$name> for u64 {
            #[inline]
            fn from(v: $name) -> Self {
                v.as_u64()
            }
        }

        impl core::ops::Add<u64> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: u64) -> Self::Output {
                self.wrapping_add(rhs)
            }
        }

        impl core::ops::AddAssign<u64> for $name {
            #[inline]
            fn add_assign(&mut self, rhs: u64) {
                *self = self.wrapping_add(rhs);
            }
        }
    };
}

pub(crate) use address_space_type;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Size2M, Size4K};

    #[test]
    fn alignment_helpers() {
        let a = MemoryAddress::new(0x1234_5678);
        assert_eq!(a.align_down::<Size4K>().as_u64(), 0x1234_5000);
        assert_eq!(a.offset_in::<Size4K>(), 0x678);
        assert_eq!(a.align_up_to(0x1000).as_u64(), 0x1234_6000);
        assert!(a.align_down::<Size2M>().is_aligned_to(Size2M::SIZE));
    }

    #[test]
    fn align_up_wraps_at_the_top() {
        let a = MemoryAddress::new(u64::MAX - 5);
        assert_eq!(a.align_up_to(0x1000).as_u64(), 0);
        assert_eq!(a.checked_add(10), None);
        assert_eq!(a.wrapping_add(6).as_u64(), 0);
    }
}
