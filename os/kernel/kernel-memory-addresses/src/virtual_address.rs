use crate::MemoryAddress;
use crate::memory_address::address_space_type;

/// Virtual memory address.
///
/// Denotes addresses translated through the page tables. The kernel half of
/// the address space has all bits above the configured VA width set, which
/// [`VirtualAddress::is_upper_half`] tests by sign-extension.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(pub(crate) MemoryAddress);

address_space_type!(VirtualAddress, "VA");

impl VirtualAddress {
    /// Returns `true` when every bit from `va_bits` upwards is set.
    ///
    /// ```rust
    /// # use kernel_memory_addresses::VirtualAddress;
    /// assert!(VirtualAddress::new(0xFFFF_8000_0000_0000).is_upper_half(48));
    /// assert!(!VirtualAddress::new(0x0000_8000_0000_0000).is_upper_half(48));
    /// assert!(!VirtualAddress::new(0xFFFE_0000_0000_0000).is_upper_half(48));
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn is_upper_half(self, va_bits: u32) -> bool {
        ((self.as_u64() as i64) >> va_bits) == -1
    }

    /// Index into a 512-entry directory whose entries each span `1 << shift` bytes.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn table_index(self, shift: u32) -> u16 {
        ((self.as_u64() >> shift) & 0x1FF) as u16
    }
}
