#[cfg(all(feature = "asm", target_arch = "aarch64"))]
use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};
use bitfield_struct::bitfield;

/// Attribute index (`AttrIndx`) of a descriptor, selecting one byte of
/// `MAIR_EL1`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum MemoryType {
    DeviceNGnRnE = 0,
    DeviceNGnRE = 1,
    DeviceGRE = 2,
    NormalNonCacheable = 3,
    Normal = 4,
}

impl MemoryType {
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    /// Unassigned indices decode as [`MemoryType::Normal`].
    #[inline]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b111 {
            0 => Self::DeviceNGnRnE,
            1 => Self::DeviceNGnRE,
            2 => Self::DeviceGRE,
            3 => Self::NormalNonCacheable,
            _ => Self::Normal,
        }
    }
}

/// `MAIR_EL1` — Memory Attribute Indirection Register.
///
/// Eight attribute bytes; descriptors refer to them by [`MemoryType`].
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Mair {
    pub attr0: u8,
    pub attr1: u8,
    pub attr2: u8,
    pub attr3: u8,
    pub attr4: u8,
    pub attr5: u8,
    pub attr6: u8,
    pub attr7: u8,
}

impl Mair {
    /// Device-nGnRnE.
    pub const DEVICE_NGNRNE: u8 = 0x00;
    /// Device-nGnRE.
    pub const DEVICE_NGNRE: u8 = 0x04;
    /// Device-GRE.
    pub const DEVICE_GRE: u8 = 0x0c;
    /// Normal, inner/outer non-cacheable.
    pub const NORMAL_NC: u8 = 0x44;
    /// Normal, inner/outer write-through non-transient.
    pub const NORMAL_WT: u8 = 0xaa;
    /// Normal, inner/outer write-back non-transient, no write-allocate.
    pub const NORMAL_WB: u8 = 0xee;
    /// Normal, inner/outer write-back read/write-allocate.
    pub const NORMAL: u8 = 0xff;

    /// The attribute layout the kernel boots with.
    #[must_use]
    pub const fn kernel_default() -> Self {
        Self::new()
            .with_attr(MemoryType::DeviceNGnRnE, Self::DEVICE_NGNRNE)
            .with_attr(MemoryType::DeviceNGnRE, Self::DEVICE_NGNRE)
            .with_attr(MemoryType::DeviceGRE, Self::DEVICE_GRE)
            .with_attr(MemoryType::NormalNonCacheable, Self::NORMAL_NC)
            .with_attr(MemoryType::Normal, Self::NORMAL)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn attr(self, ty: MemoryType) -> u8 {
        (self.into_bits() >> (ty.index() * 8)) as u8
    }

    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn with_attr(self, ty: MemoryType, value: u8) -> Self {
        let shift = ty.index() * 8;
        let bits = (self.into_bits() & !(0xff << shift)) | ((value as u64) << shift);
        Self::from_bits(bits)
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl LoadRegisterUnsafe for Mair {
    unsafe fn load_unsafe() -> Self {
        let mair: u64;
        unsafe {
            core::arch::asm!("mrs {}, mair_el1", out(reg) mair, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(mair)
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl StoreRegisterUnsafe for Mair {
    unsafe fn store_unsafe(self) {
        let mair = self.into_bits();
        unsafe {
            core::arch::asm!("msr mair_el1, {}", in(reg) mair, options(nostack, preserves_flags));
        }
    }
}
