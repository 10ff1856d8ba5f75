//! # Mapping Attributes
//!
//! The attribute profiles installed into block and page descriptors, and
//! the [`MemoryPolicy`] that selects between them per mapping request.
//!
//! | Profile | Level | Memory type | Executable at EL1 |
//! |---------|-------|-------------|-------------------|
//! | [`PROT_SECT_NORMAL_EXEC`] | block | Normal | yes |
//! | [`PROT_SECT_NORMAL`] | block | Normal | no |
//! | [`PROT_SECT_NORMAL_NC`] | block | Normal non-cacheable | no |
//! | [`PROT_SECT_DEVICE_NGNRE`] | block | Device-nGnRE | no |
//! | [`PAGE_KERNEL_EXEC`] | page | Normal | yes |
//! | [`PROT_NORMAL_NC`] | page | Normal non-cacheable | no |
//! | [`PROT_DEVICE_NGNRE`] | page | Device-nGnRE | no |
//!
//! No profile is accessible from EL0.

use crate::descriptor::LeafDescriptor;
use kernel_registers::MemoryType;

/// `AP[2:1]` data access permissions.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum AccessPermissions {
    KernelReadWrite = 0b00,
    ReadWrite = 0b01,
    KernelReadOnly = 0b10,
    ReadOnly = 0b11,
}

impl AccessPermissions {
    #[inline]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0b00 => Self::KernelReadWrite,
            0b01 => Self::ReadWrite,
            0b10 => Self::KernelReadOnly,
            _ => Self::ReadOnly,
        }
    }
}

/// `SH[1:0]` shareability.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Shareability {
    NonShareable = 0b00,
    Reserved = 0b01,
    OuterShareable = 0b10,
    InnerShareable = 0b11,
}

impl Shareability {
    #[inline]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0b00 => Self::NonShareable,
            0b01 => Self::Reserved,
            0b10 => Self::OuterShareable,
            _ => Self::InnerShareable,
        }
    }
}

const fn section(ty: MemoryType) -> LeafDescriptor {
    LeafDescriptor::new()
        .with_valid(true)
        .with_access_flag(true)
        .with_shareability(Shareability::InnerShareable)
        .with_attr_index(ty)
}

const fn page(ty: MemoryType) -> LeafDescriptor {
    section(ty).with_page(true)
}

pub const PROT_SECT_NORMAL_EXEC: LeafDescriptor = section(MemoryType::Normal).with_uxn(true);
pub const PROT_SECT_NORMAL: LeafDescriptor =
    section(MemoryType::Normal).with_pxn(true).with_uxn(true);
pub const PROT_SECT_NORMAL_NC: LeafDescriptor = section(MemoryType::NormalNonCacheable)
    .with_pxn(true)
    .with_uxn(true);
pub const PROT_SECT_DEVICE_NGNRE: LeafDescriptor = section(MemoryType::DeviceNGnRE)
    .with_pxn(true)
    .with_uxn(true);

pub const PAGE_KERNEL_EXEC: LeafDescriptor =
    page(MemoryType::Normal).with_uxn(true).with_dirty(true);
pub const PROT_NORMAL_NC: LeafDescriptor =
    page(MemoryType::NormalNonCacheable).with_pxn(true).with_uxn(true);
pub const PROT_DEVICE_NGNRE: LeafDescriptor =
    page(MemoryType::DeviceNGnRE).with_pxn(true).with_uxn(true);

/// How a mapping request wants its memory to behave.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MemoryPolicy {
    /// Cacheable normal memory, executable by the kernel.
    Normal,
    /// Device-nGnRE, never executable. Never mapped with 1 GiB blocks.
    Device,
    /// I/O memory mapped as normal non-cacheable, never executable.
    DeviceCacheable,
}

impl MemoryPolicy {
    /// Attributes of a 1 GiB or 2 MiB block.
    #[must_use]
    pub const fn block_attributes(self) -> LeafDescriptor {
        match self {
            Self::Normal => PROT_SECT_NORMAL_EXEC,
            Self::Device => PROT_SECT_DEVICE_NGNRE,
            Self::DeviceCacheable => PROT_SECT_NORMAL_NC,
        }
    }

    /// Attributes of a 4 KiB page.
    #[must_use]
    pub const fn page_attributes(self) -> LeafDescriptor {
        match self {
            Self::Normal => PAGE_KERNEL_EXEC,
            Self::Device => PROT_DEVICE_NGNRE,
            Self::DeviceCacheable => PROT_NORMAL_NC,
        }
    }

    /// Whether 1 GiB blocks may be installed at the upper level.
    #[must_use]
    pub const fn allows_huge_blocks(self) -> bool {
        !matches!(self, Self::Device)
    }

    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(self, Self::Normal)
    }
}
