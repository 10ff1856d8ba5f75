//! # Translation Table Descriptors
//!
//! Every directory entry is a 64-bit descriptor whose two low bits select its
//! meaning, which further depends on the level it is found at:
//!
//! | bits\[1:0\] | L0        | L1 / L2   | L3        |
//! |-------------|-----------|-----------|-----------|
//! | `x0`        | invalid   | invalid   | invalid   |
//! | `01`        | reserved  | **block** | reserved  |
//! | `11`        | **table** | **table** | **page**  |
//!
//! Blocks and pages share one attribute layout ([`LeafDescriptor`]); table
//! descriptors carry hierarchical overrides instead ([`TableDescriptor`]).

use crate::attributes::{AccessPermissions, Shareability};
use crate::level::Level;
use crate::table::TablePage;
use bitfield_struct::bitfield;
use core::fmt;
use kernel_memory_addresses::PhysicalAddress;
use kernel_registers::MemoryType;

/// L0–L2 descriptor pointing at the next-level directory.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct TableDescriptor {
    /// Bit 0 — valid.
    pub valid: bool,

    /// Bit 1 — must be 1 for a table descriptor.
    pub table: bool,

    /// Bits 2–11 — ignored.
    #[bits(10)]
    __ignored_2_11: u16,

    /// Bits 12–47 — next-level table physical base >> 12.
    #[bits(36)]
    next_table_4k: u64,

    /// Bits 48–51 — reserved (res0).
    #[bits(4)]
    __res0_48_51: u8,

    /// Bits 52–58 — ignored.
    #[bits(7)]
    __ignored_52_58: u8,

    /// Bit 59 — `PXNTable`: no privileged execution below this entry.
    pub pxn_table: bool,

    /// Bit 60 — `XNTable` (`UXNTable` at EL1&0).
    pub xn_table: bool,

    /// Bits 61–62 — `APTable`: access permission limits below this entry.
    #[bits(2)]
    pub ap_table: u8,

    /// Bit 63 — `NSTable`.
    pub ns_table: bool,
}

impl TableDescriptor {
    /// A table descriptor pointing at `next`.
    #[inline]
    #[must_use]
    pub const fn pointing_to(next: TablePage) -> Self {
        Self::new()
            .with_valid(true)
            .with_table(true)
            .with_next_table_4k(next.base().as_u64() >> 12)
    }

    /// The physical page of the next-level table.
    #[inline]
    #[must_use]
    pub const fn next_table(self) -> TablePage {
        TablePage::containing(PhysicalAddress::new(self.next_table_4k() << 12))
    }
}

/// Block (L1/L2) or page (L3) descriptor.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct LeafDescriptor {
    /// Bit 0 — valid.
    pub valid: bool,

    /// Bit 1 — 0 for a block, 1 for a page.
    pub page: bool,

    /// Bits 2–4 — `AttrIndx`, the `MAIR_EL1` byte describing the memory type.
    #[bits(3)]
    pub attr_index: MemoryType,

    /// Bit 5 — `NS`.
    pub non_secure: bool,

    /// Bits 6–7 — `AP[2:1]`.
    #[bits(2)]
    pub access: AccessPermissions,

    /// Bits 8–9 — `SH`.
    #[bits(2)]
    pub shareability: Shareability,

    /// Bit 10 — `AF`, access flag. Accesses fault while clear.
    pub access_flag: bool,

    /// Bit 11 — `nG`, not global.
    pub not_global: bool,

    /// Bits 12–47 — output address >> 12.
    #[bits(36)]
    output_4k: u64,

    /// Bits 48–51 — reserved (res0).
    #[bits(4)]
    __res0_48_51: u8,

    /// Bit 52 — contiguous hint.
    pub contiguous: bool,

    /// Bit 53 — `PXN`, privileged execute never.
    pub pxn: bool,

    /// Bit 54 — `UXN`, unprivileged execute never.
    pub uxn: bool,

    /// Bit 55 — software: dirty.
    pub dirty: bool,

    /// Bit 56 — software: special mapping.
    pub special: bool,

    /// Bits 57–58 — software: unused.
    #[bits(2)]
    __sw_57_58: u8,

    /// Bits 59–63 — ignored.
    #[bits(5)]
    __ignored_59_63: u8,
}

impl LeafDescriptor {
    /// These attributes, mapping `phys`.
    #[inline]
    #[must_use]
    pub const fn mapping(self, phys: PhysicalAddress) -> Self {
        self.with_output_4k(phys.as_u64() >> 12)
    }

    #[inline]
    #[must_use]
    pub const fn output_address(self) -> PhysicalAddress {
        PhysicalAddress::new(self.output_4k() << 12)
    }

    /// The same attributes re-encoded for `level` (page at L3, block otherwise).
    #[inline]
    #[must_use]
    pub const fn for_level(self, level: Level) -> Self {
        self.with_page(matches!(level, Level::Leaf))
    }

    /// Whether the memory can be executed at EL1.
    #[inline]
    #[must_use]
    pub const fn is_kernel_executable(self) -> bool {
        !self.pxn()
    }
}

/// A raw directory entry.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Descriptor(u64);

/// A [`Descriptor`] decoded for the level it was found at.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DescriptorKind {
    Empty,
    Table(TableDescriptor),
    Block(LeafDescriptor),
    Page(LeafDescriptor),
    /// `0b01` at L0 or L3: an encoding the hierarchy never produces.
    Reserved,
}

impl Descriptor {
    pub const EMPTY: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u64 {
        self.0
    }

    /// Invalid entries are treated as empty regardless of their upper bits.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 & 0b1 == 0
    }

    #[must_use]
    pub const fn kind(self, level: Level) -> DescriptorKind {
        match (self.0 & 0b11, level) {
            (0b00 | 0b10, _) => DescriptorKind::Empty,
            (0b11, Level::Leaf) => DescriptorKind::Page(LeafDescriptor::from_bits(self.0)),
            (0b11, _) => DescriptorKind::Table(TableDescriptor::from_bits(self.0)),
            (_, Level::Upper | Level::Mid) => {
                DescriptorKind::Block(LeafDescriptor::from_bits(self.0))
            }
            (_, Level::Top | Level::Leaf) => DescriptorKind::Reserved,
        }
    }
}

impl From<TableDescriptor> for Descriptor {
    fn from(value: TableDescriptor) -> Self {
        Self(value.into_bits())
    }
}

impl From<LeafDescriptor> for Descriptor {
    fn from(value: LeafDescriptor) -> Self {
        Self(value.into_bits())
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor(0x{:016X})", self.0)
    }
}
