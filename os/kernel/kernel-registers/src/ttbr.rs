use bitfield_struct::bitfield;
use kernel_memory_addresses::PhysicalAddress;

/// `TTBR0_EL1` / `TTBR1_EL1` — Translation Table Base Register.
///
/// Holds the physical base of the top-level directory for one half of the
/// address space and the ASID of the current context.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Ttbr {
    /// Bit 0 — CnP: common not private.
    pub cnp: bool,

    /// Bits 1–47 — table base address bits `[47:1]`.
    ///
    /// With the 4 KiB granule the top-level table is 4 KiB aligned, so bits
    /// `[11:1]` are zero.
    #[bits(47)]
    baddr: u64,

    /// Bits 48–63 — address space identifier.
    #[bits(16)]
    pub asid: u16,
}

impl Ttbr {
    /// Create a `Ttbr` value pointing at a top-level directory.
    ///
    /// `table` must be 4 KiB-aligned.
    #[must_use]
    pub const fn from_table(table: PhysicalAddress) -> Self {
        debug_assert!(table.as_u64() & 0xFFF == 0, "table base must be 4K-aligned");
        Self::new().with_baddr(table.as_u64() >> 1)
    }

    /// The physical address of the top-level directory.
    #[must_use]
    pub const fn table(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.baddr() << 1)
    }
}
