#[cfg(all(feature = "asm", target_arch = "aarch64"))]
use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};
use bitfield_struct::bitfield;

/// Cacheability of translation table walks (`IRGNn` / `ORGNn`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum WalkCacheability {
    NonCacheable = 0,
    WriteBackWriteAllocate = 1,
    WriteThrough = 2,
    WriteBackNoWriteAllocate = 3,
}

impl WalkCacheability {
    #[inline]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_bits(v: u8) -> Self {
        match v & 0b11 {
            0 => Self::NonCacheable,
            1 => Self::WriteBackWriteAllocate,
            2 => Self::WriteThrough,
            _ => Self::WriteBackNoWriteAllocate,
        }
    }
}

/// `TCR_EL1` — Translation Control Register.
///
/// Only the fields the kernel touches are named; the remainder is kept as
/// read from the hardware.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Tcr {
    /// Bits 0–5 — size offset of the TTBR0 region (`64 - VA_BITS`).
    #[bits(6)]
    pub t0sz: u8,
    #[bits(1)]
    __res6: u8,
    /// Bit 7 — disable TTBR0 walks.
    pub epd0: bool,
    /// Bits 8–9 — inner cacheability of TTBR0 walks.
    #[bits(2)]
    pub irgn0: WalkCacheability,
    /// Bits 10–11 — outer cacheability of TTBR0 walks.
    #[bits(2)]
    pub orgn0: WalkCacheability,
    /// Bits 12–13 — shareability of TTBR0 walks.
    #[bits(2)]
    pub sh0: u8,
    /// Bits 14–15 — TTBR0 granule (`0b00` = 4 KiB).
    #[bits(2)]
    pub tg0: u8,
    /// Bits 16–21 — size offset of the TTBR1 region.
    #[bits(6)]
    pub t1sz: u8,
    /// Bit 22 — ASID select.
    pub a1: bool,
    /// Bit 23 — disable TTBR1 walks.
    pub epd1: bool,
    /// Bits 24–25 — inner cacheability of TTBR1 walks.
    #[bits(2)]
    pub irgn1: WalkCacheability,
    /// Bits 26–27 — outer cacheability of TTBR1 walks.
    #[bits(2)]
    pub orgn1: WalkCacheability,
    #[bits(2)]
    pub sh1: u8,
    /// Bits 30–31 — TTBR1 granule (`0b10` = 4 KiB).
    #[bits(2)]
    pub tg1: u8,
    /// Bits 32–34 — intermediate physical address size.
    #[bits(3)]
    pub ips: u8,
    #[bits(1)]
    __res35: u8,
    /// Bit 36 — 16-bit ASIDs.
    pub as16: bool,
    pub tbi0: bool,
    pub tbi1: bool,
    #[bits(25)]
    __res39: u32,
}

impl Tcr {
    /// `IRGN0 | IRGN1`.
    pub const IRGN_MASK: u64 = (0b11 << 8) | (0b11 << 24);
    /// `ORGN0 | ORGN1`.
    pub const ORGN_MASK: u64 = (0b11 << 10) | (0b11 << 26);

    /// 48-bit split address space, 4 KiB granule, inner-shareable
    /// write-back walks.
    #[must_use]
    pub const fn kernel_default() -> Self {
        Self::new()
            .with_t0sz(16)
            .with_t1sz(16)
            .with_tg0(0b00)
            .with_tg1(0b10)
            .with_sh0(0b11)
            .with_sh1(0b11)
            .with_ips(0b101)
            .with_walk_cacheability(WalkCacheability::WriteBackWriteAllocate)
    }

    /// Sets the inner and outer walk cacheability of both halves.
    #[must_use]
    pub const fn with_walk_cacheability(self, policy: WalkCacheability) -> Self {
        self.with_irgn0(policy)
            .with_orgn0(policy)
            .with_irgn1(policy)
            .with_orgn1(policy)
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl LoadRegisterUnsafe for Tcr {
    unsafe fn load_unsafe() -> Self {
        let tcr: u64;
        unsafe {
            core::arch::asm!("mrs {}, tcr_el1", out(reg) tcr, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(tcr)
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl StoreRegisterUnsafe for Tcr {
    unsafe fn store_unsafe(self) {
        let tcr = self.into_bits();
        unsafe {
            core::arch::asm!("msr tcr_el1, {}", in(reg) tcr, options(nostack, preserves_flags));
        }
    }
}
