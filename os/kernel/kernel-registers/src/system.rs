//! Access to the translation system registers as a value the MMU code can be
//! generic over.

use crate::{Mair, Tcr, Ttbr};

/// The subset of EL1 system registers the page-table code programs.
pub trait SystemRegisters {
    fn mair(&self) -> Mair;
    fn set_mair(&mut self, value: Mair);
    fn tcr(&self) -> Tcr;
    fn set_tcr(&mut self, value: Tcr);
    fn ttbr0(&self) -> Ttbr;
    fn set_ttbr0(&mut self, value: Ttbr);

    /// Instruction synchronization barrier.
    fn isb(&mut self);
}

/// The registers of the executing CPU.
#[cfg(all(feature = "asm", target_arch = "aarch64"))]
#[derive(Debug)]
pub struct Aarch64Registers {
    _private: (),
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl Aarch64Registers {
    /// # Safety
    /// Must only be created at EL1; every setter reprograms live translation
    /// state of the calling CPU.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl SystemRegisters for Aarch64Registers {
    fn mair(&self) -> Mair {
        use crate::LoadRegisterUnsafe;
        unsafe { Mair::load_unsafe() }
    }

    fn set_mair(&mut self, value: Mair) {
        use crate::StoreRegisterUnsafe;
        unsafe { value.store_unsafe() }
    }

    fn tcr(&self) -> Tcr {
        use crate::LoadRegisterUnsafe;
        unsafe { Tcr::load_unsafe() }
    }

    fn set_tcr(&mut self, value: Tcr) {
        use crate::StoreRegisterUnsafe;
        unsafe { value.store_unsafe() }
    }

    fn ttbr0(&self) -> Ttbr {
        let ttbr0: u64;
        unsafe {
            core::arch::asm!("mrs {}, ttbr0_el1", out(reg) ttbr0, options(nomem, nostack, preserves_flags));
        }
        Ttbr::from_bits(ttbr0)
    }

    fn set_ttbr0(&mut self, value: Ttbr) {
        let ttbr0 = value.into_bits();
        unsafe {
            core::arch::asm!("msr ttbr0_el1, {}", "isb", in(reg) ttbr0, options(nostack, preserves_flags));
        }
    }

    fn isb(&mut self) {
        unsafe {
            core::arch::asm!("isb", options(nostack, preserves_flags));
        }
    }
}

/// Register file kept in memory, for hosted builds and tests.
#[cfg(any(test, feature = "software-emulation"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareRegisters {
    pub mair: Mair,
    pub tcr: Tcr,
    pub ttbr0: Ttbr,
    /// Number of barriers issued so far.
    pub barriers: usize,
}

#[cfg(any(test, feature = "software-emulation"))]
impl SoftwareRegisters {
    #[must_use]
    pub const fn new(mair: Mair, tcr: Tcr) -> Self {
        Self {
            mair,
            tcr,
            ttbr0: Ttbr::new(),
            barriers: 0,
        }
    }
}

#[cfg(any(test, feature = "software-emulation"))]
impl Default for SoftwareRegisters {
    fn default() -> Self {
        Self::new(Mair::kernel_default(), Tcr::kernel_default())
    }
}

#[cfg(any(test, feature = "software-emulation"))]
impl SystemRegisters for SoftwareRegisters {
    fn mair(&self) -> Mair {
        self.mair
    }

    fn set_mair(&mut self, value: Mair) {
        self.mair = value;
    }

    fn tcr(&self) -> Tcr {
        self.tcr
    }

    fn set_tcr(&mut self, value: Tcr) {
        self.tcr = value;
    }

    fn ttbr0(&self) -> Ttbr {
        self.ttbr0
    }

    fn set_ttbr0(&mut self, value: Ttbr) {
        self.ttbr0 = value;
    }

    fn isb(&mut self) {
        self.barriers += 1;
    }
}
