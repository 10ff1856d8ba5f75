//! # Typed `AArch64` Translation Registers
//!
//! Bitfield views of the EL1 registers that control stage 1 translation,
//! and the maintenance operations that keep caches and TLBs coherent with
//! page-table updates.
//!
//! | Type | Register |
//! |------|----------|
//! | [`Mair`] | `MAIR_EL1`, memory attribute encodings indexed by [`MemoryType`] |
//! | [`Tcr`] | `TCR_EL1`, region sizes, granules and walk cacheability |
//! | [`Ttbr`] | `TTBR0_EL1` / `TTBR1_EL1`, top-level directory base |
//!
//! Register access is abstracted by [`SystemRegisters`], maintenance by
//! [`CacheMaintenance`]. The `asm` feature provides the hardware
//! implementations on `aarch64`; the `software-emulation` feature provides
//! in-memory ones for hosted builds.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(any(test, feature = "software-emulation"))]
extern crate alloc;

mod mair;
mod maintenance;
mod system;
mod tcr;
mod ttbr;

pub use mair::{Mair, MemoryType};
pub use maintenance::{CacheMaintenance, MaintenanceError};
pub use system::SystemRegisters;
pub use tcr::{Tcr, WalkCacheability};
pub use ttbr::Ttbr;

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
pub use maintenance::Aarch64Maintenance;
#[cfg(all(feature = "asm", target_arch = "aarch64"))]
pub use system::Aarch64Registers;

#[cfg(any(test, feature = "software-emulation"))]
pub use maintenance::{MaintenanceEvent, RecordingMaintenance};
#[cfg(any(test, feature = "software-emulation"))]
pub use system::SoftwareRegisters;

pub trait LoadRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require EL1.
    unsafe fn load_unsafe() -> Self;
}

pub trait StoreRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// Writing a translation register changes how every subsequent access of
    /// the calling CPU is translated.
    unsafe fn store_unsafe(self);
}
