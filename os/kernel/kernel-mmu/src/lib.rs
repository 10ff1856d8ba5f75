//! # Kernel MMU Bring-Up
//!
//! Boot-time construction of the kernel's translation tables on `AArch64`:
//! cache policy selection, the linear map of RAM, the zero page and reserved
//! `TTBR0_EL1`, static I/O windows, and the identity map used to turn the
//! MMU off again.
//!
//! ```text
//!           BootParams ──► select_cache_policy ──► MAIR_EL1 / TCR_EL1
//!                                 │
//!   MemoryMap ──► BootAllocator ──┤
//!                                 ▼
//!                       KernelMmu::paging_init
//!                         ├─ map_memory          (linear map, bounded allocator)
//!                         └─ prepare_zero_page   (flush, zero page, TTBR0)
//!                                 │
//!                   iotable_init / iotable_init_exec
//!                                 │
//!                      StaticRegionRegistry (sorted)
//! ```
//!
//! After boot, [`SharedMmu`] serializes further registrations.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

pub mod cache_policy;
mod error;
pub mod iotable;
mod mmu;
mod shared;
mod stage;

pub use crate::cache_policy::{CACHE_POLICIES, CachePolicy};
pub use crate::error::{BootError, CachePolicyError};
pub use crate::iotable::{MapDesc, RegionCaller, RegionFlags, StaticRegion, StaticRegionRegistry};
pub use crate::mmu::KernelMmu;
pub use crate::shared::SharedMmu;
pub use crate::stage::BootStage;
