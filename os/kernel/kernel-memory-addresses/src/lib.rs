//! # Virtual and Physical Memory Address Types
//!
//! Strongly typed wrappers for raw memory addresses, page bases and frame
//! numbers used by the AArch64 page-table code.
//!
//! ## Overview
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`MemoryAddress`] | A raw 64-bit address, either physical or virtual. |
//! | [`VirtualAddress`] | An address translated through the page tables. |
//! | [`PhysicalAddress`] | An address in RAM or MMIO space. |
//! | [`PhysicalPage<S>`] | The aligned base of a physical page of size `S`. |
//! | [`FrameNumber`] | A 4 KiB frame number (`pa >> 12`). |
//!
//! ## Page Sizes
//!
//! With the 4 KiB translation granule a walk can terminate at three sizes,
//! modelled by marker types implementing [`PageSize`]:
//!
//! - [`Size4K`] — a page descriptor at L3
//! - [`Size2M`] — a block descriptor at L2
//! - [`Size1G`] — a block descriptor at L1
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let va = VirtualAddress::new(0xFFFF_8000_0020_1234);
//! assert_eq!(va.align_down::<Size2M>().as_u64(), 0xFFFF_8000_0020_0000);
//! assert_eq!(va.offset_in::<Size4K>(), 0x234);
//!
//! let pa = PhysicalAddress::new(0x8020_1000);
//! let page = pa.page::<Size4K>();
//! assert_eq!(page.frame_number().address(), pa);
//! ```
//!
//! ## Design Notes
//!
//! - All types are `#[repr(transparent)]`, `Copy`, `Eq`, `Ord` and `Hash`.
//! - Arithmetic via `+` wraps; the walkers rely on `end == 0` meaning "top of
//!   the address space".

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod frame_number;
mod memory_address;
mod page_size;
mod physical_address;
mod physical_page;
mod virtual_address;

pub use frame_number::FrameNumber;
pub use memory_address::MemoryAddress;
pub use page_size::{PageSize, Size1G, Size2M, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;
pub use virtual_address::VirtualAddress;
