//! # Kernel Configuration
//!
//! The authoritative source for the memory layout the page-table code builds
//! against, plus the early boot command line.
//!
//! ## Architecture
//!
//! ### Memory Layout ([`memory`])
//! * **Translation geometry**: 4 KiB granule, 48-bit VA, four levels
//! * **Linear map**: `PAGE_OFFSET + (pa - PHYS_OFFSET)`
//! * **Kernel floor**: `VMALLOC_START`, below which no kernel mapping is created
//! * **Identity map**: limited to the first `IDMAP_PGD_ENTRIES` top-level slots
//! * [`MemoryLayout`](memory::MemoryLayout): the runtime value carrying the above
//!
//! ### Command Line ([`cmdline`])
//! * `key=value` parsing of early parameters such as `cachepolicy=`
//!
//! ## Translation Geometry
//!
//! ```text
//!  63      48 47     39 38     30 29     21 20     12 11        0
//! ┌──────────┬─────────┬─────────┬─────────┬─────────┬───────────┐
//! │ sign ext │ L0 idx  │ L1 idx  │ L2 idx  │ L3 idx  │  offset   │
//! └──────────┴─────────┴─────────┴─────────┴─────────┴───────────┘
//!               512 GiB    1 GiB     2 MiB     4 KiB
//! ```
//!
//! ## Safety
//!
//! Pure data and parsing; no `unsafe` code.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod cmdline;
pub mod memory;
