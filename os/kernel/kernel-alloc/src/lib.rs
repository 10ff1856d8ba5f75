//! # Early Physical Memory
//!
//! The memory the page-table code builds on before the real page allocator
//! is up:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 MappingTree (kernel-vmem)           │
//! │    • builds the kernel and identity hierarchies     │
//! └────────────┬───────────────────────────┬────────────┘
//!              │ FrameAlloc                │ PhysMapper
//! ┌────────────▼─────────────┐ ┌───────────▼────────────┐
//! │ BootAllocator            │ │ LinearPhysMapper       │
//! │ • bump cursor over banks │ │ • table page → pointer │
//! │ • reserved ranges        │ │   via the linear map   │
//! │ • allocation limit       │ │                        │
//! │ • reclaim pool           │ │                        │
//! └────────────┬─────────────┘ └────────────────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │ MemoryMap                │
//! │ • sorted RAM banks       │
//! │ • pfn validity           │
//! └──────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kernel_alloc::frame_alloc::BootAllocator;
//! use kernel_alloc::region::{MemoryMap, MemoryRegion};
//! use kernel_memory_addresses::PhysicalAddress;
//! use kernel_vmem::FrameAlloc;
//!
//! let map: MemoryMap = [MemoryRegion::new(PhysicalAddress::new(0x8000_0000), 0x4000_0000)]
//!     .into_iter()
//!     .collect();
//! let mut allocator = BootAllocator::new(map);
//! let table = allocator.alloc(4096, 4096).unwrap();
//! assert_eq!(table.as_u64(), 0x8000_0000);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod frame_alloc;
pub mod phys_mapper;
pub mod region;

pub use crate::frame_alloc::{AllocLimit, BootAllocator};
pub use crate::phys_mapper::LinearPhysMapper;
pub use crate::region::{MemoryMap, MemoryRegion};
