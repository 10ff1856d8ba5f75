//! Hosted stand-ins for physical memory, used by tests and tooling.
//!
//! Physical memory is simulated sparsely: a frame only exists once it has
//! been written through [`PhysMapper::table_mut`]; reading an untouched frame
//! yields zeroes.

use crate::frame_alloc::{AllocError, FrameAlloc};
use crate::table::{DirectoryTable, TablePage};
use crate::PhysMapper;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use kernel_memory_addresses::PhysicalAddress;

static ZEROED: DirectoryTable = DirectoryTable::zeroed();

/// Sparse emulated RAM holding directory tables.
#[derive(Debug, Default)]
pub struct EmulatedPhysMemory {
    frames: BTreeMap<PhysicalAddress, Box<DirectoryTable>>,
}

impl EmulatedPhysMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames that have been written.
    #[must_use]
    pub fn resident_frames(&self) -> usize {
        self.frames.len()
    }
}

impl PhysMapper for EmulatedPhysMemory {
    fn table(&self, page: TablePage) -> &DirectoryTable {
        self.frames.get(&page.base()).map_or(&ZEROED, |t| &**t)
    }

    fn table_mut(&mut self, page: TablePage) -> &mut DirectoryTable {
        self.frames
            .entry(page.base())
            .or_insert_with(|| Box::new(DirectoryTable::zeroed()))
    }
}

/// A trivial **bump** allocator over `[start, end)` that remembers what was
/// given back.
#[derive(Debug)]
pub struct BumpFrameAlloc {
    next: u64,
    end: u64,
    allocations: usize,
    freed: Vec<PhysicalAddress>,
}

impl BumpFrameAlloc {
    #[must_use]
    pub const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        Self {
            next: start.as_u64(),
            end: end.as_u64(),
            allocations: 0,
            freed: Vec::new(),
        }
    }

    /// Successful allocations so far.
    #[must_use]
    pub const fn allocations(&self) -> usize {
        self.allocations
    }

    /// Bases passed to [`FrameAlloc::free`], in call order.
    #[must_use]
    pub fn freed(&self) -> &[PhysicalAddress] {
        &self.freed
    }
}

impl FrameAlloc for BumpFrameAlloc {
    fn alloc(&mut self, size: u64, align: u64) -> Result<PhysicalAddress, AllocError> {
        if !align.is_power_of_two() {
            return Err(AllocError::BadAlignment(align));
        }

        let base = PhysicalAddress::new(self.next).align_up_to(align).as_u64();
        match base.checked_add(size) {
            Some(top) if base >= self.next && top <= self.end => {
                self.next = top;
                self.allocations += 1;
                Ok(PhysicalAddress::new(base))
            }
            _ => Err(AllocError::Exhausted { size, align }),
        }
    }

    fn free(&mut self, base: PhysicalAddress, _size: u64) {
        self.freed.push(base);
    }
}
