//! Record of supersede transactions: entries that replaced a live
//! translation, and what had to happen before the replaced memory could be
//! given back.

use crate::descriptor::Descriptor;
use crate::level::Level;
use crate::table::TablePage;
use alloc::vec::Vec;
use kernel_memory_addresses::VirtualAddress;

/// One step of a supersede, in execution order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SupersedeStep {
    /// The replacement descriptor was written.
    Installed,
    /// All translations were invalidated.
    Invalidated,
    /// A table page of the replaced subtree was returned to the allocator.
    Released(TablePage),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SupersedeRecord {
    pub level: Level,
    /// First virtual address covered by the entry.
    pub virt: VirtualAddress,
    pub previous: Descriptor,
    pub replacement: Descriptor,
    pub steps: Vec<SupersedeStep>,
}

impl SupersedeRecord {
    /// Table pages released by this supersede.
    pub fn released(&self) -> impl Iterator<Item = TablePage> + '_ {
        self.steps.iter().filter_map(|s| match s {
            SupersedeStep::Released(page) => Some(*page),
            _ => None,
        })
    }

    /// `true` if nothing was released before the invalidation.
    #[must_use]
    pub fn released_after_invalidation(&self) -> bool {
        let invalidated = self
            .steps
            .iter()
            .position(|s| *s == SupersedeStep::Invalidated);
        let first_release = self
            .steps
            .iter()
            .position(|s| matches!(s, SupersedeStep::Released(_)));
        match (invalidated, first_release) {
            (_, None) => true,
            (Some(i), Some(r)) => i < r,
            (None, Some(_)) => false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Journal {
    records: Vec<SupersedeRecord>,
}

impl Journal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[SupersedeRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub(crate) fn push(&mut self, record: SupersedeRecord) {
        self.records.push(record);
    }
}
