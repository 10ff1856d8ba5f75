use super::BuildContext;
use crate::descriptor::Descriptor;
use crate::error::FatalError;
use crate::journal::{SupersedeRecord, SupersedeStep};
use crate::level::Level;
use crate::table::{TableIndex, TablePage};
use crate::{FrameAlloc, PhysMapper};
use alloc::vec::Vec;
use kernel_memory_addresses::VirtualAddress;
use kernel_registers::CacheMaintenance;

/// What becomes of the storage behind the replaced descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Reclaim {
    /// Keep it.
    Nothing,
    /// Return the table and every table below it. `level` is the level of
    /// the table itself.
    Subtree { table: TablePage, level: Level },
}

/// Replacement of a live descriptor.
///
/// The steps always run in the order install, invalidate, release. A
/// failed invalidation is fatal and leaves the replaced storage allocated.
pub(crate) struct Supersede {
    pub table: TablePage,
    pub index: TableIndex,
    pub level: Level,
    pub virt: VirtualAddress,
    pub previous: Descriptor,
    pub replacement: Descriptor,
}

impl Supersede {
    pub fn commit<M, A, C>(
        self,
        ctx: &mut BuildContext<'_, M, A, C>,
        reclaim: Reclaim,
    ) -> Result<(), FatalError>
    where
        M: PhysMapper,
        A: FrameAlloc,
        C: CacheMaintenance,
    {
        let mut steps = Vec::with_capacity(3);

        ctx.mem.table_mut(self.table).set(self.index, self.replacement);
        steps.push(SupersedeStep::Installed);

        let invalidated = ctx.maintenance.flush_tlb_all();
        if invalidated.is_ok() {
            steps.push(SupersedeStep::Invalidated);
            if let Reclaim::Subtree { table, level } = reclaim {
                release_subtree(ctx, table, level, &mut steps);
            }
        }

        log::debug!(
            "superseded {} entry for {}: {:?} -> {:?} ({} step(s))",
            self.level,
            self.virt,
            self.previous,
            self.replacement,
            steps.len()
        );

        ctx.journal.push(SupersedeRecord {
            level: self.level,
            virt: self.virt,
            previous: self.previous,
            replacement: self.replacement,
            steps,
        });

        invalidated.map_err(FatalError::from)
    }
}

/// Returns `table` and every table it links to, children first.
fn release_subtree<M, A, C>(
    ctx: &mut BuildContext<'_, M, A, C>,
    table: TablePage,
    level: Level,
    steps: &mut Vec<SupersedeStep>,
)
where
    M: PhysMapper,
    A: FrameAlloc,
    C: CacheMaintenance,
{
    if let Some(child_level) = level.next() {
        let children: Vec<TablePage> = ctx
            .mem
            .table(table)
            .populated()
            .filter_map(|(_, e)| match e.kind(level) {
                crate::DescriptorKind::Table(t) => Some(t.next_table()),
                _ => None,
            })
            .collect();

        for child in children {
            release_subtree(ctx, child, child_level, steps);
        }
    }

    log::trace!("releasing {level} table at {table}");
    ctx.alloc.free(table.base(), kernel_info::memory::PAGE_SIZE);
    steps.push(SupersedeStep::Released(table));
}
