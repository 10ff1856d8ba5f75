use super::BuildContext;
use crate::attributes::MemoryPolicy;
use crate::error::FatalError;
use crate::level::Level;
use crate::table::TablePage;
use crate::{FrameAlloc, PhysMapper};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_registers::CacheMaintenance;

/// Fills `[addr, end)` with page descriptors, all within one mid-level
/// entry of `mid`. `end` is exclusive and greater than `addr`.
pub(super) fn populate_leaf<M, A, C>(
    ctx: &mut BuildContext<'_, M, A, C>,
    mid: TablePage,
    addr: VirtualAddress,
    end: VirtualAddress,
    phys: PhysicalAddress,
    policy: MemoryPolicy,
) -> Result<(), FatalError>
where
    M: PhysMapper,
    A: FrameAlloc,
    C: CacheMaintenance,
{
    let leaf = ctx.descend(mid, Level::Mid, addr)?;
    let attributes = policy.page_attributes();

    let (mut addr, mut phys) = (addr, phys);
    let table = ctx.mem.table_mut(leaf);
    loop {
        table.set(Level::Leaf.index_of(addr), attributes.mapping(phys).into());
        addr += PAGE_SIZE;
        phys += PAGE_SIZE;
        if addr == end {
            break;
        }
    }

    Ok(())
}
