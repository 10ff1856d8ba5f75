use super::BuildContext;
use super::leaf::populate_leaf;
use crate::attributes::MemoryPolicy;
use crate::error::FatalError;
use crate::level::Level;
use crate::table::TablePage;
use crate::{FrameAlloc, PhysMapper};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_registers::CacheMaintenance;

/// Maps `[addr, end)` within one upper-level entry of `upper`, using 2 MiB
/// sections where aligned.
pub(super) fn populate_mid<M, A, C>(
    ctx: &mut BuildContext<'_, M, A, C>,
    upper: TablePage,
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
    let mid = ctx.descend(upper, Level::Upper, addr)?;

    let (mut addr, mut phys) = (addr, phys);
    loop {
        let next = Level::Mid.span_end(addr, end);
        if Level::Mid.is_block_aligned(addr, next, phys) {
            ctx.install_block(mid, Level::Mid, addr, phys, policy.block_attributes())?;
        } else {
            populate_leaf(ctx, mid, addr, next, phys, policy)?;
        }

        phys += next.wrapping_distance(addr);
        addr = next;
        if addr == end {
            break;
        }
    }

    Ok(())
}
