use super::BuildContext;
use super::mid::populate_mid;
use crate::attributes::MemoryPolicy;
use crate::error::FatalError;
use crate::level::Level;
use crate::table::TablePage;
use crate::{FrameAlloc, PhysMapper};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_registers::CacheMaintenance;

/// Maps `[addr, end)` within one top-level entry of `top`, using 1 GiB
/// blocks where aligned and permitted by `policy`.
pub(super) fn populate_upper<M, A, C>(
    ctx: &mut BuildContext<'_, M, A, C>,
    top: TablePage,
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
    let upper = ctx.descend(top, Level::Top, addr)?;

    let (mut addr, mut phys) = (addr, phys);
    loop {
        let next = Level::Upper.span_end(addr, end);
        if policy.allows_huge_blocks() && Level::Upper.is_block_aligned(addr, next, phys) {
            ctx.install_block(upper, Level::Upper, addr, phys, policy.block_attributes())?;
        } else {
            populate_mid(ctx, upper, addr, next, phys, policy)?;
        }

        phys += next.wrapping_distance(addr);
        addr = next;
        if addr == end {
            break;
        }
    }

    Ok(())
}
