use super::BuildContext;
use super::upper::populate_upper;
use crate::attributes::MemoryPolicy;
use crate::error::FatalError;
use crate::level::Level;
use crate::table::TablePage;
use crate::{FrameAlloc, PhysMapper};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::{PhysicalAddress, Size4K, VirtualAddress};
use kernel_registers::CacheMaintenance;

/// Page-aligned start and length of `[virt, virt + size)`, including the
/// in-page offset of `virt`.
pub(crate) const fn page_extent(virt: VirtualAddress, size: u64) -> (VirtualAddress, u64) {
    let length = VirtualAddress::new(size.wrapping_add(virt.offset_in::<Size4K>()))
        .align_up_to(PAGE_SIZE)
        .as_u64();
    (virt.align_down::<Size4K>(), length)
}

/// Maps `size` bytes at `virt` to `phys` below the top-level directory
/// `root`.
///
/// The range is widened to page granularity: the start is rounded down and
/// the length rounded up to cover the in-page offset. Physical and virtual
/// cursors advance in lockstep.
pub(crate) fn build_range<M, A, C>(
    ctx: &mut BuildContext<'_, M, A, C>,
    root: TablePage,
    phys: PhysicalAddress,
    virt: VirtualAddress,
    size: u64,
    policy: MemoryPolicy,
) -> Result<(), FatalError>
where
    M: PhysMapper,
    A: FrameAlloc,
    C: CacheMaintenance,
{
    let (mut addr, length) = page_extent(virt, size);
    let mut phys = phys.align_down::<Size4K>();
    if length == 0 {
        log::debug!("ignoring empty mapping request at {virt}");
        return Ok(());
    }

    let end = addr + length;
    log::trace!("mapping {addr}..{end} -> {phys} ({policy:?})");

    loop {
        let next = Level::Top.span_end(addr, end);
        populate_upper(ctx, root, addr, next, phys, policy)?;

        phys += next.wrapping_distance(addr);
        addr = next;
        if addr == end {
            break;
        }
    }

    Ok(())
}
