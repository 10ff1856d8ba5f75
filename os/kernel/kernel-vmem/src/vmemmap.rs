use crate::attributes::PROT_SECT_NORMAL;
use crate::builder::BuildContext;
use crate::descriptor::DescriptorKind;
use crate::error::FatalError;
use crate::level::Level;
use crate::table::TablePage;
use crate::{FrameAlloc, PhysMapper};
use kernel_info::memory::{PAGE_SIZE, PMD_SIZE};
use kernel_memory_addresses::VirtualAddress;
use kernel_registers::CacheMaintenance;

/// Backs `[start, end)` with freshly allocated, zeroed 2 MiB sections of
/// non-executable normal memory. Sections already present are kept.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn populate<M, A, C>(
    ctx: &mut BuildContext<'_, M, A, C>,
    root: TablePage,
    start: VirtualAddress,
    end: VirtualAddress,
) -> Result<(), FatalError>
where
    M: PhysMapper,
    A: FrameAlloc,
    C: CacheMaintenance,
{
    if start >= end {
        return Ok(());
    }

    let mut addr = start.align_down_to(PMD_SIZE);
    loop {
        let next = Level::Mid.span_end(addr, end);

        let upper = ctx.descend(root, Level::Top, addr)?;
        let mid = ctx.descend(upper, Level::Upper, addr)?;
        let index = Level::Mid.index_of(addr);
        let entry = ctx.entry(mid, index);

        match entry.kind(Level::Mid) {
            DescriptorKind::Empty => {
                let block = ctx.alloc.alloc(PMD_SIZE, PMD_SIZE)?;
                for offset in (0..PMD_SIZE).step_by(PAGE_SIZE as usize) {
                    ctx.mem.table_mut(TablePage::containing(block + offset)).zero();
                }
                ctx.install_block(mid, Level::Mid, addr, block, PROT_SECT_NORMAL)?;
                log::debug!("vmemmap {addr}..{next} backed by {block}");
            }
            DescriptorKind::Block(existing) => {
                log::trace!("vmemmap {addr} already backed by {}", existing.output_address());
            }
            DescriptorKind::Table(_) => {
                log::warn!("vmemmap {addr} is mapped at page granularity, keeping it");
            }
            DescriptorKind::Page(_) | DescriptorKind::Reserved => {
                return Err(FatalError::BadEntry {
                    level: Level::Mid,
                    index,
                    raw: entry.into_bits(),
                });
            }
        }

        addr = next;
        if addr == end {
            break;
        }
    }

    Ok(())
}
