use kernel_alloc::{BootAllocator, MemoryRegion};
use kernel_info::memory::MemoryLayout;
use kernel_memory_addresses::{FrameNumber, PhysicalAddress, VirtualAddress};
use kernel_mmu::{BootStage, KernelMmu, MapDesc, RegionCaller, RegionFlags};
use kernel_registers::{MemoryType, RecordingMaintenance, SoftwareRegisters};
use kernel_vmem::emulated::EmulatedPhysMemory;

type TestMmu = KernelMmu<EmulatedPhysMemory, RecordingMaintenance, SoftwareRegisters>;

const IO_BASE: u64 = 0xFFFF_0000_0800_0000;

fn booted() -> TestMmu {
    let alloc = BootAllocator::new(
        [MemoryRegion::new(PhysicalAddress::new(0x8000_0000), 0x4000_0000)]
            .into_iter()
            .collect(),
    );
    let mut mmu = KernelMmu::new(
        EmulatedPhysMemory::new(),
        alloc,
        RecordingMaintenance::new(),
        SoftwareRegisters::default(),
        MemoryLayout::DEFAULT,
    )
    .unwrap();
    mmu.paging_init().unwrap();
    mmu
}

fn uart(virt: u64, phys: u64) -> MapDesc {
    MapDesc::new(
        VirtualAddress::new(virt),
        PhysicalAddress::new(phys).frame_number(),
        0x1000,
        MemoryType::DeviceNGnRE,
    )
}

#[test]
fn reverse_registration_is_sorted() {
    let mut mmu = booted();
    mmu.iotable_init(&[uart(IO_BASE + 0x20_0000, 0x0902_0000), uart(IO_BASE, 0x0900_0000)])
        .unwrap();

    let regions = mmu.regions().regions();
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].virt.as_u64(), IO_BASE);
    assert_eq!(regions[1].virt.as_u64(), IO_BASE + 0x20_0000);
    assert_eq!(mmu.stage(), BootStage::RegionsRegistered);
}

#[test]
fn io_windows_are_non_cacheable_and_never_executable() {
    let mut mmu = booted();
    mmu.iotable_init(&[uart(IO_BASE + 0x10, 0x0900_0000)]).unwrap();

    let region = mmu.regions().regions()[0];
    assert_eq!(region.caller, RegionCaller::IoTable);
    assert_eq!(region.size, 0x2000);
    assert!(region.mapped);
    assert!(region.flags.contains(RegionFlags::IOREMAP | RegionFlags::STATIC_MAPPING));
    assert_eq!(region.flags.mtype(), MemoryType::DeviceNGnRE.into_bits());

    let t = mmu.tree().translate(VirtualAddress::new(IO_BASE + 0x10)).unwrap();
    assert_eq!(t.phys.as_u64(), 0x0900_0010);
    assert_eq!(t.attributes.attr_index(), MemoryType::NormalNonCacheable);
    assert!(t.attributes.pxn());
    assert_eq!(
        mmu.regions().find(VirtualAddress::new(IO_BASE + 0xFFF)).unwrap().phys,
        region.phys
    );
}

#[test]
fn exec_windows_are_normal_memory() {
    let mut mmu = booted();
    let sram = MapDesc::new(
        VirtualAddress::new(IO_BASE),
        FrameNumber::new(0x80100),
        0x20_0000,
        MemoryType::Normal,
    );
    mmu.iotable_init_exec(&[sram]).unwrap();

    let region = mmu.regions().regions()[0];
    assert_eq!(region.caller, RegionCaller::IoTableExec);

    let t = mmu.tree().translate(VirtualAddress::new(IO_BASE)).unwrap();
    assert_eq!(t.attributes.attr_index(), MemoryType::Normal);
    assert!(t.attributes.is_kernel_executable());
    // backed by RAM
    assert!(mmu.address_is_mapped(VirtualAddress::new(IO_BASE + 0x1000)));
}

#[test]
fn device_windows_are_not_ram() {
    let mut mmu = booted();
    mmu.iotable_init(&[uart(IO_BASE, 0x0900_0000)]).unwrap();
    assert!(mmu.tree().translate(VirtualAddress::new(IO_BASE)).is_some());
    assert!(!mmu.address_is_mapped(VirtualAddress::new(IO_BASE)));
}

#[test]
fn rejected_region_is_still_recorded() {
    let mut mmu = booted();
    let census = mmu.tree().census();
    mmu.iotable_init(&[uart(0x0000_0000_0900_0000, 0x0900_0000)])
        .unwrap();

    let region = mmu.regions().regions()[0];
    assert!(!region.mapped);
    assert_eq!(mmu.tree().census(), census);
}

#[test]
fn empty_batch_is_a_no_op() {
    let mut mmu = booted();
    mmu.iotable_init(&[]).unwrap();
    assert!(mmu.regions().is_empty());
    assert_eq!(mmu.stage(), BootStage::ZeroPageReady);
}

#[test]
fn batches_accumulate() {
    let mut mmu = booted();
    mmu.iotable_init(&[uart(IO_BASE + 0x40_0000, 0x0904_0000)]).unwrap();
    mmu.iotable_init_exec(&[uart(IO_BASE, 0x0900_0000)]).unwrap();

    let callers: Vec<_> = mmu.regions().regions().iter().map(|r| r.caller).collect();
    assert_eq!(callers, [RegionCaller::IoTableExec, RegionCaller::IoTable]);
}
