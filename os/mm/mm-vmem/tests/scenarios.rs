use mm_physical::{MemPhy, PhysicalStore};
use mm_vmem::addresses::{PageNumber, Size256, VirtualAddress};
use mm_vmem::{
    DEFAULT_AREA, Interval, MemoryBanks, MemoryConfig, PageState, Process, Region, VmError,
};
use std::sync::Arc;

struct Machine {
    ram: Arc<MemPhy<Size256>>,
    swap: Arc<MemPhy<Size256>>,
    process: Process<Size256>,
}

fn machine(ram_frames: u32, swap_frames: u32) -> Machine {
    let ram = Arc::new(MemPhy::<Size256>::new(ram_frames));
    let swap = Arc::new(MemPhy::<Size256>::new(swap_frames));
    let banks = MemoryBanks::<Size256>::new(ram.clone()).with_swap(swap.clone());
    let process = Process::new(1, &MemoryConfig::default(), banks).unwrap();
    Machine { ram, swap, process }
}

fn va(addr: u32) -> VirtualAddress {
    VirtualAddress::new(addr)
}

fn free_list(p: &Process<Size256>) -> Vec<Interval> {
    p.mm()
        .area(DEFAULT_AREA)
        .unwrap()
        .free_list()
        .iter()
        .map(|node| node.range())
        .collect()
}

#[test]
fn grow_rounds_up_to_whole_pages() {
    let m = machine(8, 8);
    assert_eq!(m.process.grow_area(DEFAULT_AREA, 300).unwrap(), 512);

    let area = m.process.mm().area(DEFAULT_AREA).unwrap();
    assert_eq!(area.break_ptr(), va(300));
    assert_eq!(area.end(), va(512));
    assert_eq!(free_list(&m.process), vec![Interval::new(va(300), va(512))]);

    // Both pages of the new range are backed by RAM.
    assert_eq!(m.ram.free_frame_count(), 6);
}

#[test]
fn freed_space_is_reused_first_fit() {
    let m = machine(8, 8);
    assert_eq!(m.process.allocate_named(200, 2).unwrap(), va(0));
    assert_eq!(
        m.process.mm().region(2).unwrap(),
        Some(Region::new(Interval::new(va(0), va(200))))
    );

    m.process.free_named(2).unwrap();
    let again = m.process.allocate_named(100, 2).unwrap();
    assert!(again < va(300), "got {again}");
    assert_eq!(m.process.mm().region(2).unwrap().map(Region::len), Some(100));

    // No further growth was needed.
    assert_eq!(m.process.mm().area(DEFAULT_AREA).unwrap().end(), va(256));
}

#[test]
fn freeing_an_empty_handle_changes_nothing() {
    let m = machine(8, 8);
    m.process.grow_area(DEFAULT_AREA, 300).unwrap();
    let before = free_list(&m.process);

    assert!(matches!(
        m.process.free_named(2),
        Err(VmError::InvalidRegion(2))
    ));
    assert_eq!(free_list(&m.process), before);
    assert!(m.process.mm().regions().is_empty());
}

#[test]
fn fifo_evicts_the_oldest_page() {
    let m = machine(2, 4);
    let (a, b, c) = (PageNumber::new(0), PageNumber::new(1), PageNumber::new(2));

    m.process.translate(a).unwrap();
    m.process.translate(b).unwrap();
    m.process.translate(c).unwrap();

    let mm = m.process.mm();
    assert!(matches!(mm.page_state(a), Some(PageState::Swapped(_))));
    assert!(matches!(mm.page_state(b), Some(PageState::Resident(_))));
    assert!(matches!(mm.page_state(c), Some(PageState::Resident(_))));

    // A faults again; B is now the oldest resident page and makes room.
    m.process.translate(a).unwrap();
    assert!(matches!(mm.page_state(a), Some(PageState::Resident(_))));
    assert!(matches!(mm.page_state(b), Some(PageState::Swapped(_))));
    assert_eq!(mm.resident_pages(), vec![c, a]);
}

#[test]
fn handle_bound_is_strict() {
    let m = machine(8, 8);
    assert!(m.process.allocate_named(10, 29).is_ok());
    assert!(matches!(
        m.process.allocate_named(10, 30),
        Err(VmError::InvalidHandle {
            handle: 30,
            capacity: 30
        })
    ));
    assert!(matches!(
        m.process.read_named(30, 0),
        Err(VmError::InvalidHandle { .. })
    ));
}

#[test]
fn use_after_free_is_rejected() {
    let m = machine(8, 8);
    m.process.allocate_named(16, 0).unwrap();
    m.process.write_named(0, 3, 7).unwrap();
    m.process.free_named(0).unwrap();

    assert!(matches!(m.process.read_named(0, 3), Err(VmError::InvalidRegion(0))));
    assert!(matches!(m.process.write_named(0, 3, 1), Err(VmError::InvalidRegion(0))));
    assert!(matches!(m.process.free_named(0), Err(VmError::InvalidRegion(0))));
}

#[test]
fn offsets_past_the_region_are_rejected() {
    let m = machine(8, 8);
    m.process.allocate_named(16, 0).unwrap();
    assert!(m.process.read_named(0, 15).is_ok());
    assert!(matches!(
        m.process.read_named(0, 16),
        Err(VmError::OutOfBoundsOffset {
            handle: 0,
            offset: 16,
            len: 16
        })
    ));
}

#[test]
#[allow(clippy::cast_possible_truncation)]
fn eviction_moves_whole_pages() {
    let m = machine(1, 4);
    m.process.allocate_named(256, 0).unwrap();
    m.process.allocate_named(256, 1).unwrap();

    // Region 1 spilled into swap; writing it evicts region 0 and back again.
    for offset in 0..256_u32 {
        m.process.write_named(0, offset, (offset % 251) as u8).unwrap();
    }
    for offset in 0..256_u32 {
        m.process.write_named(1, offset, (255 - offset) as u8).unwrap();
    }
    for offset in 0..256_u32 {
        assert_eq!(m.process.read_named(0, offset).unwrap(), (offset % 251) as u8);
    }
    for offset in 0..256_u32 {
        assert_eq!(m.process.read_named(1, offset).unwrap(), (255 - offset) as u8);
    }

    // Exchanges reuse the slot: one RAM frame and one swap frame in use.
    assert_eq!(m.ram.free_frame_count(), 0);
    assert_eq!(m.swap.free_frame_count(), 3);
}

#[test]
fn growth_fails_when_both_stores_are_full() {
    let m = machine(1, 1);
    match m.process.allocate_named(3 * 256, 0) {
        Err(VmError::GrowthFailed { area: 0, source }) => {
            assert!(matches!(*source, VmError::MappingFailed { pages: 3, .. }));
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(m.ram.free_frame_count(), 1);
    assert_eq!(m.swap.free_frame_count(), 1);
    assert_eq!(m.process.mm().region(0).unwrap(), None);
}

#[test]
fn teardown_returns_every_frame() {
    let m = machine(2, 4);
    m.process.allocate_named(5 * 256, 0).unwrap();
    m.process.write_named(0, 4 * 256, 1).unwrap();
    assert_eq!(m.ram.free_frame_count(), 0);
    assert_eq!(m.swap.free_frame_count(), 1);

    let Machine { ram, swap, process } = m;
    process.teardown().unwrap();
    assert_eq!(ram.free_frame_count(), 2);
    assert_eq!(swap.free_frame_count(), 4);
}

#[test]
fn teardown_releases_to_the_owning_swap_device() {
    let ram = Arc::new(MemPhy::<Size256>::new(1));
    let first = Arc::new(MemPhy::<Size256>::new(1));
    let second = Arc::new(MemPhy::<Size256>::new(2));
    let mut banks = MemoryBanks::<Size256>::new(ram.clone())
        .with_swap(first.clone())
        .with_swap(second.clone());

    // Fill the first device through one process, then switch devices.
    let early = Process::new(1, &MemoryConfig::default(), banks.clone()).unwrap();
    early.grow_area(DEFAULT_AREA, 2 * 256).unwrap();
    assert_eq!((ram.free_frame_count(), first.free_frame_count()), (0, 0));

    banks.set_active_swap(1).unwrap();
    let late = Process::new(2, &MemoryConfig::default(), banks).unwrap();
    late.grow_area(DEFAULT_AREA, 2 * 256).unwrap();
    assert_eq!(second.free_frame_count(), 0);

    early.teardown().unwrap();
    assert_eq!(first.free_frame_count(), 1);
    assert_eq!(second.free_frame_count(), 0);

    late.teardown().unwrap();
    assert_eq!(ram.free_frame_count(), 1);
    assert_eq!(second.free_frame_count(), 2);
}
