//! # Translation and Page Replacement
//!
//! [`Paging`] owns a process's page table and the FIFO of its resident pages.
//! Every translation goes through [`Paging::translate`]; a miss runs the fault
//! path:
//!
//! ```text
//!             translate(page)
//!                   │
//!        ┌──────────┴──────────┐
//!     resident             not resident
//!        │                     │
//!   return frame      free RAM frame? ──yes──► zero it, or copy in from swap
//!                              │ no                 and free the swap slot
//!                              ▼
//!                   evict FIFO head (victim)
//!                              │
//!        ┌─────────────────────┴─────────────────────┐
//!   page is swapped                           page never mapped
//!   exchange victim ⇄ page,                   victim → fresh frame on the
//!   victim takes the page's swap slot         active swap device, zero frame
//! ```
//!
//! In every case the faulting page ends up resident at the back of the FIFO.
//! Each mapped page owns exactly one frame, either in RAM or on a swap device.

use crate::VmError;
use crate::banks::MemoryBanks;
use crate::page_table::PageTable;
use crate::pte::{PageState, PageTableEntry, SwapSlot};
use log::{debug, info, trace, warn};
use mm_addresses::{FrameNumber, PageNumber, PageSize};
use mm_physical::PhysicalError;
use std::collections::VecDeque;
use std::marker::PhantomData;

pub(crate) struct Paging<S: PageSize> {
    table: PageTable,
    /// Resident pages, oldest first.
    resident: VecDeque<PageNumber>,
    _page: PhantomData<S>,
}

impl<S: PageSize> Paging<S> {
    pub(crate) fn new(max_pages: u32) -> Self {
        Self {
            table: PageTable::new(max_pages),
            resident: VecDeque::new(),
            _page: PhantomData,
        }
    }

    pub(crate) const fn table(&self) -> &PageTable {
        &self.table
    }

    pub(crate) fn resident_pages(&self) -> Vec<PageNumber> {
        self.resident.iter().copied().collect()
    }

    fn entry(&self, page: PageNumber) -> Result<PageTableEntry, VmError> {
        self.table
            .get(page)
            .ok_or(VmError::AddressOutOfRange(page.base::<S>()))
    }

    fn install(&mut self, page: PageNumber, entry: PageTableEntry) -> Result<(), VmError> {
        if self.table.set(page, entry) {
            Ok(())
        } else {
            Err(VmError::AddressOutOfRange(page.base::<S>()))
        }
    }

    /// RAM frame holding `page`, faulting it in first if necessary.
    pub(crate) fn translate(
        &mut self,
        banks: &MemoryBanks<S>,
        page: PageNumber,
    ) -> Result<FrameNumber, VmError> {
        match self.entry(page)?.state() {
            PageState::Resident(frame) if frame.as_u32() < banks.ram().frame_count() => {
                trace!("translate {page:?} -> {frame:?}");
                Ok(frame)
            }
            PageState::Resident(_) => Err(VmError::InvariantViolation(
                "resident page maps a frame outside RAM",
            )),
            state => self.fault(banks, page, state),
        }
    }

    fn fault(
        &mut self,
        banks: &MemoryBanks<S>,
        page: PageNumber,
        state: PageState,
    ) -> Result<FrameNumber, VmError> {
        trace!("page fault on {page:?} ({state})");
        let frame = match banks.ram().acquire_free_frame() {
            Ok(frame) => {
                if let Err(e) = Self::fill(banks, frame, state) {
                    let _ = banks.ram().release_frame(frame);
                    return Err(e);
                }
                frame
            }
            Err(PhysicalError::NoFramesLeft) => self.replace(banks, state)?,
            Err(e) => return Err(e.into()),
        };

        self.install(page, PageTableEntry::resident(frame))?;
        self.resident.push_back(page);
        trace!("{page:?} now resident in {frame:?}");
        Ok(frame)
    }

    /// Load the contents of a non-resident page into a fresh RAM frame.
    fn fill(banks: &MemoryBanks<S>, frame: FrameNumber, state: PageState) -> Result<(), VmError> {
        match state {
            PageState::Unmapped => Ok(banks.ram().zero_frame(frame)?),
            PageState::Swapped(slot) => {
                let swap = banks.swap(slot.device)?;
                let mut page = vec![0; S::SIZE as usize];
                swap.read_frame(slot.frame, &mut page)?;
                banks.ram().write_frame(frame, &page)?;
                swap.release_frame(slot.frame)?;
                Ok(())
            }
            PageState::Resident(_) => Err(VmError::InvariantViolation(
                "fault on a page that is already resident",
            )),
        }
    }

    /// Evict the oldest resident page and hand its RAM frame to the faulting
    /// page, whose contents are already in place when this returns.
    fn replace(&mut self, banks: &MemoryBanks<S>, state: PageState) -> Result<FrameNumber, VmError> {
        let victim = self
            .resident
            .pop_front()
            .ok_or(VmError::NoVictimAvailable)?;
        let PageState::Resident(frame) = self.entry(victim)?.state() else {
            self.resident.push_front(victim);
            return Err(VmError::InvariantViolation("FIFO victim is not resident"));
        };

        let moved = match state {
            PageState::Swapped(slot) => Self::exchange(banks, frame, slot).map(|()| slot),
            PageState::Unmapped => Self::swap_out(banks, frame),
            PageState::Resident(_) => Err(VmError::InvariantViolation(
                "fault on a page that is already resident",
            )),
        };

        match moved {
            Ok(slot) => {
                self.install(victim, PageTableEntry::swapped_out(slot))?;
                info!("evicted {victim:?} from {frame:?} to {slot}");
                Ok(frame)
            }
            Err(e) => {
                self.resident.push_front(victim);
                Err(e)
            }
        }
    }

    /// Swap the contents of RAM frame `frame` and swap slot `slot`.
    fn exchange(banks: &MemoryBanks<S>, frame: FrameNumber, slot: SwapSlot) -> Result<(), VmError> {
        let swap = banks.swap(slot.device)?;
        let mut resident = vec![0; S::SIZE as usize];
        let mut swapped = vec![0; S::SIZE as usize];
        banks.ram().read_frame(frame, &mut resident)?;
        swap.read_frame(slot.frame, &mut swapped)?;
        banks.ram().write_frame(frame, &swapped)?;
        swap.write_frame(slot.frame, &resident)?;
        Ok(())
    }

    /// Copy RAM frame `frame` to a fresh slot on the active swap device and
    /// zero the frame.
    fn swap_out(banks: &MemoryBanks<S>, frame: FrameNumber) -> Result<SwapSlot, VmError> {
        let (device, swap) = banks.active_swap().ok_or(VmError::NoFramesLeft)?;
        let target = swap.acquire_free_frame()?;
        let copy = || -> Result<(), PhysicalError> {
            let mut page = vec![0; S::SIZE as usize];
            banks.ram().read_frame(frame, &mut page)?;
            swap.write_frame(target, &page)?;
            banks.ram().zero_frame(frame)
        };
        if let Err(e) = copy() {
            let _ = swap.release_frame(target);
            return Err(e.into());
        }
        Ok(SwapSlot::new(device, target))
    }

    /// Back `count` pages starting at `first` with frames.
    ///
    /// RAM is used first, then the active swap device. Pages that are
    /// already mapped stay untouched. If neither store has a frame left,
    /// everything this call mapped is released again.
    pub(crate) fn map_pages(
        &mut self,
        banks: &MemoryBanks<S>,
        first: PageNumber,
        count: u32,
    ) -> Result<(), VmError> {
        let end = first
            .checked_add(count)
            .filter(|end| end.as_u32() <= self.table.len())
            .ok_or(VmError::AddressOutOfRange(first.base::<S>()))?;

        let mut mapped = Vec::new();
        for n in first.as_u32()..end.as_u32() {
            let page = PageNumber::new(n);
            if self.entry(page)?.state() != PageState::Unmapped {
                continue;
            }
            match Self::back(banks) {
                Ok(entry) => {
                    self.install(page, entry)?;
                    if entry.is_present() {
                        self.resident.push_back(page);
                    }
                    mapped.push(page);
                }
                Err(source) => {
                    self.unmap(banks, &mapped);
                    return Err(VmError::MappingFailed {
                        pages: count,
                        source,
                    });
                }
            }
        }
        debug!("mapped {count} pages from {first:?}");
        Ok(())
    }

    fn back(banks: &MemoryBanks<S>) -> Result<PageTableEntry, PhysicalError> {
        match banks.ram().acquire_free_frame() {
            Ok(frame) => {
                banks.ram().zero_frame(frame)?;
                Ok(PageTableEntry::resident(frame))
            }
            Err(PhysicalError::NoFramesLeft) => {
                let (device, swap) = banks.active_swap().ok_or(PhysicalError::NoFramesLeft)?;
                let frame = swap.acquire_free_frame()?;
                swap.zero_frame(frame)?;
                Ok(PageTableEntry::swapped_out(SwapSlot::new(device, frame)))
            }
            Err(e) => Err(e),
        }
    }

    fn unmap(&mut self, banks: &MemoryBanks<S>, pages: &[PageNumber]) {
        for &page in pages {
            if let Some(entry) = self.table.get(page) {
                let _ = Self::release(banks, entry.state());
                self.table.set(page, PageTableEntry::unmapped());
            }
        }
        self.resident.retain(|page| !pages.contains(page));
    }

    fn release(banks: &MemoryBanks<S>, state: PageState) -> Result<(), VmError> {
        match state {
            PageState::Unmapped => Ok(()),
            PageState::Resident(frame) => Ok(banks.ram().release_frame(frame)?),
            PageState::Swapped(slot) => Ok(banks.swap(slot.device)?.release_frame(slot.frame)?),
        }
    }

    /// Return every frame to its store and reset the table and FIFO.
    ///
    /// All frames are released even if some fail; the first failure is
    /// returned.
    pub(crate) fn release_all(&mut self, banks: &MemoryBanks<S>) -> Result<(), VmError> {
        let mut first_error = None;
        let mut released = 0_usize;
        for (page, state) in self.table.mapped() {
            match Self::release(banks, state) {
                Ok(()) => released += 1,
                Err(e) => {
                    warn!("failed to release {page:?} ({state}): {e}");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        self.table.clear();
        self.resident.clear();
        debug!("released {released} frames");
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn dump(&self) {
        debug!("page table: {} resident", self.resident.len());
        for (page, state) in self.table.mapped() {
            debug!("  {:08} -> {state}", page.as_u32());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_addresses::{PageOffset, Size256};
    use mm_physical::{MemPhy, PhysicalStore};
    use std::sync::Arc;

    struct Fixture {
        ram: Arc<MemPhy<Size256>>,
        swap: Arc<MemPhy<Size256>>,
        banks: MemoryBanks<Size256>,
    }

    fn fixture(ram_frames: u32, swap_frames: u32) -> Fixture {
        let ram = Arc::new(MemPhy::<Size256>::new(ram_frames));
        let swap = Arc::new(MemPhy::<Size256>::new(swap_frames));
        let banks = MemoryBanks::<Size256>::new(ram.clone()).with_swap(swap.clone());
        Fixture { ram, swap, banks }
    }

    fn pg(n: u32) -> PageNumber {
        PageNumber::new(n)
    }

    #[test]
    fn demand_zero_on_first_touch() {
        let f = fixture(2, 2);
        let mut paging = Paging::<Size256>::new(16);
        let frame = paging.translate(&f.banks, pg(5)).unwrap();
        assert_eq!(paging.table().get(pg(5)).unwrap().state(), PageState::Resident(frame));
        assert_eq!(paging.resident_pages(), vec![pg(5)]);
        assert_eq!(f.swap.free_frame_count(), 2);
    }

    #[test]
    fn translate_beyond_the_table_fails() {
        let f = fixture(2, 2);
        let mut paging = Paging::<Size256>::new(4);
        assert!(matches!(
            paging.translate(&f.banks, pg(4)),
            Err(VmError::AddressOutOfRange(_))
        ));
    }

    #[test]
    fn resident_frame_outside_ram_is_an_invariant_violation() {
        let f = fixture(2, 2);
        let mut paging = Paging::<Size256>::new(4);
        paging.install(pg(0), PageTableEntry::resident(FrameNumber::new(9))).unwrap();
        assert!(matches!(
            paging.translate(&f.banks, pg(0)),
            Err(VmError::InvariantViolation(_))
        ));
    }

    #[test]
    fn fifo_eviction_preserves_contents() {
        let f = fixture(1, 2);
        let mut paging = Paging::<Size256>::new(8);

        let a = paging.translate(&f.banks, pg(0)).unwrap();
        f.ram.write_byte(a.join(PageOffset::<Size256>::new(7)), 0xAA).unwrap();

        // Page 1 evicts page 0 into a fresh swap frame.
        let b = paging.translate(&f.banks, pg(1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(f.ram.read_byte(b.join(PageOffset::<Size256>::new(7))), Ok(0));
        let PageState::Swapped(slot) = paging.table().get(pg(0)).unwrap().state() else {
            panic!("page 0 should be swapped");
        };
        assert_eq!(f.swap.free_frame_count(), 1);

        // Page 0 comes back by exchange and page 1 takes over its slot.
        let back = paging.translate(&f.banks, pg(0)).unwrap();
        assert_eq!(f.ram.read_byte(back.join(PageOffset::<Size256>::new(7))), Ok(0xAA));
        assert_eq!(
            paging.table().get(pg(1)).unwrap().state(),
            PageState::Swapped(slot)
        );
        assert_eq!(f.swap.free_frame_count(), 1);
        assert_eq!(paging.resident_pages(), vec![pg(0)]);
    }

    #[test]
    fn swap_in_uses_a_free_frame_when_there_is_one() {
        let f = fixture(1, 1);
        let mut paging = Paging::<Size256>::new(8);
        paging.translate(&f.banks, pg(0)).unwrap();
        paging.translate(&f.banks, pg(1)).unwrap();
        assert_eq!(f.swap.free_frame_count(), 0);

        // Freeing RAM lets the next swapped fault copy in and drop its slot.
        paging.unmap(&f.banks, &[pg(1)]);
        paging.translate(&f.banks, pg(0)).unwrap();
        assert_eq!(f.swap.free_frame_count(), 1);
        assert_eq!(f.ram.free_frame_count(), 0);
    }

    #[test]
    fn full_swap_keeps_the_victim_resident() {
        let f = fixture(1, 0);
        let mut paging = Paging::<Size256>::new(8);
        paging.translate(&f.banks, pg(0)).unwrap();
        assert!(matches!(
            paging.translate(&f.banks, pg(1)),
            Err(VmError::NoFramesLeft)
        ));
        assert_eq!(paging.resident_pages(), vec![pg(0)]);
        assert_eq!(paging.table().get(pg(1)).unwrap().state(), PageState::Unmapped);
    }

    #[test]
    fn no_victim_without_resident_pages() {
        let f = fixture(0, 4);
        let mut paging = Paging::<Size256>::new(8);
        assert!(matches!(
            paging.translate(&f.banks, pg(0)),
            Err(VmError::NoVictimAvailable)
        ));
    }

    #[test]
    fn map_pages_spills_into_swap() {
        let f = fixture(2, 2);
        let mut paging = Paging::<Size256>::new(8);
        paging.map_pages(&f.banks, pg(0), 3).unwrap();
        assert_eq!(paging.resident_pages(), vec![pg(0), pg(1)]);
        assert!(matches!(
            paging.table().get(pg(2)).unwrap().state(),
            PageState::Swapped(_)
        ));
        assert_eq!(f.swap.free_frame_count(), 1);
    }

    #[test]
    fn map_pages_rolls_back_on_exhaustion() {
        let f = fixture(1, 1);
        let mut paging = Paging::<Size256>::new(8);
        assert!(matches!(
            paging.map_pages(&f.banks, pg(0), 3),
            Err(VmError::MappingFailed {
                pages: 3,
                source: PhysicalError::NoFramesLeft
            })
        ));
        assert_eq!(paging.table().mapped().count(), 0);
        assert!(paging.resident_pages().is_empty());
        assert_eq!(f.ram.free_frame_count(), 1);
        assert_eq!(f.swap.free_frame_count(), 1);
    }

    #[test]
    fn map_pages_keeps_existing_mappings() {
        let f = fixture(4, 0);
        let mut paging = Paging::<Size256>::new(8);
        let frame = paging.translate(&f.banks, pg(1)).unwrap();
        paging.map_pages(&f.banks, pg(0), 2).unwrap();
        assert_eq!(paging.table().get(pg(1)).unwrap().state(), PageState::Resident(frame));
        assert_eq!(paging.resident_pages(), vec![pg(1), pg(0)]);
        assert!(matches!(
            paging.map_pages(&f.banks, pg(7), 2),
            Err(VmError::AddressOutOfRange(_))
        ));
    }

    #[test]
    fn release_all_returns_every_frame() {
        let f = fixture(1, 2);
        let mut paging = Paging::<Size256>::new(8);
        paging.map_pages(&f.banks, pg(0), 3).unwrap();
        paging.release_all(&f.banks).unwrap();
        assert_eq!(f.ram.free_frame_count(), 1);
        assert_eq!(f.swap.free_frame_count(), 2);
        assert!(paging.resident_pages().is_empty());

        // Nothing left to release the second time around.
        paging.release_all(&f.banks).unwrap();
        assert_eq!(f.ram.free_frame_count(), 1);
    }
}
