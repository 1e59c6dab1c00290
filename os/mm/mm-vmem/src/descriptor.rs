use crate::area::{AreaId, VirtualArea};
use crate::banks::MemoryBanks;
use crate::config::MemoryConfig;
use crate::paging::Paging;
use crate::pte::{PageState, PageTableEntry};
use crate::region::{Region, RegionTable};
use crate::VmError;
use log::log_enabled;
use mm_addresses::{FrameNumber, PageNumber, PageSize, VirtualAddress};
use spin::Mutex;

/// Areas plus the region symbol table, guarded together.
pub(crate) struct AddressLayout {
    pub(crate) areas: Vec<VirtualArea>,
    pub(crate) regions: RegionTable,
}

impl AddressLayout {
    pub(crate) fn area(&self, id: AreaId) -> Result<&VirtualArea, VmError> {
        self.areas.get(id).ok_or(VmError::AreaNotFound(id))
    }

    pub(crate) fn area_mut(&mut self, id: AreaId) -> Result<&mut VirtualArea, VmError> {
        self.areas.get_mut(id).ok_or(VmError::AreaNotFound(id))
    }
}

/// Everything one process knows about its virtual memory.
///
/// Two locks split the state:
///
/// | Lock     | Guards                         | Taken by                       |
/// |----------|--------------------------------|--------------------------------|
/// | `layout` | areas, free lists, symbol table | allocate, free, grow, resolve |
/// | `paging` | page table, resident FIFO       | translate, map, release, I/O  |
///
/// When both are needed, `layout` is taken first.
pub struct MemoryDescriptor<S: PageSize> {
    pub(crate) layout: Mutex<AddressLayout>,
    pub(crate) paging: Mutex<Paging<S>>,
}

impl<S: PageSize> MemoryDescriptor<S> {
    /// Build an empty address space: every configured area starts empty,
    /// every handle is unbound and no page is mapped.
    ///
    /// # Errors
    /// [`VmError::InvalidConfig`] if `config` does not validate for `S`.
    pub fn new(config: &MemoryConfig) -> Result<Self, VmError> {
        config.validate::<S>()?;
        let areas = config
            .area_starts()
            .iter()
            .enumerate()
            .map(|(id, &start)| VirtualArea::new(id, start))
            .collect();
        Ok(Self {
            layout: Mutex::new(AddressLayout {
                areas,
                regions: RegionTable::new(config.region_slots()),
            }),
            paging: Mutex::new(Paging::new(config.max_pages())),
        })
    }

    /// RAM frame backing `page`, faulting it in if it is not resident.
    ///
    /// # Errors
    /// [`VmError::AddressOutOfRange`] past the page table, or any error of the
    /// fault path (`NoFramesLeft`, `NoVictimAvailable`, `InvariantViolation`).
    pub fn translate(&self, banks: &MemoryBanks<S>, page: PageNumber) -> Result<FrameNumber, VmError> {
        self.paging.lock().translate(banks, page)
    }

    /// Read the byte at virtual address `va`.
    ///
    /// # Errors
    /// See [`translate`](Self::translate).
    pub fn read_byte(&self, banks: &MemoryBanks<S>, va: VirtualAddress) -> Result<u8, VmError> {
        let (page, offset) = va.split::<S>();
        let mut paging = self.paging.lock();
        let frame = paging.translate(banks, page)?;
        Ok(banks.ram().read_byte(frame.join(offset))?)
    }

    /// Write `value` to virtual address `va`.
    ///
    /// # Errors
    /// See [`translate`](Self::translate).
    pub fn write_byte(
        &self,
        banks: &MemoryBanks<S>,
        va: VirtualAddress,
        value: u8,
    ) -> Result<(), VmError> {
        let (page, offset) = va.split::<S>();
        let mut paging = self.paging.lock();
        let frame = paging.translate(banks, page)?;
        Ok(banks.ram().write_byte(frame.join(offset), value)?)
    }

    /// Release every frame this descriptor owns and reset its page table.
    ///
    /// Safe to call repeatedly. Areas and regions are left alone.
    ///
    /// # Errors
    /// The first store error hit while releasing; the remaining frames are
    /// released regardless.
    pub fn release_all(&self, banks: &MemoryBanks<S>) -> Result<(), VmError> {
        self.paging.lock().release_all(banks)
    }

    /// Snapshot of area `id`.
    #[must_use]
    pub fn area(&self, id: AreaId) -> Option<VirtualArea> {
        self.layout.lock().areas.get(id).cloned()
    }

    /// Number of configured areas.
    #[must_use]
    pub fn area_count(&self) -> usize {
        self.layout.lock().areas.len()
    }

    /// The region bound to `handle`, if any.
    ///
    /// # Errors
    /// [`VmError::InvalidHandle`] if `handle` is out of range.
    pub fn region(&self, handle: usize) -> Result<Option<Region>, VmError> {
        self.layout.lock().regions.get(handle)
    }

    /// Every bound handle and its region.
    #[must_use]
    pub fn regions(&self) -> Vec<(usize, Region)> {
        self.layout.lock().regions.iter().collect()
    }

    /// Decoded page table entry for `page`, or `None` past the table.
    #[must_use]
    pub fn page_state(&self, page: PageNumber) -> Option<PageState> {
        self.paging.lock().table().get(page).map(PageTableEntry::state)
    }

    /// Resident pages, oldest first.
    #[must_use]
    pub fn resident_pages(&self) -> Vec<PageNumber> {
        self.paging.lock().resident_pages()
    }

    /// Log every mapped page table entry at debug level.
    pub fn dump_page_table(&self) {
        if log_enabled!(log::Level::Debug) {
            self.paging.lock().dump();
        }
    }
}
