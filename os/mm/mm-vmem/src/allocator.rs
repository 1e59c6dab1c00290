//! # Region Allocator
//!
//! Allocation is first-fit over the area's free list, falling back to growing
//! the area:
//!
//! ```text
//! allocate(size, handle)
//!   ├─ free list has a node ≥ size ──► carve [node.start, node.start + size)
//!   └─ otherwise ── grow(area, size) ──► [old_end, old_end + size)
//!                       │
//!                       ├─ round size up to whole pages
//!                       ├─ reject overlap with free lists and other areas
//!                       ├─ map the new pages (RAM, then swap)
//!                       └─ commit break/end, slack → free list
//! ```
//!
//! The whole allocate-or-grow sequence runs under one lock shared by every
//! descriptor, so concurrent growth of different processes never interleaves.

use crate::area::AreaId;
use crate::banks::MemoryBanks;
use crate::descriptor::{AddressLayout, MemoryDescriptor};
use crate::region::{Interval, Region};
use crate::VmError;
use log::{debug, warn};
use mm_addresses::{PageSize, VirtualAddress, align_up};
use spin::Mutex;

/// Serializes allocation and growth across all descriptors.
static ALLOCATION_LOCK: Mutex<()> = Mutex::new(());

impl<S: PageSize> MemoryDescriptor<S> {
    /// Allocate `size` bytes in area `area` and bind them to `handle`.
    ///
    /// If `handle` is already bound the binding is replaced; the old range is
    /// not returned to the free list.
    ///
    /// # Errors
    /// - [`VmError::InvalidSize`] for `size == 0`
    /// - [`VmError::InvalidHandle`] if `handle` is out of range
    /// - [`VmError::AreaNotFound`] if the area does not exist
    /// - [`VmError::GrowthFailed`] if the area had to grow and could not
    pub fn allocate(
        &self,
        banks: &MemoryBanks<S>,
        area: AreaId,
        size: u32,
        handle: usize,
    ) -> Result<VirtualAddress, VmError> {
        if size == 0 {
            return Err(VmError::InvalidSize);
        }

        let _serial = ALLOCATION_LOCK.lock();
        let mut layout = self.layout.lock();
        layout.regions.check_handle(handle)?;

        let reused = layout.area_mut(area)?.free_list_mut().take_first_fit(size);
        let range = if let Some(range) = reused {
            range
        } else {
            let old_end = layout.area(area)?.end();
            self.grow_locked(&mut layout, banks, area, size)
                .map_err(|source| VmError::GrowthFailed {
                    area,
                    source: Box::new(source),
                })?;
            Interval::with_len(old_end, size)
                .ok_or(VmError::InvariantViolation("grown range overflows"))?
        };

        if let Some(old) = layout.regions.bind(handle, Region::new(range))? {
            warn!("region {handle} rebound, dropping {}", old.range());
        }
        debug!(
            "alloc area={area} handle={handle} size={size} -> {range}{}",
            if reused.is_some() { " (reused)" } else { "" }
        );
        Ok(range.start())
    }

    /// Unbind `handle` and put its range on the front of the area's free list.
    ///
    /// # Errors
    /// [`VmError::AreaNotFound`], [`VmError::InvalidHandle`], or
    /// [`VmError::InvalidRegion`] if nothing is bound to `handle` or the bound
    /// region lies outside `area`. The slot stays bound on error.
    pub fn free(&self, area: AreaId, handle: usize) -> Result<(), VmError> {
        let mut layout = self.layout.lock();
        let committed = layout.area(area)?.committed();
        let bound = layout
            .regions
            .get(handle)?
            .ok_or(VmError::InvalidRegion(handle))?;
        if !committed.encloses(bound.range()) {
            warn!("region {handle} {} is not part of area {area}", bound.range());
            return Err(VmError::InvalidRegion(handle));
        }
        let region = layout.regions.unbind(handle)?;
        layout.area_mut(area)?.free_list_mut().push_front(region.range());
        debug!("free area={area} handle={handle} {}", region.range());
        Ok(())
    }

    /// Grow area `area` by `size` bytes rounded up to whole pages and map the
    /// new pages. Returns the rounded size.
    ///
    /// # Errors
    /// - [`VmError::InvalidSize`] for `size == 0`
    /// - [`VmError::AreaNotFound`] if the area does not exist
    /// - [`VmError::AddressOutOfRange`] past the address space or page table
    /// - [`VmError::OverlapDetected`] if the new range is already claimed
    /// - [`VmError::MappingFailed`] if RAM and swap are both exhausted
    pub fn grow(&self, banks: &MemoryBanks<S>, area: AreaId, size: u32) -> Result<u32, VmError> {
        if size == 0 {
            return Err(VmError::InvalidSize);
        }
        let _serial = ALLOCATION_LOCK.lock();
        let mut layout = self.layout.lock();
        self.grow_locked(&mut layout, banks, area, size)
    }

    /// Virtual address of byte `offset` of the region bound to `handle`.
    ///
    /// # Errors
    /// [`VmError::InvalidHandle`], [`VmError::InvalidRegion`], or
    /// [`VmError::OutOfBoundsOffset`].
    pub fn resolve(&self, handle: usize, offset: u32) -> Result<VirtualAddress, VmError> {
        self.layout.lock().regions.resolve(handle, offset)
    }

    fn grow_locked(
        &self,
        layout: &mut AddressLayout,
        banks: &MemoryBanks<S>,
        area: AreaId,
        size: u32,
    ) -> Result<u32, VmError> {
        let old_end = layout.area(area)?.end();
        let out_of_range = VmError::AddressOutOfRange(old_end);
        let Some(aligned) = align_up::<S>(size) else {
            return Err(out_of_range);
        };
        let Some(candidate) = Interval::with_len(old_end, aligned) else {
            return Err(out_of_range);
        };
        if candidate.end().page::<S>().as_u32() > self.paging.lock().table().len() {
            return Err(out_of_range);
        }

        for other in &layout.areas {
            let claimed = other.free_list().overlaps(candidate)
                || (other.id() != area && other.blocks(candidate));
            if claimed {
                return Err(VmError::OverlapDetected {
                    start: candidate.start(),
                    end: candidate.end(),
                });
            }
        }

        self.paging
            .lock()
            .map_pages(banks, old_end.page::<S>(), aligned >> S::SHIFT)?;

        let new_break = old_end + size;
        layout.area_mut(area)?.commit_growth(new_break, candidate.end());
        debug!("grow area={area} by {size} ({aligned} aligned) -> {candidate}");
        Ok(aligned)
    }
}
