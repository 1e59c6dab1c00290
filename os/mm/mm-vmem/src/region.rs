//! # Regions and the Region Symbol Table
//!
//! A region is a half-open byte range `[start, end)` of virtual addresses.
//! The same shape plays two roles, kept apart by type:
//!
//! - [`FreeRegion`]: a reusable hole on an area's free list.
//! - [`Region`]: a live allocation bound to a handle in the [`RegionTable`].
//!
//! ```text
//!  handle   slot
//!    0   →  Some(Region [0x000, 0x0C8))
//!    1   →  None
//!    2   →  Some(Region [0x100, 0x164))
//!   ...
//! ```

use crate::VmError;
use core::fmt;
use mm_addresses::VirtualAddress;

/// Half-open range of virtual addresses.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Interval {
    start: VirtualAddress,
    end: VirtualAddress,
}

impl Interval {
    /// Create `[start, end)`. `start <= end` is checked in debug builds.
    #[inline]
    #[must_use]
    pub const fn new(start: VirtualAddress, end: VirtualAddress) -> Self {
        debug_assert!(start.as_u32() <= end.as_u32());
        Self { start, end }
    }

    /// Create `[start, start + len)`, or `None` if the end overflows.
    #[inline]
    #[must_use]
    pub const fn with_len(start: VirtualAddress, len: u32) -> Option<Self> {
        match start.checked_add(len) {
            Some(end) => Some(Self { start, end }),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(self) -> VirtualAddress {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(self) -> VirtualAddress {
        self.end
    }

    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end.as_u32() - self.start.as_u32()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.as_u32() == self.end.as_u32()
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, addr: VirtualAddress) -> bool {
        self.start.as_u32() <= addr.as_u32() && addr.as_u32() < self.end.as_u32()
    }

    /// Whether `other` lies entirely inside this range.
    #[inline]
    #[must_use]
    pub const fn encloses(self, other: Self) -> bool {
        self.start.as_u32() <= other.start.as_u32() && other.end.as_u32() <= self.end.as_u32()
    }

    /// Whether the two ranges share at least one byte.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && other.start.as_u32() < self.end.as_u32()
            && self.start.as_u32() < other.end.as_u32()
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A reusable range on an area's free list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FreeRegion(Interval);

impl FreeRegion {
    #[inline]
    #[must_use]
    pub const fn new(range: Interval) -> Self {
        Self(range)
    }

    #[inline]
    #[must_use]
    pub const fn range(self) -> Interval {
        self.0
    }
}

/// A live allocation bound to a region handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Region(Interval);

impl Region {
    #[inline]
    #[must_use]
    pub const fn new(range: Interval) -> Self {
        Self(range)
    }

    #[inline]
    #[must_use]
    pub const fn range(self) -> Interval {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn start(self) -> VirtualAddress {
        self.0.start()
    }

    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0.is_empty()
    }
}

/// Fixed-capacity map from small integer handles to live regions.
#[derive(Clone, Debug)]
pub struct RegionTable {
    slots: Vec<Option<Region>>,
}

impl RegionTable {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reject handles outside `0..capacity`.
    ///
    /// # Errors
    /// [`VmError::InvalidHandle`].
    pub fn check_handle(&self, handle: usize) -> Result<(), VmError> {
        if handle < self.slots.len() {
            Ok(())
        } else {
            Err(VmError::InvalidHandle {
                handle,
                capacity: self.slots.len(),
            })
        }
    }

    /// The region bound to `handle`, if any.
    ///
    /// # Errors
    /// [`VmError::InvalidHandle`] if `handle` is out of range.
    pub fn get(&self, handle: usize) -> Result<Option<Region>, VmError> {
        self.check_handle(handle)?;
        Ok(self.slots[handle])
    }

    /// Bind `region` to `handle` and return whatever was bound before.
    ///
    /// # Errors
    /// [`VmError::InvalidHandle`] if `handle` is out of range.
    pub fn bind(&mut self, handle: usize, region: Region) -> Result<Option<Region>, VmError> {
        self.check_handle(handle)?;
        Ok(self.slots[handle].replace(region))
    }

    /// Empty the slot and return the region it held.
    ///
    /// # Errors
    /// [`VmError::InvalidHandle`] if `handle` is out of range,
    /// [`VmError::InvalidRegion`] if the slot is already empty.
    pub fn unbind(&mut self, handle: usize) -> Result<Region, VmError> {
        self.check_handle(handle)?;
        self.slots[handle]
            .take()
            .ok_or(VmError::InvalidRegion(handle))
    }

    /// Virtual address of byte `offset` inside the region bound to `handle`.
    ///
    /// # Errors
    /// [`VmError::InvalidHandle`], [`VmError::InvalidRegion`] for an empty
    /// slot, [`VmError::OutOfBoundsOffset`] if `offset` is past the end.
    pub fn resolve(&self, handle: usize, offset: u32) -> Result<VirtualAddress, VmError> {
        let region = self.get(handle)?.ok_or(VmError::InvalidRegion(handle))?;
        if offset >= region.len() {
            return Err(VmError::OutOfBoundsOffset {
                handle,
                offset,
                len: region.len(),
            });
        }
        Ok(region.start() + offset)
    }

    /// Every bound slot in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Region)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(handle, slot)| slot.map(|region| (handle, region)))
    }
}
