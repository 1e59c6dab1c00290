use crate::{FrameNumber, PageOffset, PageSize};
use core::fmt;

/// Physical memory address: a byte index into a RAM or SWAP store.
///
/// ### Examples
/// ```rust
/// # use mm_addresses::*;
/// let pa = PhysicalAddress::new(0x0342);
/// let (fpn, off) = pa.split::<Size256>();
/// assert_eq!(fpn.as_u32(), 3);
/// assert_eq!(fpn.join(off), pa);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u32);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// The frame containing this address.
    #[inline]
    #[must_use]
    pub const fn frame<S: PageSize>(self) -> FrameNumber {
        FrameNumber::new(self.0 >> S::SHIFT)
    }

    #[inline]
    #[must_use]
    pub const fn offset<S: PageSize>(self) -> PageOffset<S> {
        PageOffset::from_raw_address(self.0)
    }

    #[inline]
    #[must_use]
    pub const fn split<S: PageSize>(self) -> (FrameNumber, PageOffset<S>) {
        (self.frame::<S>(), self.offset::<S>())
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:08X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<u32> for PhysicalAddress {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}
