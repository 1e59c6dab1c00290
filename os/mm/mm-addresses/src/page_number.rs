use crate::{PageOffset, PageSize, PhysicalAddress, VirtualAddress};
use core::fmt;

/// Virtual page number (PGN): index of a page in a process page table.
///
/// ### Examples
/// ```rust
/// # use mm_addresses::*;
/// let pgn = PageNumber::new(3);
/// assert_eq!(pgn.base::<Size256>().as_u32(), 768);
/// assert_eq!(pgn.join(PageOffset::<Size256>::new(5)).as_u32(), 773);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageNumber(u32);

impl PageNumber {
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

    /// Return the page number as `usize` for table access.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// First virtual address of this page.
    #[inline]
    #[must_use]
    pub const fn base<S: PageSize>(self) -> VirtualAddress {
        VirtualAddress::new(self.0 << S::SHIFT)
    }

    #[inline]
    #[must_use]
    pub const fn join<S: PageSize>(self, off: PageOffset<S>) -> VirtualAddress {
        VirtualAddress::new((self.0 << S::SHIFT) | off.as_u32())
    }

    /// The page number `n` pages after this one, `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, n: u32) -> Option<Self> {
        match self.0.checked_add(n) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Debug for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PGN({})", self.0)
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for PageNumber {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}

/// Physical frame number (FPN): index of a page-sized slot in a physical store.
///
/// The same type numbers frames in RAM and in SWAP; which store a frame
/// belongs to is tracked by whoever holds it.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrameNumber(u32);

impl FrameNumber {
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

    /// First physical address of this frame.
    #[inline]
    #[must_use]
    pub const fn base<S: PageSize>(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 << S::SHIFT)
    }

    /// Combine with an in-page offset: `frame * S::SIZE + offset`.
    #[inline]
    #[must_use]
    pub const fn join<S: PageSize>(self, off: PageOffset<S>) -> PhysicalAddress {
        PhysicalAddress::new((self.0 << S::SHIFT) | off.as_u32())
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FPN({})", self.0)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for FrameNumber {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}
