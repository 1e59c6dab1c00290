use crate::{PageNumber, PageOffset, PageSize};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Virtual memory address inside a simulated process address space.
///
/// A thin wrapper around `u32` that denotes **virtual** addresses. It carries
/// the *kind* of address at the type level so virtual and physical values are
/// never mixed.
///
/// ### Semantics
/// - Use [`VirtualAddress::page`] / [`VirtualAddress::offset`] / [`VirtualAddress::split`]
///   to derive the page number and the in-page offset for a concrete [`PageSize`].
/// - Combine a [`PageNumber`] and a [`PageOffset<S>`] with
///   [`PageNumber::join`] to reconstruct a `VirtualAddress`.
///
/// ### Examples
/// ```rust
/// # use mm_addresses::*;
/// let va = VirtualAddress::new(0x1234);
/// let (pgn, off) = va.split::<Size256>();
/// assert_eq!(pgn.as_u32(), 0x12);
/// assert_eq!(off.as_u32(), 0x34);
/// assert_eq!(pgn.join(off), va);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(u32);

impl VirtualAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The page number containing this address.
    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> PageNumber {
        PageNumber::new(self.0 >> S::SHIFT)
    }

    #[inline]
    #[must_use]
    pub const fn offset<S: PageSize>(self) -> PageOffset<S> {
        PageOffset::from_raw_address(self.0)
    }

    #[inline]
    #[must_use]
    pub const fn split<S: PageSize>(self) -> (PageNumber, PageOffset<S>) {
        (self.page::<S>(), self.offset::<S>())
    }

    /// Checked add of a byte count, returning `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u32) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Distance in bytes from `earlier` up to `self`, `None` if `earlier > self`.
    #[inline]
    #[must_use]
    pub const fn checked_distance(self, earlier: Self) -> Option<u32> {
        self.0.checked_sub(earlier.0)
    }

    #[inline]
    #[must_use]
    pub const fn is_aligned<S: PageSize>(self) -> bool {
        self.0 & (S::SIZE - 1) == 0
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:08X})", self.0)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<u32> for VirtualAddress {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}

impl Add<u32> for VirtualAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u32> for VirtualAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u32) {
        self.0 += rhs;
    }
}
