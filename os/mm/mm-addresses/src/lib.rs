//! # Simulated Virtual and Physical Memory Address Types
//!
//! Strongly typed wrappers for the 32-bit addresses, page numbers and frame
//! numbers used by the paging simulator.
//!
//! ## Overview
//!
//! | Type | Description |
//! |------|-------------|
//! | [`VirtualAddress`] | A byte address inside a process's virtual address space. |
//! | [`PhysicalAddress`] | A byte address inside a RAM or SWAP store. |
//! | [`PageNumber`] | Index of a virtual page (PGN). |
//! | [`FrameNumber`] | Index of a physical frame (FPN). |
//! | [`PageOffset<S>`] | An offset within a page of size `S`. |
//!
//! ## Page Sizes
//!
//! Page sizes are marker types implementing the sealed [`PageSize`] trait:
//!
//! - [`Size256`]: 256 byte pages (the simulator default)
//! - [`Size512`]: 512 byte pages
//! - [`Size4K`]: 4 KiB pages
//!
//! ## Typical Usage
//!
//! ```rust
//! # use mm_addresses::*;
//! let va = VirtualAddress::new(300);
//! let (pgn, off) = va.split::<Size256>();
//! assert_eq!((pgn.as_u32(), off.as_u32()), (1, 44));
//!
//! // A resident frame turns the offset into a physical address.
//! let pa = FrameNumber::new(7).join(off);
//! assert_eq!(pa.as_u32(), 7 * 256 + 44);
//!
//! assert_eq!(align_up::<Size256>(300), Some(512));
//! assert_eq!(pages_for::<Size256>(300), 2);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod page_number;
mod page_offset;
mod page_size;
mod physical_address;
mod virtual_address;

pub use crate::page_number::{FrameNumber, PageNumber};
pub use crate::page_offset::PageOffset;
pub use crate::page_size::{PageSize, Size4K, Size256, Size512};
pub use crate::physical_address::PhysicalAddress;
pub use crate::virtual_address::VirtualAddress;

/// Round `bytes` up to the next multiple of `S::SIZE`.
///
/// Returns `None` if the result does not fit into 32 bits.
#[inline]
#[must_use]
pub const fn align_up<S: PageSize>(bytes: u32) -> Option<u32> {
    match bytes.checked_add(S::SIZE - 1) {
        Some(v) => Some(v & !(S::SIZE - 1)),
        None => None,
    }
}

/// Number of pages of size `S` needed to cover `bytes`.
#[inline]
#[must_use]
pub const fn pages_for<S: PageSize>(bytes: u32) -> u32 {
    bytes.div_ceil(S::SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_256() {
        let va = VirtualAddress::new(0x0003_41FF);
        let (pgn, off) = va.split::<Size256>();
        assert_eq!(pgn.as_u32(), 0x341);
        assert_eq!(off.as_u32(), 0xFF);
        assert_eq!(pgn.join(off), va);
    }

    #[test]
    fn split_and_join_4k() {
        let va = VirtualAddress::new(0x0012_3456);
        let (pgn, off) = va.split::<Size4K>();
        assert_eq!(pgn.as_u32(), 0x123);
        assert_eq!(off.as_u32(), 0x456);
        assert_eq!(pgn.base::<Size4K>().as_u32(), 0x0012_3000);
        assert_eq!(pgn.join(off), va);
    }

    #[test]
    fn frame_join_builds_physical_address() {
        let off = PageOffset::<Size512>::new(17);
        let pa = FrameNumber::new(4).join(off);
        assert_eq!(pa.as_u32(), 4 * 512 + 17);
        assert_eq!(pa.split::<Size512>(), (FrameNumber::new(4), off));
    }

    #[test]
    fn alignment_helpers() {
        assert_eq!(align_up::<Size256>(0), Some(0));
        assert_eq!(align_up::<Size256>(1), Some(256));
        assert_eq!(align_up::<Size256>(256), Some(256));
        assert_eq!(align_up::<Size256>(300), Some(512));
        assert_eq!(align_up::<Size256>(u32::MAX), None);

        assert_eq!(pages_for::<Size256>(0), 0);
        assert_eq!(pages_for::<Size256>(256), 1);
        assert_eq!(pages_for::<Size256>(257), 2);

        assert!(VirtualAddress::new(512).is_aligned::<Size256>());
        assert!(!VirtualAddress::new(300).is_aligned::<Size256>());
    }

    #[test]
    fn checked_arithmetic() {
        let va = VirtualAddress::new(u32::MAX - 1);
        assert_eq!(va.checked_add(1), Some(VirtualAddress::new(u32::MAX)));
        assert_eq!(va.checked_add(2), None);

        let lo = VirtualAddress::new(100);
        let hi = VirtualAddress::new(300);
        assert_eq!(hi.checked_distance(lo), Some(200));
        assert_eq!(lo.checked_distance(hi), None);

        assert_eq!(PageNumber::new(u32::MAX).checked_add(1), None);
    }
}
