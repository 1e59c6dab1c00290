//! # Page Table Entries
//!
//! One 32-bit word per virtual page. The low 26 bits carry a payload whose
//! meaning depends on the two flag bits at the top:
//!
//! | Bits  | Present                | Swapped                         |
//! |-------|------------------------|---------------------------------|
//! | 0–4   | RAM frame number       | swap device index               |
//! | 5–25  | RAM frame number       | frame number on the swap device |
//! | 26–29 | reserved               | reserved                        |
//! | 30    | 0                      | 1                               |
//! | 31    | 1                      | 0                               |
//!
//! An entry with neither flag set has never been backed by a frame.
//! [`PageTableEntry::state`] is the only decoder; it consults the presence
//! bit before interpreting the payload.

use bitfield_struct::bitfield;
use core::fmt;
use mm_addresses::FrameNumber;

/// Number of payload bits available for a RAM frame number.
const FRAME_BITS: u32 = 26;
/// Number of payload bits holding the swap device index.
const SWAP_DEVICE_BITS: u32 = 5;

/// Largest RAM store a page table entry can address, in frames.
pub const MAX_RAM_FRAMES: u32 = 1 << FRAME_BITS;
/// Largest swap store a page table entry can address, in frames.
pub const MAX_SWAP_FRAMES: u32 = 1 << (FRAME_BITS - SWAP_DEVICE_BITS);
/// Number of swap devices a page table entry can tell apart.
pub const MAX_SWAP_DEVICES: usize = 1 << SWAP_DEVICE_BITS;

#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PageTableEntry {
    /// Frame number, or swap device and swap frame.
    #[bits(26)]
    payload: u32,

    #[bits(4)]
    __: u8,

    /// Page contents live on a swap device.
    swapped: bool,

    /// Page contents live in a RAM frame.
    present: bool,
}

/// A frame on one of the process's swap devices.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SwapSlot {
    /// Index into the process's list of swap devices.
    pub device: u8,
    pub frame: FrameNumber,
}

/// Decoded view of a [`PageTableEntry`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PageState {
    /// Never backed by a frame.
    Unmapped,
    /// Mapped to a RAM frame.
    Resident(FrameNumber),
    /// Paged out to a swap device.
    Swapped(SwapSlot),
}

impl SwapSlot {
    #[must_use]
    pub const fn new(device: u8, frame: FrameNumber) -> Self {
        Self { device, frame }
    }
}

impl PageTableEntry {
    /// An entry that was never backed by a frame.
    #[inline]
    #[must_use]
    pub const fn unmapped() -> Self {
        Self::new()
    }

    /// An entry mapping the page to RAM frame `frame`.
    ///
    /// `frame` must be below [`MAX_RAM_FRAMES`] (checked in debug builds).
    #[inline]
    #[must_use]
    pub const fn resident(frame: FrameNumber) -> Self {
        debug_assert!(frame.as_u32() < MAX_RAM_FRAMES);
        Self::new()
            .with_present(true)
            .with_payload(frame.as_u32() & (MAX_RAM_FRAMES - 1))
    }

    /// An entry pointing at a swap slot.
    ///
    /// The slot must fit the encoding (checked in debug builds).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn swapped_out(slot: SwapSlot) -> Self {
        debug_assert!((slot.device as usize) < MAX_SWAP_DEVICES);
        debug_assert!(slot.frame.as_u32() < MAX_SWAP_FRAMES);
        let device = slot.device as u32 & ((1 << SWAP_DEVICE_BITS) - 1);
        let frame = slot.frame.as_u32() & (MAX_SWAP_FRAMES - 1);
        Self::new()
            .with_swapped(true)
            .with_payload(device | (frame << SWAP_DEVICE_BITS))
    }

    #[inline]
    #[must_use]
    pub const fn is_present(self) -> bool {
        self.present()
    }

    /// Decode the entry.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn state(self) -> PageState {
        if self.present() {
            PageState::Resident(FrameNumber::new(self.payload()))
        } else if self.swapped() {
            let payload = self.payload();
            PageState::Swapped(SwapSlot {
                device: (payload & ((1 << SWAP_DEVICE_BITS) - 1)) as u8,
                frame: FrameNumber::new(payload >> SWAP_DEVICE_BITS),
            })
        } else {
            PageState::Unmapped
        }
    }

    /// Return the raw 32-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.into_bits()
    }
}

impl fmt::Display for SwapSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swap{}:{}", self.device, self.frame)
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmapped => f.write_str("unmapped"),
            Self::Resident(frame) => write!(f, "frame {frame}"),
            Self::Swapped(slot) => write!(f, "{slot}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_entry_is_unmapped() {
        let e = PageTableEntry::unmapped();
        assert_eq!(e.raw(), 0);
        assert!(!e.is_present());
        assert_eq!(e.state(), PageState::Unmapped);
    }

    #[test]
    fn resident_entry_sets_presence_bit() {
        let e = PageTableEntry::resident(FrameNumber::new(0x1234));
        assert!(e.is_present());
        assert_eq!(e.raw(), 0x8000_1234);
        assert_eq!(e.state(), PageState::Resident(FrameNumber::new(0x1234)));
    }

    #[test]
    fn swapped_entry_packs_device_and_frame() {
        let slot = SwapSlot::new(3, FrameNumber::new(77));
        let e = PageTableEntry::swapped_out(slot);
        assert!(!e.is_present());
        assert_eq!(e.raw(), 0x4000_0000 | (77 << 5) | 3);
        assert_eq!(e.state(), PageState::Swapped(slot));
    }

    #[test]
    fn largest_slots_round_trip() {
        let frame = FrameNumber::new(MAX_RAM_FRAMES - 1);
        assert_eq!(
            PageTableEntry::resident(frame).state(),
            PageState::Resident(frame)
        );

        #[allow(clippy::cast_possible_truncation)]
        let slot = SwapSlot::new(
            (MAX_SWAP_DEVICES - 1) as u8,
            FrameNumber::new(MAX_SWAP_FRAMES - 1),
        );
        assert_eq!(
            PageTableEntry::swapped_out(slot).state(),
            PageState::Swapped(slot)
        );
    }

    #[test]
    fn state_display() {
        assert_eq!(PageState::Unmapped.to_string(), "unmapped");
        assert_eq!(
            PageState::Resident(FrameNumber::new(4)).to_string(),
            "frame 4"
        );
        assert_eq!(
            PageState::Swapped(SwapSlot::new(1, FrameNumber::new(9))).to_string(),
            "swap1:9"
        );
    }
}
