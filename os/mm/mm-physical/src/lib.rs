//! # Simulated Physical Memory
//!
//! The physical layer underneath the paging simulator: fixed-size byte
//! arrays standing in for RAM and SWAP devices, each with its own pool of
//! free frames.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          mm-vmem (page table, faults)        │
//! └──────────────────────┬───────────────────────┘
//!                        │ PhysicalStore<S>
//! ┌──────────────────────▼───────────────────────┐
//! │  MemPhy<S>: storage [u8] + FIFO frame pool   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The virtual memory layer only sees the [`PhysicalStore`] trait. It reads
//! and writes single bytes for program accesses and whole frames when pages
//! move between RAM and SWAP.
//!
//! ## Usage
//! ```rust
//! use mm_addresses::{PhysicalAddress, Size256};
//! use mm_physical::{MemPhy, PhysicalStore};
//!
//! let ram = MemPhy::<Size256>::new(4);
//! let frame = ram.acquire_free_frame()?;
//! ram.write_byte(frame.base::<Size256>(), 42)?;
//! assert_eq!(ram.read_byte(frame.base::<Size256>())?, 42);
//! ram.release_frame(frame)?;
//! # Ok::<(), mm_physical::PhysicalError>(())
//! ```

mod error;
mod frame_pool;
mod mem_phy;

pub use crate::error::PhysicalError;
pub use crate::mem_phy::MemPhy;

use mm_addresses::{FrameNumber, PageSize, PhysicalAddress};

/// A byte-addressable physical device with a pool of free frames of size `S`.
///
/// Implementations synchronize internally; all methods take `&self`.
pub trait PhysicalStore<S: PageSize>: Send + Sync {
    /// Read one byte.
    ///
    /// # Errors
    /// [`PhysicalError::AddressOutOfRange`] if `addr` lies outside the store.
    fn read_byte(&self, addr: PhysicalAddress) -> Result<u8, PhysicalError>;

    /// Write one byte.
    ///
    /// # Errors
    /// [`PhysicalError::AddressOutOfRange`] if `addr` lies outside the store.
    fn write_byte(&self, addr: PhysicalAddress, value: u8) -> Result<(), PhysicalError>;

    /// Copy frame `frame` into `buf` (`S::SIZE` bytes).
    ///
    /// # Errors
    /// Fails if the frame is outside the store or `buf` has the wrong length.
    fn read_frame(&self, frame: FrameNumber, buf: &mut [u8]) -> Result<(), PhysicalError>;

    /// Overwrite frame `frame` with `data` (`S::SIZE` bytes).
    ///
    /// # Errors
    /// Fails if the frame is outside the store or `data` has the wrong length.
    fn write_frame(&self, frame: FrameNumber, data: &[u8]) -> Result<(), PhysicalError>;

    /// Fill frame `frame` with zeros.
    ///
    /// # Errors
    /// [`PhysicalError::FrameOutOfRange`] if the frame is outside the store.
    fn zero_frame(&self, frame: FrameNumber) -> Result<(), PhysicalError> {
        let zeros = vec![0; S::SIZE as usize];
        self.write_frame(frame, &zeros)
    }

    /// Take a frame out of the free pool.
    ///
    /// # Errors
    /// [`PhysicalError::NoFramesLeft`] if the pool is empty.
    fn acquire_free_frame(&self) -> Result<FrameNumber, PhysicalError>;

    /// Return a frame to the free pool.
    ///
    /// # Errors
    /// Fails if the frame is outside the store or already free.
    fn release_frame(&self, frame: FrameNumber) -> Result<(), PhysicalError>;

    /// Total number of frames.
    fn frame_count(&self) -> u32;

    /// Number of frames currently in the free pool.
    fn free_frame_count(&self) -> u32;
}
