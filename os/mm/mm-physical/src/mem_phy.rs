use crate::frame_pool::FramePool;
use crate::{PhysicalError, PhysicalStore};
use log::debug;
use mm_addresses::{FrameNumber, PageSize, PhysicalAddress};
use spin::Mutex;
use std::marker::PhantomData;

/// Byte-addressable simulated memory device (RAM or SWAP).
///
/// Storage and free pool live behind one spin mutex, so a `MemPhy` can be
/// shared between process threads through an `Arc` and every operation takes
/// `&self`.
pub struct MemPhy<S: PageSize> {
    inner: Mutex<Inner>,
    frames: u32,
    _page: PhantomData<S>,
}

struct Inner {
    storage: Vec<u8>,
    pool: FramePool,
}

impl<S: PageSize> MemPhy<S> {
    /// Create a zero-filled store of `frames` frames, all of them free.
    #[must_use]
    pub fn new(frames: u32) -> Self {
        let bytes = frames as usize * S::SIZE as usize;
        Self {
            inner: Mutex::new(Inner {
                storage: vec![0; bytes],
                pool: FramePool::new(frames),
            }),
            frames,
            _page: PhantomData,
        }
    }

    /// Create a store covering `bytes` bytes; a trailing partial frame is dropped.
    #[must_use]
    pub fn with_size(bytes: u32) -> Self {
        Self::new(bytes / S::SIZE)
    }

    /// Size of the store in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.frames as usize * S::SIZE as usize
    }

    /// Whether `frame` currently sits in the free pool.
    #[must_use]
    pub fn is_free(&self, frame: FrameNumber) -> bool {
        self.inner.lock().pool.is_free(frame)
    }

    /// Log every non-zero byte of the store.
    pub fn dump(&self) {
        let inner = self.inner.lock();
        debug!(
            "memphy: {} frames of {} bytes, {} free",
            self.frames,
            S::SIZE,
            inner.pool.free_count()
        );
        for (addr, byte) in inner.storage.iter().enumerate().filter(|(_, b)| **b != 0) {
            debug!("  {addr:#010X}: {byte:#04X}");
        }
    }

    fn check_frame(&self, frame: FrameNumber) -> Result<core::ops::Range<usize>, PhysicalError> {
        if frame.as_u32() >= self.frames {
            return Err(PhysicalError::FrameOutOfRange(frame));
        }
        let start = frame.base::<S>().as_usize();
        Ok(start..start + S::SIZE as usize)
    }

    fn check_buffer(len: usize) -> Result<(), PhysicalError> {
        if len == S::SIZE as usize {
            Ok(())
        } else {
            Err(PhysicalError::FrameBufferSize {
                expected: S::SIZE as usize,
                actual: len,
            })
        }
    }
}

impl<S: PageSize> PhysicalStore<S> for MemPhy<S> {
    fn read_byte(&self, addr: PhysicalAddress) -> Result<u8, PhysicalError> {
        self.inner
            .lock()
            .storage
            .get(addr.as_usize())
            .copied()
            .ok_or(PhysicalError::AddressOutOfRange(addr))
    }

    fn write_byte(&self, addr: PhysicalAddress, value: u8) -> Result<(), PhysicalError> {
        let mut inner = self.inner.lock();
        let byte = inner
            .storage
            .get_mut(addr.as_usize())
            .ok_or(PhysicalError::AddressOutOfRange(addr))?;
        *byte = value;
        Ok(())
    }

    fn read_frame(&self, frame: FrameNumber, buf: &mut [u8]) -> Result<(), PhysicalError> {
        Self::check_buffer(buf.len())?;
        let range = self.check_frame(frame)?;
        buf.copy_from_slice(&self.inner.lock().storage[range]);
        Ok(())
    }

    fn write_frame(&self, frame: FrameNumber, data: &[u8]) -> Result<(), PhysicalError> {
        Self::check_buffer(data.len())?;
        let range = self.check_frame(frame)?;
        self.inner.lock().storage[range].copy_from_slice(data);
        Ok(())
    }

    fn zero_frame(&self, frame: FrameNumber) -> Result<(), PhysicalError> {
        let range = self.check_frame(frame)?;
        self.inner.lock().storage[range].fill(0);
        Ok(())
    }

    fn acquire_free_frame(&self) -> Result<FrameNumber, PhysicalError> {
        self.inner.lock().pool.acquire()
    }

    fn release_frame(&self, frame: FrameNumber) -> Result<(), PhysicalError> {
        self.inner.lock().pool.release(frame)
    }

    fn frame_count(&self) -> u32 {
        self.frames
    }

    #[allow(clippy::cast_possible_truncation)]
    fn free_frame_count(&self) -> u32 {
        self.inner.lock().pool.free_count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_addresses::{PageOffset, Size256};

    #[test]
    fn starts_zeroed_and_fully_free() {
        let ram = MemPhy::<Size256>::new(4);
        assert_eq!(ram.size(), 1024);
        assert_eq!(ram.frame_count(), 4);
        assert_eq!(ram.free_frame_count(), 4);
        assert_eq!(ram.read_byte(PhysicalAddress::new(1023)), Ok(0));
    }

    #[test]
    fn with_size_drops_partial_frames() {
        let ram = MemPhy::<Size256>::with_size(1000);
        assert_eq!(ram.frame_count(), 3);
    }

    #[test]
    fn byte_io_is_bounds_checked() {
        let ram = MemPhy::<Size256>::new(1);
        let pa = FrameNumber::new(0).join(PageOffset::<Size256>::new(10));
        ram.write_byte(pa, 0xAB).unwrap();
        assert_eq!(ram.read_byte(pa), Ok(0xAB));

        let outside = PhysicalAddress::new(256);
        assert_eq!(
            ram.read_byte(outside),
            Err(PhysicalError::AddressOutOfRange(outside))
        );
        assert_eq!(
            ram.write_byte(outside, 1),
            Err(PhysicalError::AddressOutOfRange(outside))
        );
    }

    #[test]
    fn frame_io_moves_whole_pages() {
        let ram = MemPhy::<Size256>::new(2);
        let page: Vec<u8> = (0..=255).collect();
        ram.write_frame(FrameNumber::new(1), &page).unwrap();

        let mut buf = vec![0; 256];
        ram.read_frame(FrameNumber::new(1), &mut buf).unwrap();
        assert_eq!(buf, page);
        assert_eq!(ram.read_byte(PhysicalAddress::new(256 + 200)), Ok(200));

        ram.zero_frame(FrameNumber::new(1)).unwrap();
        assert_eq!(ram.read_byte(PhysicalAddress::new(256 + 200)), Ok(0));
    }

    #[test]
    fn frame_io_rejects_bad_buffers_and_frames() {
        let ram = MemPhy::<Size256>::new(1);
        let mut short = vec![0; 10];
        assert_eq!(
            ram.read_frame(FrameNumber::new(0), &mut short),
            Err(PhysicalError::FrameBufferSize {
                expected: 256,
                actual: 10
            })
        );
        let page = vec![0; 256];
        assert_eq!(
            ram.write_frame(FrameNumber::new(1), &page),
            Err(PhysicalError::FrameOutOfRange(FrameNumber::new(1)))
        );
    }

    #[test]
    fn acquire_and_release_track_ownership() {
        let ram = MemPhy::<Size256>::new(2);
        let a = ram.acquire_free_frame().unwrap();
        let b = ram.acquire_free_frame().unwrap();
        assert_ne!(a, b);
        assert_eq!(ram.acquire_free_frame(), Err(PhysicalError::NoFramesLeft));
        assert!(!ram.is_free(a));

        ram.release_frame(a).unwrap();
        assert!(ram.is_free(a));
        assert_eq!(ram.free_frame_count(), 1);
        assert_eq!(
            ram.release_frame(a),
            Err(PhysicalError::FrameAlreadyFree(a))
        );
    }
}
