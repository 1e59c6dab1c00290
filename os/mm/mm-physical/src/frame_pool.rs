//! Free-frame bookkeeping for one physical store.
//!
//! Frames are handed out in FIFO order from a queue that starts out as
//! `0..frames`. A parallel bitmap records pool membership so that a frame
//! cannot be released twice.

use crate::PhysicalError;
use mm_addresses::FrameNumber;
use std::collections::VecDeque;

pub(crate) struct FramePool {
    free: VecDeque<FrameNumber>,
    /// `true` while the frame sits in `free`.
    in_pool: Vec<bool>,
}

impl FramePool {
    pub(crate) fn new(frames: u32) -> Self {
        Self {
            free: (0..frames).map(FrameNumber::new).collect(),
            in_pool: vec![true; frames as usize],
        }
    }

    pub(crate) fn acquire(&mut self) -> Result<FrameNumber, PhysicalError> {
        let frame = self.free.pop_front().ok_or(PhysicalError::NoFramesLeft)?;
        self.in_pool[frame.as_usize()] = false;
        Ok(frame)
    }

    pub(crate) fn release(&mut self, frame: FrameNumber) -> Result<(), PhysicalError> {
        let slot = self
            .in_pool
            .get_mut(frame.as_usize())
            .ok_or(PhysicalError::FrameOutOfRange(frame))?;
        if *slot {
            return Err(PhysicalError::FrameAlreadyFree(frame));
        }
        *slot = true;
        self.free.push_back(frame);
        Ok(())
    }

    pub(crate) fn free_count(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn is_free(&self, frame: FrameNumber) -> bool {
        self.in_pool.get(frame.as_usize()).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_come_out_in_order() {
        let mut pool = FramePool::new(3);
        assert_eq!(pool.acquire(), Ok(FrameNumber::new(0)));
        assert_eq!(pool.acquire(), Ok(FrameNumber::new(1)));
        assert_eq!(pool.acquire(), Ok(FrameNumber::new(2)));
        assert_eq!(pool.acquire(), Err(PhysicalError::NoFramesLeft));
    }

    #[test]
    fn released_frames_go_to_the_back() {
        let mut pool = FramePool::new(2);
        let a = pool.acquire().unwrap();
        pool.release(a).unwrap();
        assert_eq!(pool.acquire(), Ok(FrameNumber::new(1)));
        assert_eq!(pool.acquire(), Ok(a));
    }

    #[test]
    fn double_release_is_rejected() {
        let mut pool = FramePool::new(2);
        let a = pool.acquire().unwrap();
        pool.release(a).unwrap();
        assert_eq!(pool.release(a), Err(PhysicalError::FrameAlreadyFree(a)));
        assert_eq!(
            pool.release(FrameNumber::new(9)),
            Err(PhysicalError::FrameOutOfRange(FrameNumber::new(9)))
        );
        assert_eq!(pool.free_count(), 2);
        assert!(pool.is_free(a));
    }
}
