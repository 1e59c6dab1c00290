use mm_addresses::{FrameNumber, PhysicalAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhysicalError {
    #[error("no free frames left")]
    NoFramesLeft,
    #[error("physical address {0} is outside the store")]
    AddressOutOfRange(PhysicalAddress),
    #[error("frame {0} is outside the store")]
    FrameOutOfRange(FrameNumber),
    #[error("frame {0} is already in the free pool")]
    FrameAlreadyFree(FrameNumber),
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    FrameBufferSize { expected: usize, actual: usize },
}
