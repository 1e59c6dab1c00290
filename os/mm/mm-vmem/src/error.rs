use crate::AreaId;
use mm_addresses::VirtualAddress;
use mm_physical::PhysicalError;

#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("region handle {handle} is outside the symbol table (capacity {capacity})")]
    InvalidHandle { handle: usize, capacity: usize },
    #[error("region handle {0} is not bound to a live region")]
    InvalidRegion(usize),
    #[error("virtual area {0} does not exist")]
    AreaNotFound(AreaId),
    #[error("range {start}..{end} overlaps memory already owned by the process")]
    OverlapDetected {
        start: VirtualAddress,
        end: VirtualAddress,
    },
    #[error("failed to grow virtual area {area}")]
    GrowthFailed {
        area: AreaId,
        #[source]
        source: Box<VmError>,
    },
    #[error("no free frames left")]
    NoFramesLeft,
    #[error("no resident page to evict")]
    NoVictimAvailable,
    #[error("failed to back {pages} new pages with frames")]
    MappingFailed {
        pages: u32,
        #[source]
        source: PhysicalError,
    },
    #[error("offset {offset} is outside region {handle} ({len} bytes)")]
    OutOfBoundsOffset { handle: usize, offset: u32, len: u32 },
    #[error("size must be non-zero")]
    InvalidSize,
    #[error("address {0} is outside the address space")]
    AddressOutOfRange(VirtualAddress),
    #[error("invalid memory configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
    #[error(transparent)]
    Physical(PhysicalError),
}

impl From<PhysicalError> for VmError {
    fn from(value: PhysicalError) -> Self {
        match value {
            PhysicalError::NoFramesLeft => Self::NoFramesLeft,
            other => Self::Physical(other),
        }
    }
}
