//! Per-process memory layout parameters.

use crate::VmError;
use mm_addresses::{PageSize, VirtualAddress};

/// Default number of region handles per process.
pub const DEFAULT_REGION_SLOTS: usize = 30;

/// Default page table length: a 22-bit address bus at 256-byte pages.
pub const DEFAULT_MAX_PAGES: u32 = 1 << 14;

/// Shape of one process's virtual memory.
///
/// ```rust
/// use mm_vmem::MemoryConfig;
///
/// let config = MemoryConfig::default().with_region_slots(8);
/// assert_eq!(config.region_slots(), 8);
/// assert_eq!(config.area_starts().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryConfig {
    region_slots: usize,
    max_pages: u32,
    area_starts: Vec<VirtualAddress>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            region_slots: DEFAULT_REGION_SLOTS,
            max_pages: DEFAULT_MAX_PAGES,
            area_starts: vec![VirtualAddress::zero()],
        }
    }
}

impl MemoryConfig {
    #[must_use]
    pub fn with_region_slots(mut self, slots: usize) -> Self {
        self.region_slots = slots;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages;
        self
    }

    /// Replace the area list. Area `i` starts at `starts[i]`.
    #[must_use]
    pub fn with_area_starts(mut self, starts: impl Into<Vec<VirtualAddress>>) -> Self {
        self.area_starts = starts.into();
        self
    }

    #[must_use]
    pub const fn region_slots(&self) -> usize {
        self.region_slots
    }

    #[must_use]
    pub const fn max_pages(&self) -> u32 {
        self.max_pages
    }

    #[must_use]
    pub fn area_starts(&self) -> &[VirtualAddress] {
        &self.area_starts
    }

    /// Check the configuration against page size `S`.
    ///
    /// # Errors
    /// [`VmError::InvalidConfig`] naming the first problem found.
    pub fn validate<S: PageSize>(&self) -> Result<(), VmError> {
        if self.region_slots == 0 {
            return Err(VmError::InvalidConfig("region_slots must be non-zero"));
        }
        if self.max_pages == 0 {
            return Err(VmError::InvalidConfig("max_pages must be non-zero"));
        }
        if self.max_pages > (u32::MAX >> S::SHIFT) + 1 {
            return Err(VmError::InvalidConfig(
                "max_pages exceeds the 32-bit address space",
            ));
        }
        if self.area_starts.is_empty() {
            return Err(VmError::InvalidConfig("at least one area is required"));
        }
        for start in &self.area_starts {
            if !start.is_aligned::<S>() {
                return Err(VmError::InvalidConfig("area start is not page aligned"));
            }
            if start.page::<S>().as_u32() >= self.max_pages {
                return Err(VmError::InvalidConfig(
                    "area start lies beyond the page table",
                ));
            }
        }
        Ok(())
    }
}
