use crate::VmError;
use crate::pte::{MAX_RAM_FRAMES, MAX_SWAP_DEVICES, MAX_SWAP_FRAMES};
use mm_addresses::PageSize;
use mm_physical::PhysicalStore;
use std::sync::Arc;

/// Shared physical store handle.
pub type SharedStore<S> = Arc<dyn PhysicalStore<S>>;

/// The physical stores one process pages against: a RAM store and any
/// number of swap devices, one of which receives newly swapped pages.
///
/// Stores are shared: several processes normally hold clones of the same
/// `Arc`s.
pub struct MemoryBanks<S: PageSize> {
    ram: SharedStore<S>,
    swaps: Vec<SharedStore<S>>,
    active_swap: usize,
}

impl<S: PageSize> Clone for MemoryBanks<S> {
    fn clone(&self) -> Self {
        Self {
            ram: Arc::clone(&self.ram),
            swaps: self.swaps.clone(),
            active_swap: self.active_swap,
        }
    }
}

impl<S: PageSize> MemoryBanks<S> {
    /// Banks with RAM only. Add swap devices with [`with_swap`](Self::with_swap).
    #[must_use]
    pub fn new(ram: SharedStore<S>) -> Self {
        Self {
            ram,
            swaps: Vec::new(),
            active_swap: 0,
        }
    }

    /// Append a swap device. The first device added is the active one.
    #[must_use]
    pub fn with_swap(mut self, swap: SharedStore<S>) -> Self {
        self.swaps.push(swap);
        self
    }

    /// Direct new swap traffic to device `index`.
    ///
    /// # Errors
    /// [`VmError::InvalidConfig`] if there is no such device.
    pub fn set_active_swap(&mut self, index: usize) -> Result<(), VmError> {
        if index >= self.swaps.len() {
            return Err(VmError::InvalidConfig("no such swap device"));
        }
        self.active_swap = index;
        Ok(())
    }

    /// Check that every store can be addressed by a page table entry.
    ///
    /// # Errors
    /// [`VmError::InvalidConfig`] naming the offending store.
    pub fn validate(&self) -> Result<(), VmError> {
        if self.ram.frame_count() > MAX_RAM_FRAMES {
            return Err(VmError::InvalidConfig("RAM store has too many frames"));
        }
        if self.swaps.len() > MAX_SWAP_DEVICES {
            return Err(VmError::InvalidConfig("too many swap devices"));
        }
        if self.swaps.iter().any(|s| s.frame_count() > MAX_SWAP_FRAMES) {
            return Err(VmError::InvalidConfig("swap store has too many frames"));
        }
        Ok(())
    }

    #[must_use]
    pub fn ram(&self) -> &dyn PhysicalStore<S> {
        self.ram.as_ref()
    }

    /// Swap device `device` as recorded in a page table entry.
    ///
    /// # Errors
    /// [`VmError::InvariantViolation`] if the entry names an unknown device.
    pub fn swap(&self, device: u8) -> Result<&dyn PhysicalStore<S>, VmError> {
        self.swaps
            .get(usize::from(device))
            .map(Arc::as_ref)
            .ok_or(VmError::InvariantViolation(
                "page table entry names an unknown swap device",
            ))
    }

    /// Index and store of the active swap device, if there is one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn active_swap(&self) -> Option<(u8, &dyn PhysicalStore<S>)> {
        self.swaps
            .get(self.active_swap)
            .map(|s| (self.active_swap as u8, s.as_ref()))
    }

    #[must_use]
    pub fn swap_count(&self) -> usize {
        self.swaps.len()
    }
}
