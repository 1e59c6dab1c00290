use crate::area::AreaId;
use crate::banks::MemoryBanks;
use crate::config::MemoryConfig;
use crate::descriptor::MemoryDescriptor;
use crate::VmError;
use log::{debug, warn};
use mm_addresses::{FrameNumber, PageNumber, PageSize, Size256, VirtualAddress};

/// Area used by the named entry points.
pub const DEFAULT_AREA: AreaId = 0;

/// A simulated process: its memory descriptor plus the physical stores it
/// pages against.
///
/// Dropping a process releases all of its frames. Call
/// [`teardown`](Self::teardown) to observe release failures.
pub struct Process<S: PageSize = Size256> {
    pid: u32,
    mm: MemoryDescriptor<S>,
    banks: MemoryBanks<S>,
}

impl<S: PageSize> Process<S> {
    /// # Errors
    /// [`VmError::InvalidConfig`] if `config` or `banks` cannot be used.
    pub fn new(pid: u32, config: &MemoryConfig, banks: MemoryBanks<S>) -> Result<Self, VmError> {
        banks.validate()?;
        let mm = MemoryDescriptor::new(config)?;
        debug!("pid {pid}: created with {} areas", config.area_starts().len());
        Ok(Self { pid, mm, banks })
    }

    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    #[must_use]
    pub const fn mm(&self) -> &MemoryDescriptor<S> {
        &self.mm
    }

    #[must_use]
    pub const fn banks(&self) -> &MemoryBanks<S> {
        &self.banks
    }

    /// Allocate `size` bytes in the default area and bind them to `handle`.
    ///
    /// # Errors
    /// See [`MemoryDescriptor::allocate`].
    pub fn allocate_named(&self, size: u32, handle: usize) -> Result<VirtualAddress, VmError> {
        let addr = self.mm.allocate(&self.banks, DEFAULT_AREA, size, handle)?;
        debug!("pid {}: alloc {size} bytes as region {handle} at {addr}", self.pid);
        self.mm.dump_page_table();
        Ok(addr)
    }

    /// Release the region bound to `handle`.
    ///
    /// # Errors
    /// See [`MemoryDescriptor::free`].
    pub fn free_named(&self, handle: usize) -> Result<(), VmError> {
        self.mm.free(DEFAULT_AREA, handle)?;
        debug!("pid {}: free region {handle}", self.pid);
        self.mm.dump_page_table();
        Ok(())
    }

    /// Read byte `offset` of region `handle`.
    ///
    /// # Errors
    /// Resolution errors of [`MemoryDescriptor::resolve`] or fault errors of
    /// [`MemoryDescriptor::translate`].
    pub fn read_named(&self, handle: usize, offset: u32) -> Result<u8, VmError> {
        let addr = self.mm.resolve(handle, offset)?;
        let value = self.mm.read_byte(&self.banks, addr)?;
        debug!("pid {}: read region {handle}[{offset}] = {value:#04X}", self.pid);
        Ok(value)
    }

    /// Write `value` to byte `offset` of region `handle`.
    ///
    /// # Errors
    /// Same as [`read_named`](Self::read_named).
    pub fn write_named(&self, handle: usize, offset: u32, value: u8) -> Result<(), VmError> {
        let addr = self.mm.resolve(handle, offset)?;
        self.mm.write_byte(&self.banks, addr, value)?;
        debug!("pid {}: write region {handle}[{offset}] = {value:#04X}", self.pid);
        Ok(())
    }

    /// Grow area `area` by `size` bytes (rounded up to whole pages).
    ///
    /// # Errors
    /// See [`MemoryDescriptor::grow`].
    pub fn grow_area(&self, area: AreaId, size: u32) -> Result<u32, VmError> {
        self.mm.grow(&self.banks, area, size)
    }

    /// RAM frame currently backing `page`, faulting it in if needed.
    ///
    /// # Errors
    /// See [`MemoryDescriptor::translate`].
    pub fn translate(&self, page: PageNumber) -> Result<FrameNumber, VmError> {
        self.mm.translate(&self.banks, page)
    }

    /// Read the byte at a raw virtual address.
    ///
    /// # Errors
    /// See [`MemoryDescriptor::read_byte`].
    pub fn read_byte(&self, addr: VirtualAddress) -> Result<u8, VmError> {
        self.mm.read_byte(&self.banks, addr)
    }

    /// Write the byte at a raw virtual address.
    ///
    /// # Errors
    /// See [`MemoryDescriptor::write_byte`].
    pub fn write_byte(&self, addr: VirtualAddress, value: u8) -> Result<(), VmError> {
        self.mm.write_byte(&self.banks, addr, value)
    }

    /// Release every frame and report the first failure.
    ///
    /// # Errors
    /// See [`MemoryDescriptor::release_all`].
    pub fn teardown(self) -> Result<(), VmError> {
        self.mm.release_all(&self.banks)?;
        debug!("pid {}: torn down", self.pid);
        Ok(())
    }
}

impl<S: PageSize> Drop for Process<S> {
    fn drop(&mut self) {
        if let Err(e) = self.mm.release_all(&self.banks) {
            warn!("pid {}: failed to release memory: {e}", self.pid);
        }
    }
}
