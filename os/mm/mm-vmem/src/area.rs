use crate::free_list::FreeList;
use crate::region::Interval;
use mm_addresses::VirtualAddress;

/// Index of a virtual area inside its memory descriptor.
pub type AreaId = usize;

/// A contiguous, growable slice of a process's virtual address space.
///
/// ```text
///  start                 break_ptr        end
///    │◄──── committed ──────►│◄── slack ──►│
///    ├───────────────────────┼─────────────┤
/// ```
///
/// `[start, end)` is page aligned and mapped; `break_ptr` is where the last
/// growth request actually ended. Slack and freed regions sit on the free
/// list.
#[derive(Clone, Debug)]
pub struct VirtualArea {
    id: AreaId,
    start: VirtualAddress,
    end: VirtualAddress,
    break_ptr: VirtualAddress,
    free_list: FreeList,
}

impl VirtualArea {
    /// An empty area: `start == end == break_ptr`.
    #[must_use]
    pub const fn new(id: AreaId, start: VirtualAddress) -> Self {
        Self {
            id,
            start,
            end: start,
            break_ptr: start,
            free_list: FreeList::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> AreaId {
        self.id
    }

    #[must_use]
    pub const fn start(&self) -> VirtualAddress {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> VirtualAddress {
        self.end
    }

    #[must_use]
    pub const fn break_ptr(&self) -> VirtualAddress {
        self.break_ptr
    }

    /// The mapped span `[start, end)`.
    #[must_use]
    pub const fn committed(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    #[must_use]
    pub const fn free_list(&self) -> &FreeList {
        &self.free_list
    }

    pub(crate) const fn free_list_mut(&mut self) -> &mut FreeList {
        &mut self.free_list
    }

    /// Whether growing this area by `candidate` would collide with it.
    ///
    /// Besides the committed span, an area claims its own start address even
    /// while it is still empty.
    #[must_use]
    pub const fn blocks(&self, candidate: Interval) -> bool {
        self.committed().overlaps(candidate) || candidate.contains(self.start)
    }

    /// Extend the area to `new_end` after its pages were mapped.
    pub(crate) fn commit_growth(&mut self, new_break: VirtualAddress, new_end: VirtualAddress) {
        debug_assert!(self.end <= new_break && new_break <= new_end);
        self.break_ptr = new_break;
        self.end = new_end;
        self.free_list.push_front(Interval::new(new_break, new_end));
    }
}
