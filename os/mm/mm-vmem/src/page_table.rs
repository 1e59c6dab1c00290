use crate::pte::{PageState, PageTableEntry};
use mm_addresses::PageNumber;

/// Dense single-level page table: one entry per virtual page.
#[derive(Clone, Debug)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    /// A table of `pages` unmapped entries.
    #[must_use]
    pub fn new(pages: u32) -> Self {
        Self {
            entries: vec![PageTableEntry::unmapped(); pages as usize],
        }
    }

    /// Number of entries.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `page`, or `None` past the end of the table.
    #[must_use]
    pub fn get(&self, page: PageNumber) -> Option<PageTableEntry> {
        self.entries.get(page.as_usize()).copied()
    }

    /// Overwrite the entry for `page`. Returns `false` past the end of the table.
    pub fn set(&mut self, page: PageNumber, entry: PageTableEntry) -> bool {
        if let Some(slot) = self.entries.get_mut(page.as_usize()) {
            *slot = entry;
            true
        } else {
            false
        }
    }

    /// Every entry that is resident or swapped, in page order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn mapped(&self) -> impl Iterator<Item = (PageNumber, PageState)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (PageNumber::new(i as u32), e.state()))
            .filter(|(_, state)| *state != PageState::Unmapped)
    }

    /// Reset every entry to unmapped.
    pub fn clear(&mut self) {
        self.entries.fill(PageTableEntry::unmapped());
    }
}
