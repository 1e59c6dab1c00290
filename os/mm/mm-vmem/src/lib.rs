//! # Paging Virtual Memory Manager
//!
//! Per-process virtual memory for the simulated kernel: a software page
//! table over shared RAM and SWAP stores, FIFO page replacement, and a
//! named-region allocator on top.
//!
//! ## What you get
//! - [`Process`], the entry points a simulated program uses
//!   (`allocate_named`, `free_named`, `read_named`, `write_named`,
//!   `grow_area`).
//! - [`MemoryDescriptor`], the per-process state behind them: virtual areas,
//!   the region symbol table, the page table and the resident FIFO.
//! - [`MemoryBanks`], the RAM store and swap devices a process pages against.
//! - [`PageTableEntry`], a packed 32-bit entry decoded into [`PageState`].
//!
//! ## Address Space Layout
//!
//! ```text
//!  area.start                    break_ptr          area.end
//!     │                              │                  │
//!     ▼                              ▼                  ▼
//!     ┌──────┬──────┬──────┬─────────┬──────────────────┐
//!     │ r0   │ free │ r2   │  r3     │     slack        │   ← page aligned
//!     └──────┴──────┴──────┴─────────┴──────────────────┘
//!       ▲       ▲                             ▲
//!       │       └──── free list ──────────────┘
//!       └── symbol table: handle 0 → [start, end)
//! ```
//!
//! Every page in `[start, end)` is mapped: resident in a RAM frame or parked
//! in a swap frame. Pages outside any area are faulted in as zero pages on
//! first touch.
//!
//! ## Typical Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use mm_physical::MemPhy;
//! use mm_vmem::{MemoryBanks, MemoryConfig, Process};
//! use mm_vmem::addresses::Size256;
//!
//! let ram = Arc::new(MemPhy::<Size256>::new(4));
//! let swap = Arc::new(MemPhy::<Size256>::new(16));
//! let banks = MemoryBanks::<Size256>::new(ram).with_swap(swap);
//! let process = Process::new(1, &MemoryConfig::default(), banks)?;
//!
//! process.allocate_named(300, 0)?;
//! process.write_named(0, 10, 0x42)?;
//! assert_eq!(process.read_named(0, 10)?, 0x42);
//! process.free_named(0)?;
//! process.teardown()?;
//! # Ok::<(), mm_vmem::VmError>(())
//! ```

mod allocator;
mod area;
mod banks;
mod config;
mod descriptor;
mod error;
mod free_list;
mod page_table;
mod paging;
mod process;
mod pte;
mod region;

pub use mm_addresses as addresses;

pub use crate::area::{AreaId, VirtualArea};
pub use crate::banks::{MemoryBanks, SharedStore};
pub use crate::config::{DEFAULT_MAX_PAGES, DEFAULT_REGION_SLOTS, MemoryConfig};
pub use crate::descriptor::MemoryDescriptor;
pub use crate::error::VmError;
pub use crate::free_list::FreeList;
pub use crate::page_table::PageTable;
pub use crate::process::{DEFAULT_AREA, Process};
pub use crate::pte::{
    MAX_RAM_FRAMES, MAX_SWAP_DEVICES, MAX_SWAP_FRAMES, PageState, PageTableEntry, SwapSlot,
};
pub use crate::region::{FreeRegion, Interval, Region, RegionTable};
