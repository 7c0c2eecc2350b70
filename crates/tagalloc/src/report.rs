//! Read-only block listing for diagnostics.
//!
//! [`Arena::list_blocks`] snapshots the block directory into a
//! [`BlockListing`], which renders as a table:
//!
//! ```text
//! No.  Status  Prev  t_Begin     t_End       t_Size
//! -------------------------------------------------
//! 1    Busy    Busy  0x00000000  0x0000001f  32
//! 2    Free    Busy  0x00000020  0x000000ff  224
//! -------------------------------------------------
//! Total busy size = 32
//! Total free size = 224
//! Total size = 256
//! ```

use alloc::vec::Vec;
use core::fmt;

use crate::{arena::Arena, directory::Block, tag::BlockState};

/// One row of a [`BlockListing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockEntry {
    /// Position of the block in address order, starting at 1.
    pub index: usize,
    pub state: BlockState,
    /// State of the block right before this one.
    pub prev_state: BlockState,
    /// Offset of the first byte of the block (its header).
    pub start: usize,
    /// Offset of the last byte of the block.
    pub end: usize,
    pub size: usize,
}

impl BlockEntry {
    fn new(index: usize, block: Block) -> Self {
        Self {
            index,
            state: block.state(),
            prev_state: block.prev_state(),
            start: block.offset(),
            end: block.end() - 1,
            size: block.size(),
        }
    }
}

/// Snapshot of all blocks of an arena with byte totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockListing {
    entries: Vec<BlockEntry>,
    busy_size: usize,
    free_size: usize,
}

impl BlockListing {
    #[must_use]
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Bytes held by busy blocks, headers included.
    #[must_use]
    pub fn busy_size(&self) -> usize {
        self.busy_size
    }

    /// Bytes held by free blocks, headers and footers included.
    #[must_use]
    pub fn free_size(&self) -> usize {
        self.free_size
    }

    #[must_use]
    pub fn total_size(&self) -> usize {
        self.busy_size + self.free_size
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a BlockListing {
    type Item = &'a BlockEntry;
    type IntoIter = core::slice::Iter<'a, BlockEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

const RULE: &str = "-------------------------------------------------";

// The derived `Display` of `BlockState` writes without honoring width, so the
// table pads these labels instead.
fn label(state: BlockState) -> &'static str {
    match state {
        BlockState::Free => "Free",
        BlockState::Busy => "Busy",
    }
}

impl fmt::Display for BlockListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No.  Status  Prev  t_Begin     t_End       t_Size")?;
        writeln!(f, "{RULE}")?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:<4} {:<7} {:<5} {:#010x}  {:#010x}  {}",
                entry.index,
                label(entry.state),
                label(entry.prev_state),
                entry.start,
                entry.end,
                entry.size,
            )?;
        }
        writeln!(f, "{RULE}")?;
        writeln!(f, "Total busy size = {}", self.busy_size)?;
        writeln!(f, "Total free size = {}", self.free_size)?;
        writeln!(f, "Total size = {}", self.total_size())
    }
}

impl Arena {
    /// Lists every block in address order.
    ///
    /// The listing of an uninitialized arena is empty.
    #[must_use]
    pub fn list_blocks(&self) -> BlockListing {
        let mut listing = BlockListing::default();
        for (index, block) in (1..).zip(self.blocks()) {
            match block.state() {
                BlockState::Busy => listing.busy_size += block.size(),
                BlockState::Free => listing.free_size += block.size(),
            }
            listing.entries.push(BlockEntry::new(index, block));
        }
        listing
    }
}
