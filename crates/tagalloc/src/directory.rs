//! Address-ordered traversal of the blocks in an arena.
//!
//! There is no separate block list: the block after the one at `offset` always
//! starts at `offset + size`. [`Blocks`] follows that rule from the first byte
//! of the arena to its end and is the only way the rest of the crate learns
//! which blocks exist.

use core::iter::FusedIterator;

use log::error;

use crate::{
    arena::Arena,
    tag::{BlockState, BlockTag, HEADER_SIZE, MIN_BLOCK_SIZE, WORD_SIZE},
};

/// A block as seen by the directory: its position and decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    offset: usize,
    tag: BlockTag,
}

impl Block {
    /// Offset of the block header within the arena.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// One past the last byte of the block.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.tag.size
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.tag.size
    }

    #[must_use]
    pub fn tag(&self) -> BlockTag {
        self.tag
    }

    #[must_use]
    pub fn state(&self) -> BlockState {
        self.tag.state()
    }

    #[must_use]
    pub fn prev_state(&self) -> BlockState {
        self.tag.prev_state()
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        !self.tag.allocated
    }

    /// Offset of the first payload byte.
    #[must_use]
    pub fn payload_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    /// Usable payload bytes of the block when it is allocated.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.tag.size - HEADER_SIZE
    }
}

impl Arena {
    /// Iterates over all blocks in address order.
    ///
    /// The iterator is empty for an uninitialized arena.
    #[must_use]
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            arena: self,
            offset: 0,
        }
    }

    /// Decodes the block whose header is at `offset`.
    ///
    /// Returns `None` at the end of the arena or when the stored size cannot
    /// describe a block inside the arena.
    pub(crate) fn block_at(&self, offset: usize) -> Option<Block> {
        let tag = self.read_tag(offset)?;
        let fits = offset
            .checked_add(tag.size)
            .is_some_and(|end| end <= self.total_size());
        if tag.size < MIN_BLOCK_SIZE || !tag.size.is_multiple_of(WORD_SIZE) || !fits {
            return None;
        }
        Some(Block { offset, tag })
    }
}

/// Iterator over the blocks of an [`Arena`], created by [`Arena::blocks`].
#[derive(Debug, Clone)]
pub struct Blocks<'a> {
    arena: &'a Arena,
    offset: usize,
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Self::Item> {
        let total_size = self.arena.total_size();
        if self.offset >= total_size {
            return None;
        }
        let Some(block) = self.arena.block_at(self.offset) else {
            error!("corrupt block header at {:#x}, stopping traversal", self.offset);
            self.offset = total_size;
            return None;
        };
        self.offset = block.end();
        Some(block)
    }
}

impl FusedIterator for Blocks<'_> {}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;

    fn arena(size: usize) -> Arena {
        let mut arena = Arena::new(ArenaConfig::new().with_page_size(size));
        arena.init(size).unwrap();
        arena
    }

    #[test]
    fn test_uninitialized_has_no_blocks() {
        let arena = Arena::default();
        assert_eq!(arena.blocks().count(), 0);
    }

    #[test]
    fn test_single_block() {
        let arena = arena(256);
        let blocks: Vec<_> = arena.blocks().collect();
        assert_eq!(blocks.len(), 1);
        let block = blocks[0];
        assert_eq!(block.offset(), 0);
        assert_eq!(block.end(), 256);
        assert!(block.is_free());
        assert_eq!(block.prev_state(), BlockState::Busy);
        assert_eq!(block.payload_offset(), HEADER_SIZE);
    }

    #[test]
    fn test_follows_sizes_and_restarts() {
        let mut arena = arena(256);
        arena.write_tag(0, BlockTag::busy(MIN_BLOCK_SIZE, true));
        arena.write_tag(MIN_BLOCK_SIZE, BlockTag::free(256 - MIN_BLOCK_SIZE, true));

        let offsets: Vec<_> = arena.blocks().map(|b| b.offset()).collect();
        assert_eq!(offsets, [0, MIN_BLOCK_SIZE]);
        // Traversal is restartable and yields the same sequence.
        let again: Vec<_> = arena.blocks().map(|b| b.offset()).collect();
        assert_eq!(offsets, again);
    }

    #[test]
    fn test_corrupt_size_stops_traversal() {
        let mut arena = arena(256);
        arena.write_tag(0, BlockTag::busy(MIN_BLOCK_SIZE, true));
        // A zero size would otherwise loop forever.
        arena.write_word(MIN_BLOCK_SIZE, BlockTag::busy(0, true).encode());

        let mut blocks = arena.blocks();
        assert_eq!(blocks.next().map(|b| b.offset()), Some(0));
        assert_eq!(blocks.next(), None);
        assert_eq!(blocks.next(), None);
    }

    #[test]
    fn test_block_at_rejects_overrun() {
        let mut arena = arena(256);
        arena.write_tag(0, BlockTag::busy(MIN_BLOCK_SIZE, true));
        arena.write_word(MIN_BLOCK_SIZE, BlockTag::busy(256, true).encode());
        assert!(arena.block_at(MIN_BLOCK_SIZE).is_none());
        assert!(arena.block_at(256).is_none());
    }
}
