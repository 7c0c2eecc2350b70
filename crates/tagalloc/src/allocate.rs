//! Best-fit allocation with splitting.

use log::trace;

use crate::{
    arena::{Arena, PayloadRef},
    directory::Block,
    error::ArenaError,
    tag::{BlockTag, HEADER_SIZE, MIN_BLOCK_SIZE, WORD_SIZE},
};

/// Total block size needed to serve a `size` byte request, or `None` on
/// overflow.
fn block_size_for(size: usize) -> Option<usize> {
    size.checked_next_multiple_of(WORD_SIZE)?
        .checked_add(HEADER_SIZE)
}

impl Arena {
    /// Allocates a block with at least `size` payload bytes.
    ///
    /// Among all free blocks large enough, the smallest one is used; ties go
    /// to the lowest address. The block is split when the leftover space can
    /// stand on its own as a free block.
    ///
    /// On failure the arena is left untouched.
    pub fn allocate(&mut self, size: usize) -> Result<PayloadRef, ArenaError> {
        self.ensure_initialized()?;
        if size == 0 {
            return Err(ArenaError::invalid_argument(
                "allocation size must be positive",
            ));
        }

        let Some(need) = block_size_for(size) else {
            return Err(ArenaError::out_of_memory(size, self.largest_free_block()));
        };
        let Some(block) = self.best_fit(need) else {
            return Err(ArenaError::out_of_memory(need, self.largest_free_block()));
        };

        self.place(block, need);
        Ok(PayloadRef::from_offset(block.payload_offset()))
    }

    /// Size of the largest free block, zero if there is none.
    #[must_use]
    pub fn largest_free_block(&self) -> usize {
        self.blocks()
            .filter(Block::is_free)
            .map(|block| block.size())
            .max()
            .unwrap_or(0)
    }

    fn best_fit(&self, need: usize) -> Option<Block> {
        // `min_by_key` keeps the first of equal minimums, so ties resolve to
        // the lowest address.
        self.blocks()
            .filter(|block| block.is_free() && block.size() >= need)
            .min_by_key(Block::size)
    }

    /// Turns the free `block` into an allocated block of `need` bytes.
    fn place(&mut self, block: Block, need: usize) {
        debug_assert!(block.is_free() && block.size() >= need);
        let prev_allocated = block.tag().prev_allocated;
        let remainder = block.size() - need;

        if remainder < MIN_BLOCK_SIZE {
            self.write_tag(block.offset(), BlockTag::busy(block.size(), prev_allocated));
            self.set_prev_allocated(block.end(), true);
            trace!(
                "allocate: need={need} took whole block {:#x} size={}",
                block.offset(),
                block.size()
            );
            return;
        }

        // The block after the remainder already records a free predecessor.
        let tail = block.offset() + need;
        self.write_tag(block.offset(), BlockTag::busy(need, prev_allocated));
        self.write_tag(tail, BlockTag::free(remainder, true));
        trace!(
            "allocate: need={need} split block {:#x} size={}, free tail {tail:#x} size={remainder}",
            block.offset(),
            block.size()
        );
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ArenaConfig,
        tag::{BlockState, FOOTER_SIZE},
    };

    fn arena(page_size: usize, size: usize) -> Arena {
        let mut arena = Arena::new(ArenaConfig::new().with_page_size(page_size));
        arena.init(size).unwrap();
        arena
    }

    /// Allocation request that produces a block of exactly `block_size` bytes.
    fn request(block_size: usize) -> usize {
        block_size - HEADER_SIZE
    }

    fn layout(arena: &Arena) -> Vec<(usize, BlockState)> {
        arena
            .blocks()
            .map(|block| (block.size(), block.state()))
            .collect()
    }

    #[test]
    fn test_block_size_rounding() {
        assert_eq!(block_size_for(1), Some(WORD_SIZE + HEADER_SIZE));
        assert_eq!(block_size_for(WORD_SIZE), Some(WORD_SIZE + HEADER_SIZE));
        assert_eq!(
            block_size_for(WORD_SIZE + 1),
            Some(2 * WORD_SIZE + HEADER_SIZE)
        );
        assert_eq!(block_size_for(usize::MAX), None);
    }

    #[test]
    fn test_uninitialized() {
        let mut arena = Arena::default();
        let err = arena.allocate(16).unwrap_err();
        assert!(matches!(err, ArenaError::Uninitialized { .. }));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut arena = arena(256, 256);
        let err = arena.allocate(0).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidArgument { .. }));
        assert_eq!(layout(&arena), [(256, BlockState::Free)]);
    }

    #[test]
    fn test_split_leaves_free_tail() {
        let mut arena = arena(256, 256);
        let ptr = arena.allocate(request(32)).unwrap();
        assert_eq!(ptr.offset(), HEADER_SIZE);

        assert_eq!(
            layout(&arena),
            [(32, BlockState::Busy), (224, BlockState::Free)]
        );
        assert_eq!(arena.read_tag(0), Some(BlockTag::busy(32, true)));
        assert_eq!(arena.read_tag(32), Some(BlockTag::free(224, true)));
        assert_eq!(arena.read_word(256 - FOOTER_SIZE), Some(224));
    }

    #[test]
    fn test_small_remainder_takes_whole_block() {
        let mut arena = arena(64, 64);
        let first = arena.allocate(request(32)).unwrap();
        // The remaining 32 bytes minus a word cannot hold a free block.
        let second = arena.allocate(request(32 - WORD_SIZE)).unwrap();
        assert_ne!(first, second);

        assert_eq!(
            layout(&arena),
            [(32, BlockState::Busy), (32, BlockState::Busy)]
        );
        assert_eq!(arena.payload(second).unwrap().len(), 32 - HEADER_SIZE);
    }

    #[test]
    fn test_whole_block_marks_successor() {
        let mut arena = arena(128, 128);
        let a = arena.allocate(request(32)).unwrap();
        let _b = arena.allocate(request(32)).unwrap();
        arena.free(a).unwrap();
        assert_eq!(arena.read_tag(32), Some(BlockTag::busy(32, false)));

        // Reuses the 32 byte hole without splitting it.
        let c = arena.allocate(request(32)).unwrap();
        assert_eq!(c, a);
        assert_eq!(arena.read_tag(32), Some(BlockTag::busy(32, true)));
    }

    #[test]
    fn test_best_fit_prefers_smallest() {
        // Free holes of 40, 64 and 24 bytes separated by busy blocks.
        let mut arena = arena(256, 256);
        let a = arena.allocate(request(40)).unwrap();
        let _s1 = arena.allocate(request(16)).unwrap();
        let b = arena.allocate(request(64)).unwrap();
        let _s2 = arena.allocate(request(16)).unwrap();
        let c = arena.allocate(request(24)).unwrap();
        let _rest = arena.allocate(request(256 - 40 - 16 - 64 - 16 - 24)).unwrap();
        for ptr in [a, b, c] {
            arena.free(ptr).unwrap();
        }

        let ptr = arena.allocate(request(32)).unwrap();
        assert_eq!(ptr, a);
        // The 64 byte hole is untouched.
        let hole = arena.blocks().find(|block| block.offset() == 56).unwrap();
        assert!(hole.is_free());
        assert_eq!(hole.size(), 64);
    }

    #[test]
    fn test_best_fit_ties_go_to_lowest_address() {
        let mut arena = arena(256, 256);
        let a = arena.allocate(request(32)).unwrap();
        let _s1 = arena.allocate(request(16)).unwrap();
        let b = arena.allocate(request(32)).unwrap();
        let _rest = arena.allocate(request(256 - 32 - 16 - 32)).unwrap();
        arena.free(b).unwrap();
        arena.free(a).unwrap();

        assert_eq!(arena.allocate(request(32)).unwrap(), a);
        assert_eq!(arena.allocate(request(32)).unwrap(), b);
    }

    #[test]
    fn test_out_of_memory_leaves_arena_unchanged() {
        let mut arena = arena(256, 256);
        let _a = arena.allocate(request(64)).unwrap();
        let before = arena.list_blocks();

        let err = arena.allocate(256).unwrap_err();
        assert!(matches!(
            err,
            ArenaError::OutOfMemory {
                largest_free: 192,
                ..
            }
        ));
        assert_eq!(arena.list_blocks(), before);

        let err = arena.allocate(usize::MAX).unwrap_err();
        assert!(matches!(err, ArenaError::OutOfMemory { .. }));
        assert_eq!(arena.list_blocks(), before);
    }

    #[test]
    fn test_fill_entire_arena() {
        let mut arena = arena(256, 256);
        let ptr = arena.allocate(request(256)).unwrap();
        assert_eq!(layout(&arena), [(256, BlockState::Busy)]);
        assert_eq!(arena.largest_free_block(), 0);
        assert!(matches!(
            arena.allocate(1),
            Err(ArenaError::OutOfMemory { largest_free: 0, .. })
        ));
        arena.free(ptr).unwrap();
        assert_eq!(layout(&arena), [(256, BlockState::Free)]);
    }

    #[test]
    fn test_earlier_payloads_untouched() {
        let mut arena = arena(256, 256);
        let a = arena.allocate(24).unwrap();
        arena.payload_mut(a).unwrap().fill(0xa5);
        let _b = arena.allocate(40).unwrap();
        assert!(arena.payload(a).unwrap().iter().all(|&byte| byte == 0xa5));
    }
}
