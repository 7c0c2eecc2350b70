//! Full consistency audit of the block chain.

use crate::{
    arena::Arena,
    error::ArenaError,
    tag::{FOOTER_SIZE, MIN_BLOCK_SIZE, WORD_SIZE},
};

impl Arena {
    /// Verifies every structural invariant of the arena.
    ///
    /// Walks the raw headers from the start of the arena and reports the first
    /// violation found:
    ///
    /// - every size is a multiple of the word size, at least the minimum block
    ///   size, and keeps the block inside the arena;
    /// - each `prev_allocated` bit matches the previous block (the first block
    ///   must report a busy predecessor);
    /// - every free block ends with a footer equal to its size;
    /// - no two adjacent blocks are free;
    /// - the block sizes add up to the arena size.
    ///
    /// This never modifies the arena.
    pub fn check(&self) -> Result<(), ArenaError> {
        self.ensure_initialized()?;
        let total_size = self.total_size();

        let mut offset = 0;
        let mut prev_allocated = true;
        while offset < total_size {
            let Some(tag) = self.read_tag(offset) else {
                return Err(ArenaError::corrupted(offset, "header outside the arena"));
            };
            if tag.size < MIN_BLOCK_SIZE || !tag.size.is_multiple_of(WORD_SIZE) {
                return Err(ArenaError::corrupted(offset, "invalid block size"));
            }
            let Some(end) = offset
                .checked_add(tag.size)
                .filter(|&end| end <= total_size)
            else {
                return Err(ArenaError::corrupted(offset, "block overruns the arena"));
            };
            if tag.prev_allocated != prev_allocated {
                return Err(ArenaError::corrupted(
                    offset,
                    "previous-block status bit disagrees with the previous block",
                ));
            }
            if !tag.allocated {
                if !prev_allocated {
                    return Err(ArenaError::corrupted(offset, "adjacent free blocks"));
                }
                if self.read_word(end - FOOTER_SIZE) != Some(tag.footer()) {
                    return Err(ArenaError::corrupted(
                        offset,
                        "footer does not match header",
                    ));
                }
            }
            prev_allocated = tag.allocated;
            offset = end;
        }

        // Every block ends inside the arena, so the walk stops exactly at
        // its end and the sizes account for every byte.
        debug_assert_eq!(offset, total_size);
        Ok(())
    }
}
