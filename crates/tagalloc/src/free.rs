//! Deallocation with boundary-tag coalescing.
//!
//! A freed block is merged at once with whichever neighbors are free, so no
//! two adjacent blocks are ever free:
//!
//! ```text
//!  prev    this    next          merged span
//! ┌──────┬──────┬──────┐
//! │ busy │ this │ busy │  ──▶     [this]
//! │ free │ this │ busy │  ──▶     [prev + this]
//! │ busy │ this │ free │  ──▶     [this + next]
//! │ free │ this │ free │  ──▶     [prev + this + next]
//! └──────┴──────┴──────┘
//! ```
//!
//! The predecessor is found through its footer, the word right before this
//! block's header. The successor is found by address arithmetic.

use log::{trace, warn};

use crate::{
    arena::{Arena, PayloadRef},
    directory::Block,
    error::ArenaError,
    tag::{BlockTag, FOOTER_SIZE, HEADER_SIZE, WORD_SIZE},
};

impl Arena {
    /// Releases the allocation referenced by `ptr`.
    ///
    /// Fails without modifying the arena if `ptr` is null, lies outside the
    /// arena, is misaligned, or does not start the payload of a currently
    /// allocated block. Freeing the same reference twice is therefore
    /// rejected.
    pub fn free(&mut self, ptr: PayloadRef) -> Result<(), ArenaError> {
        self.ensure_initialized()?;
        if ptr.is_null() {
            return Err(ArenaError::invalid_argument("cannot free a null reference"));
        }
        let block = self.allocated_block(ptr).inspect_err(|err| {
            warn!("free rejected: {err}");
        })?;

        let prev = self.free_predecessor(block)?;
        let next = self.block_at(block.end()).filter(Block::is_free);
        self.coalesce(block, prev, next);
        Ok(())
    }

    /// Resolves `ptr` to the allocated block whose payload it starts.
    pub(crate) fn allocated_block(&self, ptr: PayloadRef) -> Result<Block, ArenaError> {
        self.ensure_initialized()?;
        let offset = ptr.offset();
        if offset < HEADER_SIZE || offset >= self.total_size() {
            return Err(ArenaError::invalid_pointer(offset, "outside the arena"));
        }
        if !offset.is_multiple_of(WORD_SIZE) {
            return Err(ArenaError::invalid_pointer(offset, "not word aligned"));
        }

        let header = offset - HEADER_SIZE;
        let Some(block) = self
            .blocks()
            .find(|block| block.offset() >= header)
            .filter(|block| block.offset() == header)
        else {
            return Err(ArenaError::invalid_pointer(
                offset,
                "not the payload of any block",
            ));
        };
        if block.is_free() {
            return Err(ArenaError::invalid_pointer(
                offset,
                "block is not allocated",
            ));
        }
        Ok(block)
    }

    /// Locates the predecessor of `block` through its footer if it is free.
    fn free_predecessor(&self, block: Block) -> Result<Option<Block>, ArenaError> {
        if block.tag().prev_allocated {
            return Ok(None);
        }
        let offset = block.offset();
        let Some(footer) = offset
            .checked_sub(FOOTER_SIZE)
            .and_then(|footer| self.read_word(footer))
        else {
            return Err(ArenaError::corrupted(
                offset,
                "first block claims a free predecessor",
            ));
        };
        offset
            .checked_sub(footer)
            .and_then(|start| self.block_at(start))
            .filter(|prev| prev.is_free() && prev.end() == offset)
            .map(Some)
            .ok_or_else(|| ArenaError::corrupted(offset, "predecessor footer does not match"))
    }

    /// Frees `block` and merges it with its free neighbors.
    fn coalesce(&mut self, block: Block, prev: Option<Block>, next: Option<Block>) {
        let start = prev.map_or(block.offset(), |prev| prev.offset());
        let end = next.map_or(block.end(), |next| next.end());
        let prev_allocated = prev.map_or(block.tag().prev_allocated, |prev| {
            prev.tag().prev_allocated
        });

        self.write_tag(start, BlockTag::free(end - start, prev_allocated));
        self.set_prev_allocated(end, false);

        trace!(
            "free: block {:#x} size={} merged prev={} next={} into {start:#x}..{end:#x}",
            block.offset(),
            block.size(),
            prev.is_some(),
            next.is_some(),
        );
    }
}
