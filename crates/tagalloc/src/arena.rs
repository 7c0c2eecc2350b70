//! The arena handle and its backing region.
//!
//! An [`Arena`] owns one zero-initialized byte region acquired exactly once by
//! [`Arena::init`]. The region is never grown and never handed back before the
//! handle is dropped. Block headers and footers live inside the region itself;
//! every read and write of them goes through the bounds-checked word accessors
//! in this module.

use alloc::vec::Vec;
use core::fmt;

use log::debug;

use crate::{
    config::ArenaConfig,
    error::ArenaError,
    tag::{BlockTag, FOOTER_SIZE, WORD_SIZE},
};

/// Reference to the payload of an allocated block.
///
/// A `PayloadRef` is the byte offset of the payload within the arena. Offset
/// zero can never start a payload (a header always precedes it) and serves as
/// the null reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayloadRef(usize);

impl PayloadRef {
    /// The null reference.
    pub const NULL: Self = Self(0);

    /// Creates a reference from a raw payload offset.
    ///
    /// The offset is not validated here; operations taking a `PayloadRef`
    /// reject anything that is not the payload of a live allocation.
    #[must_use]
    pub const fn from_offset(offset: usize) -> Self {
        Self(offset)
    }

    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// A fixed-size arena managed with boundary tags.
///
/// The handle starts uninitialized; [`init`](Self::init) acquires the backing
/// region and may succeed only once per handle.
///
/// # Thread Safety
///
/// The arena performs no internal locking. It is `Send` and can be moved
/// between threads, but concurrent callers must wrap the whole handle in a
/// mutex.
#[derive(Default)]
pub struct Arena {
    config: ArenaConfig,
    heap: Vec<u8>,
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("total_size", &self.total_size())
            .finish_non_exhaustive()
    }
}

impl Arena {
    /// Creates an uninitialized arena.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            config,
            heap: Vec::new(),
        }
    }

    /// Acquires the backing region and lays it out as one free block.
    ///
    /// `size` is rounded up to a multiple of the configured page size.
    pub fn init(&mut self, size: usize) -> Result<(), ArenaError> {
        if self.is_initialized() {
            return Err(ArenaError::already_initialized(self.total_size()));
        }
        if size == 0 {
            return Err(ArenaError::invalid_argument("arena size must be positive"));
        }
        self.config.validate()?;

        let total_size = self
            .config
            .round_to_page(size)
            .ok_or_else(|| ArenaError::allocation_failure(size))?;
        let mut heap = Vec::new();
        if heap.try_reserve_exact(total_size).is_err() {
            return Err(ArenaError::allocation_failure(total_size));
        }
        heap.resize(total_size, 0);
        self.heap = heap;

        // No real predecessor: the first block is always preceded by a busy
        // sentinel.
        self.write_tag(0, BlockTag::free(total_size, true));

        debug!(
            "arena initialized: requested={size} total={total_size} page_size={}",
            self.config.page_size()
        );
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.heap.is_empty()
    }

    /// Size of the backing region in bytes, zero before initialization.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Returns the payload bytes of a live allocation.
    pub fn payload(&self, ptr: PayloadRef) -> Result<&[u8], ArenaError> {
        let block = self.allocated_block(ptr)?;
        Ok(&self.heap[block.payload_offset()..block.end()])
    }

    /// Returns the payload bytes of a live allocation for writing.
    pub fn payload_mut(&mut self, ptr: PayloadRef) -> Result<&mut [u8], ArenaError> {
        let block = self.allocated_block(ptr)?;
        Ok(&mut self.heap[block.payload_offset()..block.end()])
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), ArenaError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ArenaError::uninitialized())
        }
    }

    /// Reads one word, or `None` if it does not lie entirely inside the arena.
    pub(crate) fn read_word(&self, offset: usize) -> Option<usize> {
        let bytes = self.heap.get(offset..offset.checked_add(WORD_SIZE)?)?;
        Some(usize::from_ne_bytes(bytes.try_into().ok()?))
    }

    pub(crate) fn write_word(&mut self, offset: usize, word: usize) {
        self.heap[offset..offset + WORD_SIZE].copy_from_slice(&word.to_ne_bytes());
    }

    /// Reads the header at `offset`.
    pub(crate) fn read_tag(&self, offset: usize) -> Option<BlockTag> {
        self.read_word(offset).map(BlockTag::decode)
    }

    /// Writes a block header and, for free blocks, the matching footer.
    pub(crate) fn write_tag(&mut self, offset: usize, tag: BlockTag) {
        debug_assert!(offset.is_multiple_of(WORD_SIZE));
        debug_assert!(offset + tag.size <= self.total_size());
        self.write_word(offset, tag.encode());
        if !tag.allocated {
            self.write_word(offset + tag.size - FOOTER_SIZE, tag.footer());
        }
    }

    /// Updates the `prev_allocated` bit of the block at `offset`.
    ///
    /// Does nothing when `offset` is the end of the arena.
    pub(crate) fn set_prev_allocated(&mut self, offset: usize, prev_allocated: bool) {
        if offset >= self.total_size() {
            return;
        }
        if let Some(mut tag) = self.read_tag(offset) {
            tag.prev_allocated = prev_allocated;
            self.write_word(offset, tag.encode());
        }
    }
}
