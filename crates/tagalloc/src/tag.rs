//! Block tags and their on-buffer encoding.
//!
//! Every block starts with a one-word header. Free blocks additionally end
//! with a one-word footer holding the block size, which lets a block find its
//! predecessor by reading the word right before its own header.
//!
//! ```text
//! Busy block:                         Free block:
//! ┌────────┬─────────────────────┐    ┌────────┬──────────────┬────────┐
//! │ header │ payload             │    │ header │ (unused)     │ footer │
//! └────────┴─────────────────────┘    └────────┴──────────────┴────────┘
//!
//! Header word: size | PREV_ALLOCATED (bit 1) | ALLOCATED (bit 0)
//! Footer word: size
//! ```
//!
//! Block sizes are always multiples of the word size, so the low bits of the
//! header word are free to carry the status flags. The flags exist only in the
//! encoded form; the rest of the crate works with [`BlockTag`].

use bitflags::bitflags;
use derive_more::{Display, IsVariant};

/// Machine word size in bytes. Every block size is a multiple of it.
pub const WORD_SIZE: usize = size_of::<usize>();

/// Bytes of per-block overhead for a busy block.
pub const HEADER_SIZE: usize = WORD_SIZE;

/// Bytes a free block spends on its trailing size copy.
pub const FOOTER_SIZE: usize = WORD_SIZE;

/// Smallest block that can exist on its own as a free block.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + FOOTER_SIZE;

const _: () = assert!(WORD_SIZE.is_power_of_two() && WORD_SIZE >= 4);

bitflags! {
    /// Status bits packed into the low bits of a header word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TagBits: usize {
        const ALLOCATED = 1 << 0;
        const PREV_ALLOCATED = 1 << 1;
    }
}

const STATUS_MASK: usize = TagBits::all().bits();

/// Allocation state of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IsVariant)]
pub enum BlockState {
    Free,
    Busy,
}

impl BlockState {
    fn from_allocated(allocated: bool) -> Self {
        if allocated { Self::Busy } else { Self::Free }
    }
}

/// Decoded header of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockTag {
    /// Total bytes occupied by the block, header (and footer) included.
    pub size: usize,
    /// Whether the block is handed out to a caller.
    pub allocated: bool,
    /// Whether the block immediately before this one is allocated.
    ///
    /// The first block of the arena always reports `true`.
    pub prev_allocated: bool,
}

impl BlockTag {
    /// Creates the tag of a free block.
    #[must_use]
    pub const fn free(size: usize, prev_allocated: bool) -> Self {
        Self {
            size,
            allocated: false,
            prev_allocated,
        }
    }

    /// Creates the tag of a busy block.
    #[must_use]
    pub const fn busy(size: usize, prev_allocated: bool) -> Self {
        Self {
            size,
            allocated: true,
            prev_allocated,
        }
    }

    #[must_use]
    pub fn state(&self) -> BlockState {
        BlockState::from_allocated(self.allocated)
    }

    #[must_use]
    pub fn prev_state(&self) -> BlockState {
        BlockState::from_allocated(self.prev_allocated)
    }

    /// Packs the tag into a header word.
    pub(crate) fn encode(self) -> usize {
        debug_assert_eq!(self.size & STATUS_MASK, 0, "unaligned block size");
        let mut bits = TagBits::empty();
        bits.set(TagBits::ALLOCATED, self.allocated);
        bits.set(TagBits::PREV_ALLOCATED, self.prev_allocated);
        self.size | bits.bits()
    }

    /// Unpacks a header word.
    pub(crate) fn decode(word: usize) -> Self {
        let bits = TagBits::from_bits_truncate(word);
        Self {
            size: word & !STATUS_MASK,
            allocated: bits.contains(TagBits::ALLOCATED),
            prev_allocated: bits.contains(TagBits::PREV_ALLOCATED),
        }
    }

    /// The footer word written at the end of a free block.
    pub(crate) const fn footer(self) -> usize {
        self.size
    }
}
