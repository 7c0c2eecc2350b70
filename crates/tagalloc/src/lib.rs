//! A fixed-size arena allocator built on boundary tags.
//!
//! An [`Arena`] acquires one contiguous region at initialization and serves
//! variable-sized allocations out of it until it is dropped. The region is
//! partitioned into consecutive blocks; every block begins with a header word
//! recording its size, whether it is allocated, and whether the block right
//! before it is allocated. Free blocks also end with a footer word holding
//! their size.
//!
//! ```text
//! offset 0                                                     total_size
//! ┌──────┬──────────┬──────┬───────────────────────┬──────┬──────────────┐
//! │ hdr  │ payload  │ hdr  │ (free)         footer │ hdr  │ payload      │
//! └──────┴──────────┴──────┴───────────────────────┴──────┴──────────────┘
//!   busy block        free block                     busy block
//! ```
//!
//! # Policies
//!
//! - **Best fit**: an allocation takes the smallest free block that is large
//!   enough, the lowest address winning ties.
//! - **Splitting**: the unused tail of the chosen block becomes a new free
//!   block when it can hold a header and a footer.
//! - **Immediate coalescing**: a freed block is merged with its free
//!   neighbors at once, so no two adjacent blocks are ever free.
//!
//! # Examples
//!
//! ```
//! use tagalloc::{Arena, ArenaConfig, ArenaError};
//!
//! let mut arena = Arena::new(ArenaConfig::new().with_page_size(4096));
//! arena.init(1000)?;
//! assert_eq!(arena.total_size(), 4096);
//!
//! let ptr = arena.allocate(100)?;
//! arena.payload_mut(ptr)?[..5].copy_from_slice(b"hello");
//! assert_eq!(&arena.payload(ptr)?[..5], b"hello");
//!
//! arena.free(ptr)?;
//! assert!(matches!(arena.free(ptr), Err(ArenaError::InvalidPointer { .. })));
//!
//! let listing = arena.list_blocks();
//! assert_eq!(listing.len(), 1);
//! assert_eq!(listing.free_size(), 4096);
//! arena.check()?;
//! # Ok::<(), ArenaError>(())
//! ```
//!
//! # Thread Safety
//!
//! Operations take `&mut self` and perform no locking. Share an arena between
//! threads by wrapping it in a mutex.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod allocate;
pub mod arena;
mod check;
pub mod config;
pub mod directory;
pub mod error;
mod free;
pub mod report;
pub mod tag;

pub use self::{
    arena::{Arena, PayloadRef},
    config::{ArenaConfig, DEFAULT_PAGE_SIZE},
    directory::{Block, Blocks},
    error::{ArenaError, Location},
    report::{BlockEntry, BlockListing},
    tag::{BlockState, BlockTag, FOOTER_SIZE, HEADER_SIZE, MIN_BLOCK_SIZE, WORD_SIZE},
};
