//! Applies replay operations to an arena.

use std::fmt;

use log::info;
use snafu::{ResultExt as _, Snafu};
use tagalloc::{Arena, ArenaError, BlockListing, Location, PayloadRef};

use crate::op::Op;

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum ReplayError {
    #[snafu(display("there is no allocation #{number}"))]
    NoSuchAllocation {
        number: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to allocate {size} bytes"))]
    Allocate {
        size: usize,
        #[snafu(source)]
        source: ArenaError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to free allocation #{number}"))]
    Free {
        number: usize,
        #[snafu(source)]
        source: ArenaError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("arena consistency check failed"))]
    Check {
        #[snafu(source)]
        source: ArenaError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ReplayError {
    pub fn location(&self) -> Location {
        match self {
            Self::NoSuchAllocation { location, .. }
            | Self::Allocate { location, .. }
            | Self::Free { location, .. }
            | Self::Check { location, .. } => *location,
        }
    }
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Allocated {
        number: usize,
        size: usize,
        ptr: PayloadRef,
    },
    Freed {
        number: usize,
    },
    Checked,
    Dumped(BlockListing),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocated { number, size, ptr } => write!(
                f,
                "allocation #{number}: {size} bytes at {:#010x}",
                ptr.offset()
            ),
            Self::Freed { number } => write!(f, "freed allocation #{number}"),
            Self::Checked => f.write_str("arena is consistent"),
            Self::Dumped(listing) => write!(f, "{listing}"),
        }
    }
}

/// An arena together with the allocations made so far.
#[derive(Debug)]
pub struct Replay {
    arena: Arena,
    allocations: Vec<PayloadRef>,
}

impl Replay {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            allocations: Vec::new(),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn apply(&mut self, op: Op) -> Result<Outcome, ReplayError> {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::replay_error::*;

        let outcome = match op {
            Op::Alloc(size) => {
                let ptr = self.arena.allocate(size).context(AllocateSnafu { size })?;
                self.allocations.push(ptr);
                Outcome::Allocated {
                    number: self.allocations.len(),
                    size,
                    ptr,
                }
            }
            Op::Free(number) => {
                let ptr = number
                    .checked_sub(1)
                    .and_then(|index| self.allocations.get(index))
                    .copied()
                    .ok_or_else(|| NoSuchAllocationSnafu { number }.build())?;
                self.arena.free(ptr).context(FreeSnafu { number })?;
                Outcome::Freed { number }
            }
            Op::Check => {
                self.arena.check().context(CheckSnafu)?;
                Outcome::Checked
            }
            Op::Dump => Outcome::Dumped(self.arena.list_blocks()),
        };
        info!("{op}: ok");
        Ok(outcome)
    }
}
