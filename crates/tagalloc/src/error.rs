//! Error type shared by every arena operation.
//!
//! Errors never leave the arena half-modified: an operation either completes
//! or returns one of these without touching any block.

use core::fmt;

use snafu::{GenerateImplicitData, Snafu};

/// Source location where an error was raised.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location(&'static core::panic::Location<'static>);

impl Default for Location {
    #[track_caller]
    fn default() -> Self {
        Self(core::panic::Location::caller())
    }
}

impl GenerateImplicitData for Location {
    #[track_caller]
    fn generate() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Snafu)]
#[snafu(module)]
#[non_exhaustive]
pub enum ArenaError {
    #[snafu(display("invalid argument: {reason}"))]
    InvalidArgument {
        reason: &'static str,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("arena is already initialized with {total_size} bytes"))]
    AlreadyInitialized {
        total_size: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("arena is not initialized"))]
    Uninitialized {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to acquire a backing region of {size} bytes"))]
    AllocationFailure {
        size: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display(
        "out of memory: need a {need} byte block, largest free block is {largest_free} bytes"
    ))]
    OutOfMemory {
        need: usize,
        largest_free: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("invalid pointer {offset:#x}: {reason}"))]
    InvalidPointer {
        offset: usize,
        reason: &'static str,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("arena corrupted at {offset:#x}: {reason}"))]
    Corrupted {
        offset: usize,
        reason: &'static str,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ArenaError {
    #[track_caller]
    #[must_use]
    pub(crate) fn invalid_argument(reason: &'static str) -> Self {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::arena_error::*;

        InvalidArgumentSnafu { reason }.build()
    }

    #[track_caller]
    #[must_use]
    pub(crate) fn already_initialized(total_size: usize) -> Self {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::arena_error::*;

        AlreadyInitializedSnafu { total_size }.build()
    }

    #[track_caller]
    #[must_use]
    pub(crate) fn uninitialized() -> Self {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::arena_error::*;

        UninitializedSnafu.build()
    }

    #[track_caller]
    #[must_use]
    pub(crate) fn allocation_failure(size: usize) -> Self {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::arena_error::*;

        AllocationFailureSnafu { size }.build()
    }

    #[track_caller]
    #[must_use]
    pub(crate) fn out_of_memory(need: usize, largest_free: usize) -> Self {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::arena_error::*;

        OutOfMemorySnafu { need, largest_free }.build()
    }

    #[track_caller]
    #[must_use]
    pub(crate) fn invalid_pointer(offset: usize, reason: &'static str) -> Self {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::arena_error::*;

        InvalidPointerSnafu { offset, reason }.build()
    }

    #[track_caller]
    #[must_use]
    pub(crate) fn corrupted(offset: usize, reason: &'static str) -> Self {
        #[cfg_attr(not(test), expect(clippy::wildcard_imports))]
        use self::arena_error::*;

        CorruptedSnafu { offset, reason }.build()
    }

    /// Where in the crate the error was raised.
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Self::InvalidArgument { location, .. }
            | Self::AlreadyInitialized { location, .. }
            | Self::Uninitialized { location }
            | Self::AllocationFailure { location, .. }
            | Self::OutOfMemory { location, .. }
            | Self::InvalidPointer { location, .. }
            | Self::Corrupted { location, .. } => *location,
        }
    }
}
