//! Arena configuration.

use crate::{
    error::ArenaError,
    tag::{MIN_BLOCK_SIZE, WORD_SIZE},
};

/// Page size used when the platform cannot report one.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn platform_page_size() -> usize {
            // SAFETY: `sysconf` has no preconditions.
            let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
            usize::try_from(size)
                .ok()
                .filter(|size| size.is_power_of_two())
                .unwrap_or(DEFAULT_PAGE_SIZE)
        }
    } else {
        fn platform_page_size() -> usize {
            DEFAULT_PAGE_SIZE
        }
    }
}

/// Configuration for an [`Arena`](crate::Arena).
///
/// The requested arena size is rounded up to a multiple of
/// [`page_size`](Self::page_size) at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    page_size: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaConfig {
    /// Creates a configuration using the platform page size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            page_size: platform_page_size(),
        }
    }

    /// Overrides the rounding granularity.
    ///
    /// The value is validated when the arena is initialized: it must be a
    /// power of two no smaller than the minimum block size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub(crate) fn validate(&self) -> Result<(), ArenaError> {
        if !self.page_size.is_power_of_two() || self.page_size < MIN_BLOCK_SIZE {
            return Err(ArenaError::invalid_argument(
                "page size must be a power of two no smaller than the minimum block size",
            ));
        }
        debug_assert!(self.page_size.is_multiple_of(WORD_SIZE));
        Ok(())
    }

    /// Rounds `size` up to the next page boundary, or `None` on overflow.
    pub(crate) fn round_to_page(&self, size: usize) -> Option<usize> {
        size.checked_next_multiple_of(self.page_size)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_page_size_is_usable() {
        let config = ArenaConfig::new();
        assert!(config.page_size().is_power_of_two());
        config.validate().unwrap();
    }

    #[test]
    fn test_round_to_page() {
        let config = ArenaConfig::new().with_page_size(256);
        assert_eq!(config.round_to_page(1), Some(256));
        assert_eq!(config.round_to_page(256), Some(256));
        assert_eq!(config.round_to_page(257), Some(512));
        assert_eq!(config.round_to_page(usize::MAX), None);
    }

    #[test]
    fn test_rejects_bad_page_sizes() {
        for page_size in [0, 3, 100, WORD_SIZE] {
            let config = ArenaConfig::new().with_page_size(page_size);
            assert!(
                matches!(config.validate(), Err(ArenaError::InvalidArgument { .. })),
                "page size {page_size} accepted"
            );
        }
    }
}
