//! Paging windows for directory searches.

use serde::{Deserialize, Serialize};

/// An offset/limit window over an ordered result set.
///
/// `limit == None` means every row from `offset` onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PagingWindow {
    /// Number of rows to skip.
    pub offset: u64,
    /// Maximum number of rows to return.
    pub limit: Option<u64>,
}

impl PagingWindow {
    /// A window that returns every match.
    pub const UNBOUNDED: Self = Self {
        offset: 0,
        limit: None,
    };

    /// Creates a bounded window.
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// Translates host-supplied `(first_result, max_results)` into a window.
    ///
    /// A negative offset or a non-positive limit disables paging entirely:
    /// the caller gets every match, not a truncated or shifted page.
    #[must_use]
    pub fn normalize(first_result: i64, max_results: i64) -> Self {
        match (u64::try_from(first_result), u64::try_from(max_results)) {
            (Ok(offset), Ok(limit)) if limit > 0 => Self::new(offset, limit),
            _ => Self::UNBOUNDED,
        }
    }

    /// Returns true if this window neither skips nor truncates.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.offset == 0 && self.limit.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_are_kept() {
        assert_eq!(PagingWindow::normalize(0, 1), PagingWindow::new(0, 1));
        assert_eq!(PagingWindow::normalize(20, 10), PagingWindow::new(20, 10));
    }

    #[test]
    fn negative_offset_is_unbounded() {
        let window = PagingWindow::normalize(-1, 10);
        assert!(window.is_unbounded());
    }

    #[test]
    fn non_positive_limit_is_unbounded() {
        assert!(PagingWindow::normalize(5, 0).is_unbounded());
        assert!(PagingWindow::normalize(5, -1).is_unbounded());
        assert!(PagingWindow::normalize(i64::MIN, i64::MIN).is_unbounded());
    }

    #[test]
    fn default_is_unbounded() {
        assert_eq!(PagingWindow::default(), PagingWindow::UNBOUNDED);
    }
}
