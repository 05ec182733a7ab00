//! Offset/limit paging over store reads
//!
//! Stores signal the end of data with a short page, so a reader keeps
//! advancing the window until fewer rows than `limit` come back.

/// Page size for book scans
pub const BOOK_PAGE_SIZE: i64 = shelf_common::config::DEFAULT_BOOK_PAGE_SIZE;

/// One LIMIT/OFFSET request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Rows to skip
    pub offset: i64,
    /// Maximum rows to return (always at least 1)
    pub limit: i64,
}

impl PageWindow {
    /// First window of a scan
    ///
    /// # Examples
    /// ```
    /// use shelf_audit::pagination::PageWindow;
    ///
    /// let w = PageWindow::first(1000);
    /// assert_eq!((w.offset, w.limit), (0, 1000));
    ///
    /// let w = w.next();
    /// assert_eq!((w.offset, w.limit), (1000, 1000));
    /// assert!(w.is_last(999));
    /// assert!(!w.is_last(1000));
    /// ```
    pub fn first(limit: i64) -> Self {
        Self {
            offset: 0,
            limit: limit.max(1),
        }
    }

    /// Window directly after this one
    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit,
        }
    }

    /// Whether a page with `received` rows ends the scan
    pub fn is_last(&self, received: usize) -> bool {
        (received as i64) < self.limit
    }
}
