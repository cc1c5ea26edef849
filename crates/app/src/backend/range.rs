//! Row ranges for paginated reads.

/// Inclusive row window, as sent in the `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
}

impl PageRange {
    /// Window for the zero-based `page` of `size` rows.
    #[must_use]
    pub fn page(page: u64, size: u64) -> Self {
        let start = page.saturating_mul(size);

        Self {
            start,
            end: start.saturating_add(size.max(1) - 1),
        }
    }

    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Extract the total row count from a `Content-Range` header such as
/// `0-11/42` or `*/0`. Returns `None` when the total is unknown (`*`).
#[must_use]
pub fn parse_total(content_range: &str) -> Option<u64> {
    let (_, total) = content_range.trim().rsplit_once('/')?;

    total.parse().ok()
}
