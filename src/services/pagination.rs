//! Pagination calculator.
//!
//! Pages are 1-based and never clamped: asking for a page past the end is
//! valid and yields an empty slice.

use std::ops::Range;

use crate::domain::models::PageInfo;

/// Page metadata for `total` items split into pages of `limit`.
///
/// A zero `limit` yields `total_pages == u64::MAX` instead of dividing by zero.
pub fn paginate(total: u64, page: u64, limit: u64) -> PageInfo {
    let total_pages = if limit == 0 {
        u64::MAX
    } else {
        total.div_ceil(limit)
    };

    PageInfo {
        page,
        limit,
        total,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

/// Index range of `page` within a list of `len` items. Out-of-range pages
/// and a zero limit give an empty range.
pub fn slice_range(len: usize, page: u64, limit: u64) -> Range<usize> {
    if limit == 0 || page == 0 {
        return 0..0;
    }
    let start = (page - 1)
        .checked_mul(limit)
        .and_then(|start| usize::try_from(start).ok())
        .unwrap_or(usize::MAX)
        .min(len);
    let end = usize::try_from(limit)
        .map_or(len, |limit| start.saturating_add(limit))
        .min(len);
    start..end
}

/// Slice `items` to one page.
pub fn page_of<T>(items: &[T], page: u64, limit: u64) -> &[T] {
    &items[slice_range(items.len(), page, limit)]
}
