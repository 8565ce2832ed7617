//! Page arithmetic.

use std::ops::Range;

/// `ceil(total_items / page_size)`, zero for an empty collection.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

/// Index range of `page` (1-based) clamped to `0..total_items`.
///
/// Page 0 is treated as page 1. Pages past the end yield an empty range.
pub fn page_bounds(page: usize, page_size: usize, total_items: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = page.max(1).saturating_sub(1).saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);
    start..end
}
