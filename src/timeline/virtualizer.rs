//! Row and column windowing.
//!
//! Only the rows and cells inside the returned window are built by the
//! renderer, so drawing cost does not grow with the length of the timeline.

/// Inclusive index window plus the offset of its first item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRange {
    pub start_index: usize,
    pub end_index: usize,
    /// Offset of `start_index` along the scroll axis.
    pub offset: f32,
    /// Items that fit in the viewport, before buffering.
    pub visible_count: usize,
}

impl VisibleRange {
    pub const EMPTY: VisibleRange = VisibleRange {
        start_index: 0,
        end_index: 0,
        offset: 0.0,
        visible_count: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.visible_count == 0
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end_index - self.start_index + 1
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        !self.is_empty() && (self.start_index..=self.end_index).contains(&index)
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        if self.is_empty() {
            0..0
        } else {
            self.start_index..self.end_index + 1
        }
    }

    /// Items inside the window paired with their index in the full list, so
    /// row parity does not change when the window moves.
    pub fn enumerate<'a, T>(&self, items: &'a [T]) -> impl Iterator<Item = (usize, &'a T)> + 'a {
        let window = self.indices();
        let end = window.end.min(items.len());
        let start = window.start.min(end);
        items[start..end]
            .iter()
            .enumerate()
            .map(move |(offset, item)| (start + offset, item))
    }
}

/// Window of uniformly sized items along one axis.
///
/// `buffer` is raised to at least one item; without it a partially scrolled
/// first item would push the last visible item out of the window.
pub fn visible_range(
    scroll: f32,
    viewport: f32,
    item_size: f32,
    total: usize,
    buffer: usize,
) -> VisibleRange {
    if total == 0 || !(item_size > 0.0) || !(viewport > 0.0) {
        return VisibleRange::EMPTY;
    }
    let buffer = buffer.max(1);
    let first = (scroll.max(0.0) / item_size).floor() as usize;
    let start_index = first.saturating_sub(buffer).min(total - 1);
    let visible_count = (viewport / item_size).ceil() as usize;
    let end_index = (start_index + visible_count + 2 * buffer - 1).min(total - 1);
    VisibleRange {
        start_index,
        end_index,
        offset: start_index as f32 * item_size,
        visible_count,
    }
}

/// Horizontal counterpart of [`visible_range`] for grid columns.
pub fn visible_columns(
    scroll_left: f32,
    viewport_width: f32,
    column_width: f32,
    total: usize,
    buffer: usize,
) -> VisibleRange {
    visible_range(scroll_left, viewport_width, column_width, total, buffer)
}

/// Something laid out along the vertical axis.
pub trait Span {
    fn top(&self) -> f32;
    fn extent(&self) -> f32;

    fn bottom(&self) -> f32 {
        self.top() + self.extent()
    }
}

impl Span for (f32, f32) {
    fn top(&self) -> f32 {
        self.0
    }

    fn extent(&self) -> f32 {
        self.1
    }
}

/// Window over variable-height `rows`, which must be sorted by top edge.
pub fn visible_rows_in<T: Span>(
    rows: &[T],
    scroll_top: f32,
    viewport_height: f32,
    buffer: usize,
) -> VisibleRange {
    if rows.is_empty() || !(viewport_height > 0.0) {
        return VisibleRange::EMPTY;
    }
    let top = scroll_top.max(0.0);
    let bottom = top + viewport_height;
    // First row whose bottom edge is below the viewport top.
    let first = rows
        .partition_point(|row| row.bottom() <= top)
        .min(rows.len() - 1);
    // One past the last row whose top edge is above the viewport bottom.
    let last = rows.partition_point(|row| row.top() < bottom).max(first + 1) - 1;

    let start_index = first.saturating_sub(buffer);
    let end_index = (last + buffer).min(rows.len() - 1);
    VisibleRange {
        start_index,
        end_index,
        offset: rows[start_index].top(),
        visible_count: last - first + 1,
    }
}
