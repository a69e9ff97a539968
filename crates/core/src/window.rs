//! Windowed rendering of a long record list.
//!
//! Units are whatever the host measures in (pixels for a browser-like host,
//! terminal rows for the TUI where `item_height` is 1).

/// Tuning for [`compute_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub item_height: usize,
    /// Rows rendered above and below the viewport
    pub buffer_size: usize,
    /// Extra rows rendered past the bottom buffer
    pub overscan: usize,
    /// Rows rendered before the container has been measured
    pub fallback_count: usize,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            item_height: 36,
            buffer_size: 5,
            overscan: 3,
            fallback_count: 50,
        }
    }
}

/// The slice of records to render and the spacer geometry around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VirtualWindow {
    pub start_index: usize,
    /// Exclusive
    pub end_index: usize,
    /// Height of the top spacer
    pub offset_y: usize,
    pub total_height: usize,
    pub item_height: usize,
}

impl VirtualWindow {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..self.end_index).contains(&index)
    }

    /// Height of the bottom spacer.
    pub fn bottom_spacer(&self) -> usize {
        self.total_height
            .saturating_sub(self.offset_y)
            .saturating_sub(self.len() * self.item_height)
    }

    /// True when the bottom of the viewport is within `threshold` of the end of
    /// the content.
    pub fn near_bottom(&self, scroll_top: usize, container_height: usize, threshold: usize) -> bool {
        scroll_top + container_height + threshold >= self.total_height
    }
}

/// Compute the visible slice for a scroll position.
///
/// `start = max(0, floor(scroll_top / h) - buffer)`,
/// `end = min(total, start + ceil(container / h) + 2 * buffer + overscan)`.
/// An unmeasured container (height 0) renders the first `fallback_count`
/// records instead of nothing.
pub fn compute_window(
    scroll_top: usize,
    container_height: usize,
    params: &WindowParams,
    total_items: usize,
) -> VirtualWindow {
    let item_height = params.item_height.max(1);
    let total_height = total_items * item_height;

    if container_height == 0 {
        let end_index = params.fallback_count.min(total_items);
        return VirtualWindow {
            start_index: 0,
            end_index,
            offset_y: 0,
            total_height,
            item_height,
        };
    }

    let first_visible = scroll_top / item_height;
    let start_index = first_visible
        .saturating_sub(params.buffer_size)
        .min(total_items);
    let visible = container_height.div_ceil(item_height);
    let end_index = (start_index + visible + 2 * params.buffer_size + params.overscan).min(total_items);

    VirtualWindow {
        start_index,
        end_index,
        offset_y: start_index * item_height,
        total_height,
        item_height,
    }
}
