//! Cursor movement over the record list.
//!
//! Rows index the full filtered list (not the rendered window). Horizontal
//! moves only ever land on editable columns and wrap to the neighbouring row.

use crate::column::ColumnSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The focused cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridCursor {
    pub row: usize,
    pub col: usize,
}

impl GridCursor {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

pub fn first_editable(columns: &[ColumnSpec]) -> Option<usize> {
    columns.iter().position(|c| c.editable)
}

pub fn last_editable(columns: &[ColumnSpec]) -> Option<usize> {
    columns.iter().rposition(|c| c.editable)
}

/// Where the cursor goes from `cursor` when moving in `direction`.
pub fn step(
    cursor: GridCursor,
    direction: Direction,
    record_count: usize,
    columns: &[ColumnSpec],
) -> GridCursor {
    if record_count == 0 || columns.is_empty() {
        return cursor;
    }
    let last_row = record_count - 1;
    let row = cursor.row.min(last_row);
    let col = cursor.col.min(columns.len() - 1);

    match direction {
        Direction::Up => GridCursor::new(row.saturating_sub(1), col),
        Direction::Down => GridCursor::new((row + 1).min(last_row), col),
        Direction::Left => {
            if let Some(c) = (0..col).rev().find(|&c| columns[c].editable) {
                return GridCursor::new(row, c);
            }
            if row > 0 {
                if let Some(c) = last_editable(columns) {
                    return GridCursor::new(row - 1, c);
                }
            }
            GridCursor::new(row, clamp_col(col, columns))
        }
        Direction::Right => {
            if let Some(c) = (col + 1..columns.len()).find(|&c| columns[c].editable) {
                return GridCursor::new(row, c);
            }
            if row < last_row {
                if let Some(c) = first_editable(columns) {
                    return GridCursor::new(row + 1, c);
                }
            }
            GridCursor::new(row, clamp_col(col, columns))
        }
    }
}

// Stay put on an editable column; otherwise snap to the nearest editable one.
fn clamp_col(col: usize, columns: &[ColumnSpec]) -> usize {
    if columns[col].editable {
        return col;
    }
    (col..columns.len())
        .find(|&c| columns[c].editable)
        .or_else(|| (0..col).rev().find(|&c| columns[c].editable))
        .unwrap_or(col)
}

/// Whether moving onto `row` should start fetching the next page.
pub fn needs_prefetch(row: usize, loaded: usize, lookahead: usize, has_more: bool) -> bool {
    has_more && row + lookahead >= loaded
}

/// New scroll offset that brings `row` into view with `padding_rows` of
/// margin, or `None` if it is already comfortably visible.
pub fn scroll_into_view(
    row: usize,
    scroll_top: usize,
    viewport_height: usize,
    item_height: usize,
    padding_rows: usize,
) -> Option<usize> {
    let item_height = item_height.max(1);
    let row_top = row * item_height;
    let row_bottom = row_top + item_height;
    let padding = padding_rows * item_height;

    if viewport_height == 0 {
        return None;
    }

    if row_top < scroll_top + padding {
        let target = row_top.saturating_sub(padding);
        return (target != scroll_top).then_some(target);
    }

    // A viewport smaller than the padded row cannot honor the padding.
    let needed = row_bottom + padding;
    if needed > scroll_top + viewport_height {
        let target = needed.saturating_sub(viewport_height).min(row_top);
        return (target != scroll_top).then_some(target);
    }

    None
}
