use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal cells taken by `s` (accented letters count one, CJK two).
pub(crate) fn display_width(s: &str) -> usize {
    s.width()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Right,
}

/// Longest prefix of `s` no wider than `width` cells.
fn prefix(s: &str, width: usize) -> &str {
    let mut used = 0;
    let end = s
        .char_indices()
        .find(|&(_, ch)| {
            used += ch.width().unwrap_or(0);
            used > width
        })
        .map_or(s.len(), |(i, _)| i);
    &s[..end]
}

/// Shorten `s` to at most `width` cells, ending in `..` when there is room.
pub(crate) fn clip(s: &str, width: usize) -> String {
    if s.width() <= width {
        s.to_string()
    } else if width <= 2 {
        prefix(s, width).to_string()
    } else {
        format!("{}..", prefix(s, width - 2))
    }
}

/// `s` laid out in exactly `width` cells; overlong text is clipped.
pub(crate) fn fit(s: &str, width: usize, align: Align) -> String {
    let text = clip(s, width);
    let gap = " ".repeat(width.saturating_sub(text.width()));
    match align {
        Align::Left => text + &gap,
        Align::Right => gap + &text,
    }
}
