//! The cell editor: `Viewing -> Editing -> (commit | cancel) -> Viewing`.
//!
//! One editor serves the whole grid; it always edits the cursor cell. The
//! grid decides what a [`CellAction`] means (saving, moving the cursor).

use crate::column::ColumnSpec;
use crate::format::{edit_seed, parse_for_column, InputError};
use crate::navigation::Direction;
use crate::record::FieldValue;

// ============================================================================
// TextBuffer
// ============================================================================

/// Single-line text with a caret, indexed in chars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    caret: usize,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = text.chars().count();
        Self { text, caret }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the contents, caret at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.caret);
        self.text.insert(at, c);
        self.caret += 1;
    }

    pub fn backspace(&mut self) {
        if self.caret == 0 {
            return;
        }
        let at = self.byte_index(self.caret - 1);
        self.text.remove(at);
        self.caret -= 1;
    }

    pub fn delete(&mut self) {
        if self.caret >= self.text.chars().count() {
            return;
        }
        let at = self.byte_index(self.caret);
        self.text.remove(at);
    }

    pub fn left(&mut self) {
        self.caret = self.caret.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.caret = (self.caret + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.caret = 0;
    }

    pub fn end(&mut self) {
        self.caret = self.text.chars().count();
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

// ============================================================================
// CellEditor
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellMode {
    #[default]
    Viewing,
    Editing,
}

/// Input events the editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKey {
    Enter,
    Tab,
    BackTab,
    Escape,
    Char(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Up,
    Down,
    DoubleClick,
    /// Focus left the editor
    Blur,
}

/// Result of committing an edit session.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Input matches the original raw value; nothing to save
    Unchanged,
    Changed(FieldValue),
    /// Not a valid number; the cell keeps its previous value
    Rejected(InputError),
}

/// What the grid should do after a key.
#[derive(Debug, Clone, PartialEq)]
pub enum CellAction {
    Ignored,
    /// Key was consumed by the editor (text changed or caret moved)
    Edited,
    Started,
    Navigate(Direction),
    Committed {
        outcome: CommitOutcome,
        /// Cursor move that follows the commit (Enter moves down)
        then: Option<Direction>,
    },
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct CellEditor {
    mode: CellMode,
    buffer: TextBuffer,
    original: String,
}

impl CellEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> CellMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == CellMode::Editing
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Enter edit mode with the raw value of the cell.
    pub fn begin(&mut self, value: &FieldValue) {
        self.original = edit_seed(value);
        self.buffer.set(self.original.clone());
        self.mode = CellMode::Editing;
    }

    /// Enter edit mode from a typed character: it replaces an empty or zero
    /// value, or any value of a one-letter code column, and is appended to
    /// anything else.
    pub fn begin_seeded(&mut self, value: &FieldValue, c: char, column: &ColumnSpec) {
        self.original = edit_seed(value);
        let seeded = if value.is_blank_or_zero() || column.field.is_code() {
            c.to_string()
        } else {
            format!("{}{}", self.original, c)
        };
        self.buffer.set(seeded);
        self.mode = CellMode::Editing;
    }

    /// Finish the session and report what should be saved.
    pub fn commit(&mut self, column: &ColumnSpec) -> CommitOutcome {
        self.mode = CellMode::Viewing;
        let input = self.buffer.as_str();
        if input == self.original {
            return CommitOutcome::Unchanged;
        }
        match parse_for_column(input, column) {
            Ok(value) => CommitOutcome::Changed(value),
            Err(e) => CommitOutcome::Rejected(e),
        }
    }

    /// Abandon the session; nothing is saved.
    pub fn cancel(&mut self) {
        self.mode = CellMode::Viewing;
        self.buffer.set(self.original.clone());
    }

    /// Feed one key for the cell holding `value` in `column`.
    pub fn handle_key(&mut self, key: CellKey, value: &FieldValue, column: &ColumnSpec) -> CellAction {
        match self.mode {
            CellMode::Viewing => self.handle_viewing(key, value, column),
            CellMode::Editing => self.handle_editing(key, column),
        }
    }

    fn handle_viewing(&mut self, key: CellKey, value: &FieldValue, column: &ColumnSpec) -> CellAction {
        match key {
            CellKey::Up => CellAction::Navigate(Direction::Up),
            CellKey::Down => CellAction::Navigate(Direction::Down),
            CellKey::Left | CellKey::BackTab => CellAction::Navigate(Direction::Left),
            CellKey::Right | CellKey::Tab => CellAction::Navigate(Direction::Right),
            CellKey::Enter | CellKey::DoubleClick if column.editable => {
                self.begin(value);
                CellAction::Started
            }
            CellKey::Char(c) if column.editable && !c.is_control() => {
                self.begin_seeded(value, c, column);
                CellAction::Started
            }
            _ => CellAction::Ignored,
        }
    }

    fn handle_editing(&mut self, key: CellKey, column: &ColumnSpec) -> CellAction {
        let then = match key {
            CellKey::Enter => Some(Direction::Down),
            CellKey::Tab => Some(Direction::Right),
            CellKey::BackTab => Some(Direction::Left),
            CellKey::Blur => None,
            CellKey::Escape => {
                self.cancel();
                return CellAction::Cancelled;
            }
            CellKey::Char(c) if !c.is_control() => {
                self.buffer.insert(c);
                return CellAction::Edited;
            }
            CellKey::Backspace => {
                self.buffer.backspace();
                return CellAction::Edited;
            }
            CellKey::Delete => {
                self.buffer.delete();
                return CellAction::Edited;
            }
            CellKey::Left => {
                self.buffer.left();
                return CellAction::Edited;
            }
            CellKey::Right => {
                self.buffer.right();
                return CellAction::Edited;
            }
            CellKey::Home => {
                self.buffer.home();
                return CellAction::Edited;
            }
            CellKey::End => {
                self.buffer.end();
                return CellAction::Edited;
            }
            _ => return CellAction::Ignored,
        };

        let outcome = self.commit(column);
        CellAction::Committed { outcome, then }
    }
}
