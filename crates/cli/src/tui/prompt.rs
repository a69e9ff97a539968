//! One-line prompts: server search and the quick filter.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use stockgrid_core::{CatalogQuery, SearchField, SearchMode, TextBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome {
    Pending,
    Cancelled,
    Search(CatalogQuery),
    Filter(String),
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: TextBuffer,
    pub field: SearchField,
    pub mode: SearchMode,
}

impl Prompt {
    pub fn search(term: &str, field: SearchField, mode: SearchMode) -> Self {
        Self { kind: PromptKind::Search, buffer: TextBuffer::new(term), field, mode }
    }

    pub fn filter(current: &str) -> Self {
        Self {
            kind: PromptKind::Filter,
            buffer: TextBuffer::new(current),
            field: SearchField::default(),
            mode: SearchMode::default(),
        }
    }

    pub fn label(&self) -> String {
        match self.kind {
            PromptKind::Search => format!("Search [{} {}]: ", self.field.label(), self.mode.as_param()),
            PromptKind::Filter => "Filter: ".to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return PromptOutcome::Cancelled,
            KeyCode::Enter => {
                return match self.kind {
                    PromptKind::Search => {
                        PromptOutcome::Search(CatalogQuery::search(self.buffer.as_str(), self.field, self.mode))
                    }
                    PromptKind::Filter => PromptOutcome::Filter(self.buffer.as_str().to_string()),
                };
            }
            KeyCode::Tab if self.kind == PromptKind::Search => self.field = self.field.next(),
            KeyCode::Char('o') if ctrl && self.kind == PromptKind::Search => self.mode = self.mode.next(),
            KeyCode::Char('u') if ctrl => self.buffer.clear(),
            KeyCode::Char(c) if !ctrl => self.buffer.insert(c),
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete(),
            KeyCode::Left => self.buffer.left(),
            KeyCode::Right => self.buffer.right(),
            KeyCode::Home => self.buffer.home(),
            KeyCode::End => self.buffer.end(),
            _ => {}
        }
        PromptOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_search_cycles_field_and_mode() {
        let mut prompt = Prompt::search("", SearchField::Description, SearchMode::Contains);
        for c in "PREGO".chars() {
            assert_eq!(prompt.handle_key(key(KeyCode::Char(c))), PromptOutcome::Pending);
        }
        prompt.handle_key(key(KeyCode::Tab));
        prompt.handle_key(ctrl('o'));
        assert_eq!(prompt.field, SearchField::Description.next());
        assert_eq!(prompt.mode, SearchMode::AtLeast);

        let outcome = prompt.handle_key(key(KeyCode::Enter));
        assert_eq!(
            outcome,
            PromptOutcome::Search(CatalogQuery::search("PREGO", SearchField::Description.next(), SearchMode::AtLeast))
        );
    }

    #[test]
    fn test_blank_search_lists_all() {
        let mut prompt = Prompt::search("  ", SearchField::Id, SearchMode::Exact);
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptOutcome::Search(CatalogQuery::All));
    }

    #[test]
    fn test_filter_editing() {
        let mut prompt = Prompt::filter("pre");
        prompt.handle_key(key(KeyCode::Backspace));
        prompt.handle_key(key(KeyCode::Char('g')));
        // Tab does nothing in the filter prompt
        prompt.handle_key(key(KeyCode::Tab));
        assert_eq!(prompt.label(), "Filter: ");
        assert_eq!(prompt.handle_key(key(KeyCode::Enter)), PromptOutcome::Filter("prg".into()));
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), PromptOutcome::Cancelled);
    }
}
