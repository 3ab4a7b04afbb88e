//! Single-line text input with optional masking.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::theme;

#[derive(Debug, Clone)]
pub struct TextField {
    label: &'static str,
    value: String,
    masked: bool,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
        }
    }

    /// A field whose contents render as bullets.
    pub fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(label)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Take the contents, leaving the field empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.value)
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// Apply an editing key. Returns `false` for keys the field ignores.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.value.push(c);
                true
            }
            KeyCode::Backspace => {
                self.value.pop();
                true
            }
            _ => false,
        }
    }

    /// Text as shown on screen.
    pub fn display(&self) -> String {
        if self.masked {
            "\u{25CF}".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// Bordered input box with the label in the title. Needs 3 rows.
    pub fn render(&self, frame: &mut Frame, area: Rect, active: bool) {
        let border = if active {
            theme::border_focused()
        } else {
            theme::border_default()
        };
        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.label),
                if active {
                    theme::title_style()
                } else {
                    theme::key_hint()
                },
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut text = self.display();
        if active {
            text.push('\u{2588}');
        }
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(theme::TEXT))),
            inner,
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn edits_and_masks() {
        let mut field = TextField::masked("Password");
        for c in "abc".chars() {
            assert!(field.handle_key(key(KeyCode::Char(c))));
        }
        assert!(field.handle_key(key(KeyCode::Backspace)));
        assert_eq!(field.value(), "ab");
        assert_eq!(field.display(), "\u{25CF}\u{25CF}");
        assert!(!field.handle_key(key(KeyCode::Enter)));
    }

    #[test]
    fn control_chords_are_not_text() {
        let mut field = TextField::new("Email");
        let handled = field.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert!(!handled);
        assert_eq!(field.take(), "");
    }
}
