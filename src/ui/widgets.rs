//! Small form primitives shared by the pages.

use crate::ui::theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};

/// Single-line text input.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    value: String,
    numeric: bool,
}

impl TextField {
    /// An input accepting any printable character.
    pub fn text() -> Self {
        Self {
            value: String::new(),
            numeric: false,
        }
    }

    /// An input accepting digits only.
    pub fn numeric() -> Self {
        Self {
            value: String::new(),
            numeric: true,
        }
    }

    /// Preset the field content.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Current content.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the content.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Parse the content as an integer.
    pub fn parse_u64(&self) -> Option<u64> {
        self.value.trim().parse().ok()
    }

    /// Apply one key press. Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => {
                if self.numeric && !c.is_ascii_digit() {
                    return true;
                }
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
}

/// One `label: value` form row, with a cursor mark when focused.
pub fn input_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let cursor = if focused { "_" } else { " " };
    let value_style = if focused {
        Style::default().fg(theme::ACCENT)
    } else {
        Style::default().fg(theme::TEXT)
    };
    Line::from(vec![
        Span::styled(format!("{label:>22}: "), Style::default().fg(theme::LABEL)),
        Span::styled(format!("{value}{cursor}"), value_style),
    ])
}

/// One `label: value` display row for selector/checkbox rows.
pub fn choice_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let marker = if focused { "‹" } else { " " };
    let value_style = if focused {
        Style::default().fg(theme::ACCENT)
    } else {
        Style::default().fg(theme::TEXT)
    };
    Line::from(vec![
        Span::styled(format!("{label:>22}: "), Style::default().fg(theme::LABEL)),
        Span::styled(format!("{value} {marker}"), value_style),
    ])
}

/// Fixed-size rectangle centered in `area`, clamped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_numeric_field_rejects_letters() {
        let mut field = TextField::numeric();
        field.handle_key(&press(KeyCode::Char('1')));
        field.handle_key(&press(KeyCode::Char('a')));
        field.handle_key(&press(KeyCode::Char('2')));
        assert_eq!(field.value(), "12");
        assert_eq!(field.parse_u64(), Some(12));
    }

    #[test]
    fn test_backspace_edits() {
        let mut field = TextField::text().with_value("abc");
        field.handle_key(&press(KeyCode::Backspace));
        assert_eq!(field.value(), "ab");
    }
}
