//! Question input line with history recall

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

const PROMPT: &str = "› ";
const PROMPT_WIDTH: usize = 2;

/// Single-line editor. Text is kept as chars so the cursor is a plain index.
#[derive(Debug, Default)]
pub struct InputBox {
    chars: Vec<char>,
    cursor: usize,
    placeholder: String,
    title: String,
    history: Vec<String>,
    /// Position while browsing history; `None` means editing a fresh line
    history_index: Option<usize>,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Border title, e.g. the loaded image name
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn content(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn set_content(&mut self, content: &str) {
        self.chars = content.chars().collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
        self.history_index = None;
    }

    /// Take the line for submission and remember it for Up/Down recall
    pub fn take(&mut self) -> String {
        let line = self.content();
        if !line.trim().is_empty() && self.history.last() != Some(&line) {
            self.history.push(line.clone());
        }
        self.clear();
        line
    }

    /// Apply an editing action. Returns true if the action was consumed.
    pub fn handle_action(&mut self, action: &Action) -> bool {
        match action {
            Action::Char(c) => self.insert(&[*c]),
            Action::Paste(text) => {
                // Line breaks and tabs become spaces, other control chars are dropped
                let chars: Vec<char> = text
                    .replace("\r\n", "\n")
                    .chars()
                    .map(|c| if c.is_whitespace() { ' ' } else { c })
                    .filter(|c| !c.is_control())
                    .collect();
                self.insert(&chars);
            }
            Action::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.chars.remove(self.cursor);
            }
            Action::Delete if self.cursor < self.chars.len() => {
                self.chars.remove(self.cursor);
            }
            Action::Left => self.cursor = self.cursor.saturating_sub(1),
            Action::Right => self.cursor = (self.cursor + 1).min(self.chars.len()),
            Action::Home => self.cursor = 0,
            Action::End => self.cursor = self.chars.len(),
            Action::ClearLine => self.clear(),
            Action::DeleteWord => {
                let mut start = self.cursor;
                while start > 0 && self.chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && self.chars[start - 1] != ' ' {
                    start -= 1;
                }
                self.chars.drain(start..self.cursor);
                self.cursor = start;
            }
            Action::Up => self.recall_older(),
            Action::Down => self.recall_newer(),
            Action::Backspace | Action::Delete => {}
            _ => return false,
        }
        true
    }

    fn insert(&mut self, chars: &[char]) {
        self.chars
            .splice(self.cursor..self.cursor, chars.iter().copied());
        self.cursor += chars.len();
        self.history_index = None;
    }

    fn recall_older(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            Some(0) => 0,
            Some(i) => i - 1,
            None => self.history.len() - 1,
        };
        self.history_index = Some(index);
        let line = self.history[index].clone();
        self.set_content(&line);
    }

    fn recall_newer(&mut self) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => {
                self.history_index = Some(i + 1);
                let line = self.history[i + 1].clone();
                self.set_content(&line);
            }
            Some(_) => {
                self.history_index = None;
                self.chars.clear();
                self.cursor = 0;
            }
            None => {}
        }
    }

    /// Draw the box and return where the terminal cursor belongs
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) -> Option<Position> {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(Span::styled(format!(" {} ", self.title), theme.dim_style()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width < 3 || inner.height == 0 {
            return None;
        }

        let room = inner.width as usize - PROMPT_WIDTH;
        let before: usize = self.chars[..self.cursor].iter().map(char_width).sum();
        let mut skip = 0;
        let mut hidden = 0;
        while before - hidden >= room && skip < self.cursor {
            hidden += char_width(&self.chars[skip]);
            skip += 1;
        }

        let body = if self.chars.is_empty() {
            Span::styled(self.placeholder.clone(), theme.dim_style())
        } else {
            Span::styled(self.chars[skip..].iter().collect::<String>(), theme.base_style())
        };
        let line = Line::from(vec![Span::styled(PROMPT, theme.accent_style()), body]);
        Paragraph::new(line).render(inner, buf);

        let x = inner.x + (PROMPT_WIDTH + before - hidden) as u16;
        Some(Position::new(x.min(inner.right().saturating_sub(1)), inner.y))
    }
}

fn char_width(c: &char) -> usize {
    c.width().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_action(&Action::Char(c));
        }
        input
    }

    #[test]
    fn test_typing_and_editing() {
        let mut input = typed("red eye");
        input.handle_action(&Action::Home);
        input.handle_action(&Action::Delete);
        input.handle_action(&Action::Char('R'));
        assert_eq!(input.content(), "Red eye");
        input.handle_action(&Action::End);
        input.handle_action(&Action::Backspace);
        assert_eq!(input.content(), "Red ey");
    }

    #[test]
    fn test_delete_word() {
        let mut input = typed("is this   stye");
        input.handle_action(&Action::DeleteWord);
        assert_eq!(input.content(), "is this   ");
        input.handle_action(&Action::DeleteWord);
        assert_eq!(input.content(), "is ");
    }

    #[test]
    fn test_multibyte_cursor() {
        let mut input = typed("ojo é");
        input.handle_action(&Action::Left);
        input.handle_action(&Action::Backspace);
        assert_eq!(input.content(), "ojoé");
    }

    #[test]
    fn test_paste_turns_line_breaks_into_spaces() {
        let mut input = InputBox::new();
        input.handle_action(&Action::Paste("what is\nthis".into()));
        assert_eq!(input.content(), "what is this");

        input.clear();
        input.handle_action(&Action::Paste("red\r\neye\u{7}".into()));
        assert_eq!(input.content(), "red eye");
    }

    #[test]
    fn test_history_recall() {
        let mut input = typed("first");
        assert_eq!(input.take(), "first");
        input.set_content("second");
        input.take();

        input.handle_action(&Action::Up);
        assert_eq!(input.content(), "second");
        input.handle_action(&Action::Up);
        assert_eq!(input.content(), "first");
        input.handle_action(&Action::Up);
        assert_eq!(input.content(), "first");
        input.handle_action(&Action::Down);
        assert_eq!(input.content(), "second");
        input.handle_action(&Action::Down);
        assert!(input.is_empty());
    }

    #[test]
    fn test_unhandled_actions() {
        let mut input = InputBox::new();
        assert!(!input.handle_action(&Action::Submit));
        assert!(!input.handle_action(&Action::Quit));
    }

    #[test]
    fn test_render_cursor_position() {
        let theme = Theme::dark();
        let input = typed("abc");
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        let cursor = input.render(area, &mut buf, &theme).unwrap();
        assert_eq!(cursor, Position::new(1 + 2 + 3, 1));
    }
}
