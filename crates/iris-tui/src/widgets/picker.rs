//! Popup picker for canned questions

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

const MAX_POPUP_WIDTH: u16 = 90;
const MAX_POPUP_HEIGHT: u16 = 16;

/// Selection and visibility, owned by the host between frames
#[derive(Debug, Default)]
pub struct PickerState {
    pub selected: usize,
    pub visible: bool,
}

impl PickerState {
    /// Open with the first item selected
    pub fn show(&mut self) {
        self.visible = true;
        self.selected = 0;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn up(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.selected = if self.selected == 0 { count - 1 } else { self.selected - 1 };
    }

    pub fn down(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % count;
    }

    /// Close and return the chosen item
    pub fn choose<'i, T: AsRef<str>>(&mut self, items: &'i [T]) -> Option<&'i str> {
        self.hide();
        items.get(self.selected).map(AsRef::as_ref)
    }
}

/// Centered list popup
pub struct Picker<'a, T: AsRef<str>> {
    title: &'a str,
    items: &'a [T],
    theme: &'a Theme,
}

impl<'a, T: AsRef<str>> Picker<'a, T> {
    pub fn new(title: &'a str, items: &'a [T], theme: &'a Theme) -> Self {
        Self { title, items, theme }
    }

    fn popup_area(&self, area: Rect) -> Rect {
        let widest = self
            .items
            .iter()
            .map(|i| i.as_ref().width() + 6)
            .chain(std::iter::once(self.title.width() + 4))
            .max()
            .unwrap_or(20);
        let width = (widest as u16).clamp(20, MAX_POPUP_WIDTH).min(area.width);
        let height = (self.items.len() as u16 + 2).min(MAX_POPUP_HEIGHT).min(area.height);
        let x = area.x + (area.width - width) / 2;
        let y = area.y + (area.height - height) / 2;
        Rect::new(x, y, width, height)
    }
}

impl<T: AsRef<str>> StatefulWidget for Picker<'_, T> {
    type State = PickerState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut PickerState) {
        let popup = self.popup_area(area);
        Clear.render(popup, buf);

        let highlight = Style::default()
            .bg(self.theme.accent)
            .fg(self.theme.bg)
            .add_modifier(Modifier::BOLD);
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| ListItem::new(Line::from(Span::styled(item.as_ref().to_string(), self.theme.base_style()))))
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" {} ", self.title))
                    .title_style(self.theme.accent_bold())
                    .borders(Borders::ALL)
                    .border_style(self.theme.accent_style()),
            )
            .highlight_style(highlight)
            .highlight_symbol("› ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut list_state = ListState::default();
        list_state.select(Some(state.selected.min(self.items.len().saturating_sub(1))));
        StatefulWidget::render(list, popup, buf, &mut list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTIONS: [&str; 3] = ["Is this pink eye?", "Any signs of cataract?", "Should I see a doctor?"];

    #[test]
    fn test_navigation_wraps() {
        let mut state = PickerState::default();
        state.show();
        state.up(QUESTIONS.len());
        assert_eq!(state.selected, 2);
        state.down(QUESTIONS.len());
        assert_eq!(state.selected, 0);
        state.up(0);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_choose_hides_and_returns_item() {
        let mut state = PickerState::default();
        state.show();
        state.down(QUESTIONS.len());
        assert_eq!(state.choose(&QUESTIONS), Some("Any signs of cataract?"));
        assert!(!state.visible);
    }

    #[test]
    fn test_render_fits_small_area() {
        let theme = Theme::dark();
        let area = Rect::new(0, 0, 15, 4);
        let mut buf = Buffer::empty(area);
        let mut state = PickerState::default();
        let picker = Picker::new("Suggested questions", &QUESTIONS, &theme);
        let popup = picker.popup_area(area);
        assert!(popup.width <= area.width && popup.height <= area.height);
        picker.render(area, &mut buf, &mut state);
    }
}
