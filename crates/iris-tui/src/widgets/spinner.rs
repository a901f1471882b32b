//! Busy indicator shown while a query is with the model

use crate::theme::Theme;
use ratatui::{buffer::Buffer, layout::Rect, text::Span, widgets::Widget};
use std::time::Instant;

const FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];
const FRAME_MILLIS: u128 = 120;

/// Animated spinner with a label
pub struct Spinner<'a> {
    label: &'a str,
    theme: &'a Theme,
    started: Instant,
}

impl<'a> Spinner<'a> {
    pub fn new(label: &'a str, theme: &'a Theme) -> Self {
        Self {
            label,
            theme,
            started: Instant::now(),
        }
    }

    /// Animate relative to a fixed start so redraws don't reset the frame
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    fn frame(&self) -> &'static str {
        let index = (self.started.elapsed().as_millis() / FRAME_MILLIS) as usize;
        FRAMES[index % FRAMES.len()]
    }
}

impl Widget for Spinner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 3 || area.height == 0 {
            return;
        }
        let text = format!("{} {}", self.frame(), self.label);
        buf.set_span(area.x, area.y, &Span::styled(text, self.theme.warning_style()), area.width);
    }
}
