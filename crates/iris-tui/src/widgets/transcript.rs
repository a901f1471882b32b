//! Transcript widget: questions, answers and host notices

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::time::Instant;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// What kind of row an entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A question the user asked
    User,
    /// A model answer, rendered as markdown
    Assistant,
    /// A failed request, shown in the error color
    Error,
    /// Host output such as help text or "image loaded"
    Notice,
    /// Host-side problem, e.g. a question sent before any image
    Alert,
}

/// Display model for one transcript row
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
    /// File name shown under a user question
    pub image_label: Option<String>,
    /// Clock time shown in the header
    pub time: Option<String>,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>, image_label: Option<String>) -> Self {
        Self {
            kind: EntryKind::User,
            text: text.into(),
            image_label,
            time: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Assistant,
            text: text.into(),
            image_label: None,
            time: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Error,
            text: text.into(),
            image_label: None,
            time: None,
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Notice,
            text: text.into(),
            image_label: None,
            time: None,
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Alert,
            text: text.into(),
            image_label: None,
            time: None,
        }
    }

    /// Show `time` next to the header
    pub fn at(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    fn header(&self, label: &'static str, style: Style, theme: &Theme) -> Line<'static> {
        let mut spans = vec![Span::styled(label, style)];
        if let Some(time) = &self.time {
            spans.push(Span::styled(format!("  {time}"), theme.dim_style()));
        }
        Line::from(spans)
    }

    /// Lay out this entry at `width` columns, trailing separator included
    pub fn lines(&self, theme: &Theme, width: usize) -> Vec<Line<'static>> {
        let content_width = width.saturating_sub(2).max(1);
        let mut lines = Vec::new();

        match self.kind {
            EntryKind::User => {
                lines.push(self.header("▶ You", theme.accent_bold(), theme));
                lines.extend(plain_lines(&self.text, content_width, theme.base_style()));
                if let Some(label) = &self.image_label {
                    lines.extend(plain_lines(
                        &format!("Analyzed image: {label}"),
                        content_width,
                        theme.dim_style(),
                    ));
                }
            }
            EntryKind::Assistant => {
                lines.push(self.header("◀ Assistant", theme.assistant_bold(), theme));
                for line in render_markdown(&self.text, theme, content_width) {
                    let mut spans = vec![Span::raw("  ")];
                    spans.extend(line.spans);
                    lines.push(Line::from(spans));
                }
            }
            EntryKind::Error => {
                lines.push(self.header("◀ Assistant", theme.error_style(), theme));
                lines.extend(plain_lines(&self.text, content_width, theme.error_style()));
            }
            EntryKind::Notice | EntryKind::Alert => {
                let (marker, style) = if self.kind == EntryKind::Alert {
                    ("! ", theme.error_style())
                } else {
                    ("● ", theme.dim_style())
                };
                for (i, line) in textwrap::wrap(&self.text, content_width).into_iter().enumerate() {
                    let prefix = if i == 0 { marker } else { "  " };
                    lines.push(Line::from(Span::styled(format!("{prefix}{line}"), style)));
                }
            }
        }

        lines.push(Line::default());
        lines
    }
}

fn plain_lines(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .flat_map(|raw| {
            let wrapped = textwrap::wrap(raw, width);
            if wrapped.is_empty() {
                vec![Line::default()]
            } else {
                wrapped
                    .into_iter()
                    .map(|l| Line::from(Span::styled(format!("  {l}"), style)))
                    .collect()
            }
        })
        .collect()
}

/// Scrollable transcript, with a thinking row while a request is pending
pub struct TranscriptView<'a> {
    entries: &'a [TranscriptEntry],
    theme: &'a Theme,
    scroll: usize,
    pending_since: Option<Instant>,
}

impl<'a> TranscriptView<'a> {
    pub fn new(entries: &'a [TranscriptEntry], theme: &'a Theme) -> Self {
        Self {
            entries,
            theme,
            scroll: 0,
            pending_since: None,
        }
    }

    /// Lines to skip from the top
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Show the thinking row, animated from `since`
    pub fn pending(mut self, since: Option<Instant>) -> Self {
        self.pending_since = since;
        self
    }

    fn all_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = self
            .entries
            .iter()
            .flat_map(|e| e.lines(self.theme, width))
            .collect();
        if let Some(since) = self.pending_since {
            let frame = (since.elapsed().as_millis() / 80) as usize % SPINNER_FRAMES.len();
            lines.push(Line::from(Span::styled(
                format!("  {} analyzing image...", SPINNER_FRAMES[frame]),
                self.theme.warning_style(),
            )));
        }
        lines
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let visible: Vec<Line> = self
            .all_lines(area.width as usize)
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();
        Paragraph::new(visible).render(area, buf);
    }
}

/// Total rendered height of the transcript at `width`
pub fn transcript_height(
    entries: &[TranscriptEntry],
    theme: &Theme,
    width: usize,
    pending: bool,
) -> usize {
    let rows: usize = entries.iter().map(|e| e.lines(theme, width).len()).sum();
    rows + usize::from(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| &*s.content).collect())
            .collect()
    }

    #[test]
    fn test_user_entry_shows_image_label() {
        let theme = Theme::dark();
        let entry = TranscriptEntry::user("Is this pink eye?", Some("left_eye.png".into()));
        let text = text_of(&entry.lines(&theme, 60));
        assert_eq!(text[0], "▶ You");
        assert_eq!(text[1], "  Is this pink eye?");
        assert_eq!(text[2], "  Analyzed image: left_eye.png");
        assert_eq!(text.last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_header_shows_time() {
        let theme = Theme::dark();
        let entry = TranscriptEntry::assistant("No redness.").at("14:02");
        let text = text_of(&entry.lines(&theme, 60));
        assert_eq!(text[0], "◀ Assistant  14:02");
    }

    #[test]
    fn test_error_entry_uses_error_style() {
        let theme = Theme::dark();
        let lines = TranscriptEntry::error("Error processing image and query: boom").lines(&theme, 60);
        assert_eq!(lines[1].spans[0].style, theme.error_style());
    }

    #[test]
    fn test_alert_entry() {
        let theme = Theme::dark();
        let lines = TranscriptEntry::alert("Please upload an eye image first!").lines(&theme, 60);
        assert_eq!(lines[0].spans[0].content, "! Please upload an eye image first!");
        assert_eq!(lines[0].spans[0].style, theme.error_style());
    }

    #[test]
    fn test_assistant_entry_indents_markdown() {
        let theme = Theme::dark();
        let text = text_of(&TranscriptEntry::assistant("**Mild** redness").lines(&theme, 60));
        assert_eq!(text[0], "◀ Assistant");
        assert_eq!(text[1], "  Mild redness");
    }

    #[test]
    fn test_height_matches_render() {
        let theme = Theme::dark();
        let entries = vec![
            TranscriptEntry::notice("Loaded image eye.jpg"),
            TranscriptEntry::user("what do you see in this picture of my eye", Some("eye.jpg".into())),
            TranscriptEntry::assistant("1. redness\n2. swelling\n\nSee a doctor."),
        ];
        let width = 24;
        let expected: usize = entries.iter().map(|e| e.lines(&theme, width).len()).sum();
        assert_eq!(transcript_height(&entries, &theme, width, false), expected);
        assert_eq!(transcript_height(&entries, &theme, width, true), expected + 1);
    }

    #[test]
    fn test_render_applies_scroll() {
        let theme = Theme::dark();
        let entries = vec![TranscriptEntry::notice("first"), TranscriptEntry::notice("second")];
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        TranscriptView::new(&entries, &theme).scroll(2).render(area, &mut buf);
        let row: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(row.starts_with("● second"));
    }
}
