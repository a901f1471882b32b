//! Markdown rendering for model answers

use crate::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Convert markdown to styled lines, wrapped to `width` columns
pub fn render_markdown(text: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(theme, width.max(8));
    for event in Parser::new(text) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct Renderer<'t> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    pending: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// One entry per open list: the next number for ordered lists
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    code_block: Option<String>,
    /// Pending spans begin with a list marker that carries its own indent
    marker: bool,
}

impl<'t> Renderer<'t> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            pending: Vec::new(),
            styles: vec![theme.base_style()],
            lists: Vec::new(),
            quote_depth: 0,
            code_block: None,
            marker: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, f: impl FnOnce(Style) -> Style) {
        let next = f(self.style());
        self.styles.push(next);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn indent(&self) -> String {
        let mut indent = "│ ".repeat(self.quote_depth);
        indent.push_str(&"  ".repeat(self.lists.len()));
        indent
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    /// Wrap the pending spans into finished lines
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.pending);
        let indent = self.indent();
        let marker = std::mem::take(&mut self.marker);
        self.lines.extend(wrap_spans(
            spans,
            self.width,
            &indent,
            !marker,
            self.theme.dim_style(),
        ));
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code_block.as_mut() {
                Some(code) => code.push_str(&text),
                None => {
                    let style = self.style();
                    self.pending.push(Span::styled(text.into_string(), style));
                }
            },
            Event::Code(code) => {
                let style = self.theme.code_style().add_modifier(Modifier::BOLD);
                self.pending.push(Span::styled(format!("`{code}`"), style));
            }
            Event::SoftBreak => self.pending.push(Span::styled(" ", self.style())),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                let rule = "─".repeat(self.width.min(40));
                self.lines.push(Line::from(Span::styled(rule, self.theme.dim_style())));
                self.blank();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let theme = self.theme;
                self.push_style(|_| match level {
                    HeadingLevel::H1 => theme
                        .accent_style()
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    HeadingLevel::H2 => theme.accent_bold(),
                    _ => theme.accent_style(),
                });
            }
            // Loose list items open a paragraph right after the marker
            Tag::Paragraph if self.marker => {}
            Tag::Paragraph => self.flush(),
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let mut prefix = "│ ".repeat(self.quote_depth);
                prefix.push_str(&"  ".repeat(depth));
                prefix.push_str(&marker);
                self.pending.push(Span::styled(prefix, self.theme.dim_style()));
                self.marker = true;
            }
            Tag::Emphasis => self.push_style(|s| s.add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(|s| s.add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(|s| s.add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { .. } => {
                let link = self.theme.link;
                self.push_style(|s| s.fg(link).add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush();
                self.pop_style();
                self.blank();
            }
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                let code = self.code_block.take().unwrap_or_default();
                let style = self.theme.code_style().add_modifier(Modifier::DIM);
                let room = self.width.saturating_sub(2);
                for line in code.lines() {
                    self.lines
                        .push(Line::from(Span::styled(format!("  {}", truncate(line, room)), style)));
                }
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style()
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Cut `line` to at most `max` columns, marking the cut with an ellipsis
fn truncate(line: &str, max: usize) -> String {
    if line.width() <= max {
        return line.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in line.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Greedy word wrap over styled spans. Continuation lines get `indent`,
/// the first line only when `indent_first` is set.
fn wrap_spans(
    spans: Vec<Span<'static>>,
    width: usize,
    indent: &str,
    indent_first: bool,
    indent_style: Style,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    if indent_first && !indent.is_empty() {
        current.push(Span::styled(indent.to_string(), indent_style));
        used = indent.width();
    }

    for span in spans {
        let style = span.style;
        for word in span.content.split_inclusive(' ') {
            let w = word.width();
            if used + w.min(width) > width && used > indent.width() {
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(Span::styled(indent.to_string(), indent_style));
                used = indent.width();
                if word.trim().is_empty() {
                    continue;
                }
            }
            current.push(Span::styled(word.to_string(), style));
            used += w;
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}
