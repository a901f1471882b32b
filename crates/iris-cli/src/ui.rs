//! TUI implementation for iris

use tokio::sync::mpsc;

use chrono::Local;
use crossterm::event::EventStream;
use futures::StreamExt;
use iris_ai::{Model, Usage};
use iris_session::{ConversationSession, Role, SessionEvent};
use iris_tui::{
    Theme,
    input::{Action, event_to_action},
    widgets::{InputBox, Picker, PickerState, Spinner, TranscriptEntry, TranscriptView, transcript_height},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use std::time::Instant;

use crate::commands::{self, CommandResult, SUGGESTED_QUESTIONS, execute_command};

/// Messages sent from the UI state to the event loop
#[derive(Debug, PartialEq)]
pub enum UiMessage {
    /// Ask a question about the current image
    Submit(String),
    /// Slash command
    Command(String),
    /// Clear transcript and image
    Clear,
    /// Abort the pending request
    Abort,
    Quit,
}

/// TUI application state
pub struct TuiState {
    entries: Vec<TranscriptEntry>,
    input: InputBox,
    /// Lines scrolled from the top; `usize::MAX` pins to the bottom
    scroll: usize,
    /// Set while a question is with the model
    busy_since: Option<Instant>,
    status: String,
    theme: Theme,
    model: Model,
    image: Option<String>,
    total_usage: Usage,
    picker: PickerState,
    ui_tx: mpsc::Sender<UiMessage>,
}

impl TuiState {
    pub fn new(model: Model, theme: Theme, ui_tx: mpsc::Sender<UiMessage>) -> Self {
        Self {
            entries: Vec::new(),
            input: InputBox::new().with_placeholder("Ask about the eye condition..."),
            scroll: 0,
            busy_since: None,
            status: "Ready".to_string(),
            theme,
            model,
            image: None,
            total_usage: Usage::default(),
            picker: PickerState::default(),
            ui_tx,
        }
    }

    fn is_busy(&self) -> bool {
        self.busy_since.is_some()
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll = usize::MAX;
    }

    pub fn show_notice(&mut self, text: &str) {
        self.entries.push(TranscriptEntry::notice(text));
        self.scroll_to_bottom();
    }

    /// Show a host-side error and drop any busy state
    pub fn show_alert(&mut self, text: &str) {
        self.busy_since = None;
        self.status = "Ready".to_string();
        self.entries.push(TranscriptEntry::alert(text));
        self.scroll_to_bottom();
    }

    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    /// Mirror session events into the transcript
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ImageSet { name, bytes } => {
                self.input.set_title(&name);
                self.show_notice(&format!(
                    "Image loaded: {} ({}). Ask a question about it.",
                    name,
                    commands::format_size(bytes)
                ));
                self.image = Some(name);
            }
            SessionEvent::QueryStart => {
                self.busy_since.get_or_insert_with(Instant::now);
                self.status = "Analyzing image...".to_string();
            }
            SessionEvent::TurnAppended { turn } => {
                let time = turn.timestamp().with_timezone(&Local).format("%H:%M").to_string();
                let entry = match turn.role() {
                    Role::User => TranscriptEntry::user(
                        turn.text(),
                        turn.image().map(|image| image.name().to_string()),
                    ),
                    Role::Assistant if turn.is_error() => TranscriptEntry::error(turn.text()),
                    Role::Assistant => TranscriptEntry::assistant(turn.text()),
                };
                self.entries.push(entry.at(time));
                self.scroll_to_bottom();
            }
            SessionEvent::QueryEnd { usage, is_error } => {
                self.busy_since = None;
                self.total_usage.add(&usage);
                self.status = if is_error {
                    "Request failed".to_string()
                } else {
                    format!(
                        "Ready | {} in, {} out",
                        self.total_usage.input, self.total_usage.output
                    )
                };
            }
            SessionEvent::Cleared => {
                self.entries.clear();
                self.image = None;
                self.input.set_title("");
                self.total_usage = Usage::default();
                self.scroll = 0;
                self.status = "Cleared".to_string();
            }
        }
    }

    /// Apply a key action. Returns false when the UI should exit.
    pub async fn handle_action(&mut self, action: Action) -> bool {
        if self.picker.visible {
            match action {
                Action::Up => self.picker.up(SUGGESTED_QUESTIONS.len()),
                Action::Down => self.picker.down(SUGGESTED_QUESTIONS.len()),
                Action::Submit => {
                    if let Some(question) = self.picker.choose(&SUGGESTED_QUESTIONS) {
                        self.input.set_content(question);
                    }
                }
                Action::Escape | Action::Suggestions => self.picker.hide(),
                Action::Quit => {
                    let _ = self.ui_tx.send(UiMessage::Quit).await;
                    return false;
                }
                _ => {}
            }
            return true;
        }

        match action {
            Action::Submit => {
                if self.is_busy() || self.input.content().trim().is_empty() {
                    return true;
                }
                let content = self.input.take();
                let content = content.trim().to_string();
                if content.starts_with('/') {
                    let _ = self.ui_tx.send(UiMessage::Command(content)).await;
                } else {
                    self.busy_since = Some(Instant::now());
                    self.scroll_to_bottom();
                    let _ = self.ui_tx.send(UiMessage::Submit(content)).await;
                }
                true
            }
            Action::Quit => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Interrupt => {
                if self.is_busy() {
                    let _ = self.ui_tx.send(UiMessage::Abort).await;
                    self.status = "Cancelling...".to_string();
                    true
                } else {
                    let _ = self.ui_tx.send(UiMessage::Quit).await;
                    false
                }
            }
            Action::Escape => {
                if self.is_busy() {
                    let _ = self.ui_tx.send(UiMessage::Abort).await;
                    self.status = "Cancelling...".to_string();
                } else {
                    self.input.clear();
                }
                true
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                true
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                true
            }
            Action::ClearSession => {
                if self.is_busy() {
                    self.status = "Busy: press Esc to abort first".to_string();
                } else {
                    let _ = self.ui_tx.send(UiMessage::Clear).await;
                }
                true
            }
            Action::OpenImage => {
                self.input.set_content("/image ");
                true
            }
            Action::Suggestions => {
                if !self.is_busy() {
                    self.picker.show();
                }
                true
            }
            _ => {
                self.input.handle_action(&action);
                true
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Transcript
                Constraint::Length(1), // Status
                Constraint::Length(3), // Input
            ])
            .split(size);

        self.render_transcript(frame, chunks[0]);
        self.render_status(frame, chunks[1]);

        if let Some(cursor) = self.input.render(chunks[2], frame.buffer_mut(), &self.theme) {
            if !self.picker.visible {
                frame.set_cursor_position(cursor);
            }
        }

        if self.picker.visible {
            let picker = Picker::new("Suggested questions", &SUGGESTED_QUESTIONS, &self.theme);
            frame.render_stateful_widget(picker, size, &mut self.picker);
        }
    }

    fn render_transcript(&mut self, frame: &mut Frame, area: Rect) {
        let image = self.image.as_deref().unwrap_or("no image");
        let title = format!(" iris │ {} │ {} ", self.model.short_name(), image);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 {
            return;
        }

        if self.entries.is_empty() && !self.is_busy() {
            frame.render_widget(self.welcome(), inner);
            return;
        }

        let busy = self.is_busy();
        let content_height = transcript_height(&self.entries, &self.theme, inner.width as usize, busy);
        let max_scroll = content_height.saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let view = TranscriptView::new(&self.entries, &self.theme)
            .scroll(self.scroll)
            .pending(self.busy_since);
        frame.render_widget(view, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(self.scroll);
            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn welcome(&self) -> Paragraph<'static> {
        let theme = &self.theme;
        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("    {:<10}", k), theme.accent_style()),
                Span::styled(what, theme.base_style()),
            ])
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  ◉ ", theme.accent_bold()),
                Span::styled("iris", theme.assistant_bold()),
                Span::styled(" - Eye Disease Analysis Assistant", theme.dim_style()),
            ]),
            Line::from(""),
            Line::from(Span::styled("  Specialized in analyzing:", theme.base_style())),
            Line::from(Span::styled("    • Cataracts", theme.base_style())),
            Line::from(Span::styled("    • Conjunctivitis (Pink Eye)", theme.base_style())),
            Line::from(Span::styled("    • Pterygium", theme.base_style())),
            Line::from(""),
            Line::from(Span::styled(format!("  {}", commands::DISCLAIMER), theme.warning_style())),
            Line::from(""),
        ];

        lines.push(match &self.image {
            Some(name) => Line::from(Span::styled(format!("  Image: {}", name), theme.accent_style())),
            None => Line::from(Span::styled(
                "  No image loaded. Type /image <path> or press Ctrl+O.",
                theme.dim_style(),
            )),
        });
        lines.push(Line::from(""));

        lines.push(Line::from(Span::styled("  Suggested questions", theme.warning_style())));
        for question in SUGGESTED_QUESTIONS {
            lines.push(Line::from(Span::styled(format!("    - {}", question), theme.dim_style())));
        }
        lines.push(Line::from(""));

        lines.push(Line::from(Span::styled("  Keybindings", theme.warning_style())));
        lines.extend([
            key("Enter", "Ask the question"),
            key("Ctrl+O", "Open an image"),
            key("Ctrl+S", "Pick a suggested question"),
            key("Ctrl+L", "Clear conversation and image"),
            key("Esc", "Abort a pending request"),
            key("Ctrl+C", "Abort / Quit"),
            key("PgUp/Dn", "Scroll history"),
        ]);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Type /help for commands, /about for the conditions.",
            theme.dim_style(),
        )));

        Paragraph::new(lines).wrap(Wrap { trim: false })
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some(since) = self.busy_since {
            let spinner = Spinner::new(&self.status, &self.theme).started_at(since);
            frame.render_widget(spinner, area);
            return;
        }

        let left = format!("{} │ {}", self.model.short_name(), self.status);
        let right = "Ctrl+O: image │ Ctrl+S: suggest │ Ctrl+C: quit";

        let left_width = left.chars().count();
        let right_width = right.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            Line::from(vec![
                Span::styled(left, self.theme.dim_style()),
                Span::raw(" ".repeat(available - left_width - right_width)),
                Span::styled(right, self.theme.dim_style()),
            ])
        } else {
            Line::from(Span::styled(left, self.theme.dim_style()))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Run the full-screen UI until the user quits
pub async fn run_tui(
    session: &mut ConversationSession,
    available_models: &[Model],
    theme: Theme,
) -> anyhow::Result<()> {
    use crossterm::{
        event::{DisableBracketedPaste, EnableBracketedPaste},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::{Terminal, backend::CrosstermBackend};
    use std::io;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, session, available_models, theme).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

type CrosstermTerminal = ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>;

async fn event_loop(
    terminal: &mut CrosstermTerminal,
    session: &mut ConversationSession,
    available_models: &[Model],
    theme: Theme,
) -> anyhow::Result<()> {
    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(32);
    let mut state = TuiState::new(session.config().model.clone(), theme, ui_tx);

    let mut session_rx = session.subscribe();
    let handle = session.handle();

    if let Some(image) = session.current_image() {
        state.handle_session_event(SessionEvent::ImageSet {
            name: image.name().to_string(),
            bytes: image.len(),
        });
    }

    let mut event_stream = EventStream::new();
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    let mut pending_query: Option<String> = None;

    loop {
        if let Some(question) = pending_query.take() {
            let mut quit = false;
            {
                let mut query = std::pin::pin!(session.submit_query(&question));

                loop {
                    terminal.draw(|frame| state.render(frame))?;

                    tokio::select! {
                        biased;

                        result = &mut query => {
                            if let Err(e) = result {
                                state.show_alert(&e.to_string());
                            }
                            break;
                        }

                        event = session_rx.recv() => {
                            if let Ok(event) = event {
                                state.handle_session_event(event);
                            }
                        }

                        event = event_stream.next() => {
                            match event {
                                Some(Ok(event)) => {
                                    if let Some(action) = event_to_action(event) {
                                        if !state.handle_action(action).await {
                                            quit = true;
                                            break;
                                        }
                                    }
                                }
                                Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                                None => {
                                    quit = true;
                                    break;
                                }
                            }
                        }

                        msg = ui_rx.recv() => {
                            match msg {
                                Some(UiMessage::Abort) => handle.abort(),
                                Some(UiMessage::Quit) | None => {
                                    quit = true;
                                    break;
                                }
                                // Input is locked while busy
                                Some(_) => {}
                            }
                        }

                        _ = tick_interval.tick() => {}
                    }
                }
            }

            while let Ok(event) = session_rx.try_recv() {
                state.handle_session_event(event);
            }

            if quit {
                return Ok(());
            }
            continue;
        }

        terminal.draw(|frame| state.render(frame))?;

        tokio::select! {
            biased;

            event = session_rx.recv() => {
                if let Ok(event) = event {
                    state.handle_session_event(event);
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(event)) => {
                        if let Some(action) = event_to_action(event) {
                            if !state.handle_action(action).await {
                                return Ok(());
                            }
                        }
                    }
                    Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                    None => return Ok(()),
                }
            }

            msg = ui_rx.recv() => {
                match msg {
                    Some(UiMessage::Submit(question)) => pending_query = Some(question),
                    Some(UiMessage::Command(cmd)) => {
                        if !run_slash_command(&cmd, session, available_models, &mut state, &mut pending_query) {
                            return Ok(());
                        }
                    }
                    Some(UiMessage::Clear) => session.clear(),
                    Some(UiMessage::Abort) => {}
                    Some(UiMessage::Quit) | None => return Ok(()),
                }
            }

            _ = tick_interval.tick() => {}
        }
    }
}

/// Execute a slash command against the session. Returns false on `/quit`.
fn run_slash_command(
    input: &str,
    session: &mut ConversationSession,
    available_models: &[Model],
    state: &mut TuiState,
    pending_query: &mut Option<String>,
) -> bool {
    let Some(result) = execute_command(input, session, available_models) else {
        return true;
    };

    match result {
        CommandResult::Message(msg) => state.show_notice(&msg),
        CommandResult::LoadImage(path) => {
            // Success is reported through the ImageSet event
            if let Err(e) = crate::load_image(session, &path) {
                state.show_alert(&format!("Error loading image {}: {}", path.display(), e));
            }
        }
        CommandResult::Ask(question) => {
            state.busy_since = Some(Instant::now());
            *pending_query = Some(question);
        }
        CommandResult::OpenSuggestions => state.picker.show(),
        CommandResult::ChangeModel(model) => {
            state.show_notice(&format!("Switched to: {} ({})", model.id, model.provider.name()));
            state.set_model(model.clone());
            session.set_model(model);
        }
        CommandResult::Clear => session.clear(),
        CommandResult::Exit => return false,
        CommandResult::Unknown(cmd) => state.show_notice(&format!(
            "Unknown command: /{}\nType /help for available commands.",
            cmd
        )),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_ai::models;
    use iris_session::Turn;
    use iris_tui::widgets::EntryKind;

    fn state() -> (TuiState, mpsc::Receiver<UiMessage>) {
        let (tx, rx) = mpsc::channel(8);
        (TuiState::new(models::default_model(), Theme::dark(), tx), rx)
    }

    async fn type_text(state: &mut TuiState, text: &str) {
        for c in text.chars() {
            state.handle_action(Action::Char(c)).await;
        }
    }

    #[tokio::test]
    async fn test_submit_question_marks_busy() {
        let (mut state, mut rx) = state();
        type_text(&mut state, "  is this pink eye? ").await;
        assert!(state.handle_action(Action::Submit).await);
        assert_eq!(rx.recv().await, Some(UiMessage::Submit("is this pink eye?".into())));
        assert!(state.is_busy());

        // A second submit while busy is ignored
        type_text(&mut state, "again").await;
        state.handle_action(Action::Submit).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_slash_input_is_a_command() {
        let (mut state, mut rx) = state();
        type_text(&mut state, "/about").await;
        state.handle_action(Action::Submit).await;
        assert_eq!(rx.recv().await, Some(UiMessage::Command("/about".into())));
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn test_interrupt_aborts_when_busy_and_quits_when_idle() {
        let (mut state, mut rx) = state();
        state.busy_since = Some(Instant::now());
        assert!(state.handle_action(Action::Interrupt).await);
        assert_eq!(rx.recv().await, Some(UiMessage::Abort));

        state.busy_since = None;
        assert!(!state.handle_action(Action::Interrupt).await);
        assert_eq!(rx.recv().await, Some(UiMessage::Quit));
    }

    #[tokio::test]
    async fn test_picker_fills_input() {
        let (mut state, _rx) = state();
        state.handle_action(Action::Suggestions).await;
        assert!(state.picker.visible);
        state.handle_action(Action::Down).await;
        state.handle_action(Action::Submit).await;
        assert!(!state.picker.visible);
        assert_eq!(state.input.content(), SUGGESTED_QUESTIONS[1]);
    }

    #[tokio::test]
    async fn test_clear_blocked_while_busy() {
        let (mut state, mut rx) = state();
        state.busy_since = Some(Instant::now());
        state.handle_action(Action::ClearSession).await;
        assert!(rx.try_recv().is_err());
        state.busy_since = None;
        state.handle_action(Action::ClearSession).await;
        assert_eq!(rx.recv().await, Some(UiMessage::Clear));
    }

    #[test]
    fn test_session_events_build_transcript() {
        let (mut state, _rx) = state();
        state.handle_session_event(SessionEvent::ImageSet {
            name: "eye.jpg".into(),
            bytes: 2048,
        });
        assert_eq!(state.image.as_deref(), Some("eye.jpg"));

        state.handle_session_event(SessionEvent::QueryStart);
        assert!(state.is_busy());
        state.handle_session_event(SessionEvent::TurnAppended {
            turn: Turn::assistant_error("Error processing image and query: Request aborted"),
        });
        state.handle_session_event(SessionEvent::QueryEnd {
            usage: Usage::default(),
            is_error: true,
        });
        assert!(!state.is_busy());
        assert_eq!(state.status, "Request failed");

        let kinds: Vec<EntryKind> = state.entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Notice, EntryKind::Error]);
        assert!(state.entries[0].time.is_none());
        assert_eq!(state.entries[1].time.as_ref().map(String::len), Some(5));

        state.handle_session_event(SessionEvent::Cleared);
        assert!(state.entries.is_empty());
        assert!(state.image.is_none());
    }

    #[test]
    fn test_alert_resets_busy() {
        let (mut state, _rx) = state();
        state.busy_since = Some(Instant::now());
        state.show_alert("Please upload an eye image first!");
        assert!(!state.is_busy());
        assert_eq!(state.entries[0].kind, EntryKind::Alert);
    }

    #[test]
    fn test_render_welcome_and_transcript() {
        use ratatui::{Terminal, backend::TestBackend};

        let (mut state, _rx) = state();
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|frame| state.render(frame)).unwrap();

        state.show_notice("hello");
        state.busy_since = Some(Instant::now());
        terminal.draw(|frame| state.render(frame)).unwrap();
        assert_eq!(state.scroll, 0);
    }
}
