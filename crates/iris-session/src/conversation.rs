//! Conversation state: the ordered transcript and the current image slot.

use chrono::{DateTime, Utc};

use crate::normalizer::SourceImage;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry in the transcript. Immutable once created.
#[derive(Debug, Clone)]
pub struct Turn {
    role: Role,
    text: String,
    image: Option<SourceImage>,
    is_error: bool,
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// A user question about `image`
    pub fn user(text: impl Into<String>, image: SourceImage) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image: Some(image),
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// A model answer
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            image: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// An assistant turn reporting a failed inference call
    pub fn assistant_error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(text)
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The image a user turn asked about
    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// When the turn was appended
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No image, no turns
    Empty,
    /// Image present, no turns yet
    ImageLoaded,
    /// At least one turn
    Active,
}

/// Transcript plus the single "current image" slot
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: Vec<Turn>,
    current_image: Option<SourceImage>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns in submission order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn current_image(&self) -> Option<&SourceImage> {
        self.current_image.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.turns.is_empty() {
            SessionPhase::Active
        } else if self.current_image.is_some() {
            SessionPhase::ImageLoaded
        } else {
            SessionPhase::Empty
        }
    }

    /// Replace the current image; the transcript is untouched
    pub(crate) fn set_image(&mut self, image: SourceImage) -> Option<SourceImage> {
        self.current_image.replace(image)
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drop all turns and the image together
    pub(crate) fn clear(&mut self) {
        self.turns.clear();
        self.current_image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::png_fixture;

    #[test]
    fn test_phases() {
        let mut state = ConversationState::new();
        assert_eq!(state.phase(), SessionPhase::Empty);

        state.set_image(png_fixture(8, 8));
        assert_eq!(state.phase(), SessionPhase::ImageLoaded);

        state.push(Turn::user("hello", png_fixture(8, 8)));
        assert_eq!(state.phase(), SessionPhase::Active);

        state.clear();
        assert_eq!(state.phase(), SessionPhase::Empty);
        assert!(state.turns().is_empty());
        assert!(state.current_image().is_none());
    }

    #[test]
    fn test_set_image_returns_previous() {
        let mut state = ConversationState::new();
        assert!(state.set_image(png_fixture(4, 4)).is_none());
        let previous = state.set_image(png_fixture(6, 6)).unwrap();
        assert_eq!(previous.name(), "eye_4x4.png");
        assert_eq!(state.current_image().unwrap().name(), "eye_6x6.png");
    }

    #[test]
    fn test_error_turn() {
        let turn = Turn::assistant_error("boom");
        assert_eq!(turn.role(), Role::Assistant);
        assert!(turn.is_error());
        assert!(turn.image().is_none());
        assert_eq!(turn.role().as_str(), "assistant");
    }
}
