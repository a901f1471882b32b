//! Session event types

use iris_ai::Usage;

use crate::conversation::Turn;

/// Events emitted while the session changes
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new current image was stored
    ImageSet { name: String, bytes: usize },

    /// A query passed validation and is about to be sent
    QueryStart,

    /// A turn was appended to the transcript
    TurnAppended { turn: Turn },

    /// The query finished (answer or error turn appended)
    QueryEnd { usage: Usage, is_error: bool },

    /// Transcript and image were wiped
    Cleared,
}
