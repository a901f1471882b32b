//! iris-session: the core of the iris assistant
//!
//! Two pieces live here: the image normalizer, which turns an uploaded photo
//! into a size-bounded JPEG payload, and the conversation session, which owns
//! the transcript and mediates every call to the inference service.

pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod normalizer;
pub mod prompt;
pub mod session;

pub use conversation::{ConversationState, Role, SessionPhase, Turn};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use normalizer::{EncodedPayload, ImageNormalizer, NormalizeOptions, SourceImage, normalize};
pub use session::{ConversationSession, SessionConfig};
