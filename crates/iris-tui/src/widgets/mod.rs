//! Widgets for the assistant screen

pub mod input_box;
pub mod markdown;
pub mod picker;
pub mod spinner;
pub mod transcript;

pub use input_box::InputBox;
pub use picker::{Picker, PickerState};
pub use spinner::Spinner;
pub use transcript::{EntryKind, TranscriptEntry, TranscriptView, transcript_height};
