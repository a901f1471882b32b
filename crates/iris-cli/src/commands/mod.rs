//! Slash commands for interactive mode

mod model;
mod session;

pub use model::ModelCommand;
pub use session::SessionCommand;

use iris_ai::Model;
use iris_session::ConversationSession;
use std::path::PathBuf;

/// Canned questions offered while the transcript is empty
pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "What signs of eye conditions can you see in this image?",
    "Are there any visible symptoms of cataracts?",
    "Does this image show signs of conjunctivitis?",
    "Can you identify any pterygium formation?",
    "What are the key characteristics you notice in this eye image?",
];

/// Short disclaimer shown on the welcome screen and in plain mode
pub const DISCLAIMER: &str = "This tool provides educational information only, not medical diagnosis. \
Always consult healthcare professionals for proper medical advice.";

/// Result of executing a slash command
#[derive(Debug)]
pub enum CommandResult {
    /// Show a message to the user (not sent to the model)
    Message(String),
    /// Load a new current image
    LoadImage(PathBuf),
    /// Ask a question as if it was typed
    Ask(String),
    /// Open the suggested questions picker (TUI only)
    OpenSuggestions,
    /// Switch the model for later questions
    ChangeModel(Model),
    /// Clear transcript and image
    Clear,
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(
    input: &str,
    session: &ConversationSession,
    available_models: &[Model],
) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default().to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "about" | "a" => CommandResult::Message(about_message()),

        "image" | "i" | "open" => image_command(args, session),

        "suggest" | "s" => suggest_command(args),

        "model" | "m" => ModelCommand::execute(args, &session.config().model, available_models),

        "session" | "status" => SessionCommand::execute(session),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn image_command(args: &str, session: &ConversationSession) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(match session.current_image() {
            Some(image) => format!(
                "Current image: {} ({})\nUse /image <path> to replace it.",
                image.name(),
                format_size(image.len())
            ),
            None => "No image loaded. Use /image <path> (PNG or JPEG).".to_string(),
        });
    }
    CommandResult::LoadImage(expand_path(args))
}

fn suggest_command(args: &str) -> CommandResult {
    if args.is_empty() {
        return CommandResult::OpenSuggestions;
    }
    match args.parse::<usize>() {
        Ok(n) if (1..=SUGGESTED_QUESTIONS.len()).contains(&n) => {
            CommandResult::Ask(SUGGESTED_QUESTIONS[n - 1].to_string())
        }
        _ => CommandResult::Message(format!(
            "Pick a question between 1 and {}\n\n{}",
            SUGGESTED_QUESTIONS.len(),
            suggestions_text()
        )),
    }
}

/// Numbered list of the suggested questions
pub fn suggestions_text() -> String {
    let mut out = String::from("Suggested questions:\n");
    for (i, q) in SUGGESTED_QUESTIONS.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, q));
    }
    out.push_str("\nAsk one with /suggest <number>");
    out
}

/// Strip quotes a terminal adds on drag and drop, and expand a leading `~`
fn expand_path(raw: &str) -> PathBuf {
    let trimmed = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    match trimmed.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(trimmed)),
        None => PathBuf::from(trimmed),
    }
}

pub fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn help_message() -> String {
    r#"Available commands:
  /image, /i <path>    Load an eye image (PNG or JPEG)
  /image               Show the current image
  /suggest, /s [n]     Pick a suggested question, or ask number n
  /about, /a           About the conditions iris looks for
  /model, /m [name]    List vision models or switch to one
  /session, /status    Show model, image and token usage
  /clear, /c           Clear the conversation and the image
  /help, /h, /?        Show this help message
  /quit, /exit, /q     Exit iris

Anything else you type is sent as a question about the current image.

Examples:
  /image ~/Pictures/left_eye.jpg
  /suggest 2
  /model maverick"#
        .to_string()
}

fn about_message() -> String {
    r#"About these conditions:

Cataracts
  - Clouding of eye lens
  - Blurry vision
  - Common in older adults

Conjunctivitis (pink eye)
  - Eye inflammation
  - Redness and irritation
  - Various causes

Pterygium
  - Tissue growth on cornea
  - UV exposure related
  - May affect vision"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_ai::{OpenAIProvider, models};
    use iris_session::SessionConfig;
    use std::sync::Arc;

    fn session() -> ConversationSession {
        ConversationSession::new(
            SessionConfig::new(models::default_model()),
            Arc::new(OpenAIProvider::new("test-key")),
        )
    }

    fn run(input: &str) -> CommandResult {
        execute_command(input, &session(), &models::get_models(iris_ai::Provider::Groq)).unwrap()
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert!(execute_command("is this pink eye?", &session(), &[]).is_none());
    }

    #[test]
    fn test_image_command() {
        match run("/image  \"/tmp/eye scan.png\" ") {
            CommandResult::LoadImage(path) => assert_eq!(path, PathBuf::from("/tmp/eye scan.png")),
            other => panic!("unexpected: {other:?}"),
        }
        match run("/image") {
            CommandResult::Message(msg) => assert!(msg.starts_with("No image loaded")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_home_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/eye.jpg"), home.join("eye.jpg"));
        }
        assert_eq!(expand_path("'eye.jpg'"), PathBuf::from("eye.jpg"));
    }

    #[test]
    fn test_suggest_command() {
        assert!(matches!(run("/suggest"), CommandResult::OpenSuggestions));
        match run("/s 3") {
            CommandResult::Ask(q) => assert_eq!(q, SUGGESTED_QUESTIONS[2]),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(run("/suggest 9"), CommandResult::Message(_)));
        assert!(matches!(run("/suggest zero"), CommandResult::Message(_)));
    }

    #[test]
    fn test_aliases() {
        assert!(matches!(run("/CLEAR"), CommandResult::Clear));
        assert!(matches!(run("/q"), CommandResult::Exit));
        assert!(matches!(run("/about"), CommandResult::Message(m) if m.contains("Pterygium")));
        assert!(matches!(run("/help"), CommandResult::Message(m) if m.contains("/image")));
        assert!(matches!(run("/frobnicate"), CommandResult::Unknown(c) if c == "frobnicate"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
