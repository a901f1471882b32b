//! /session command - show model, image and usage

use super::{CommandResult, format_size};
use iris_session::{ConversationSession, Role, SessionPhase};

pub struct SessionCommand;

impl SessionCommand {
    pub fn execute(session: &ConversationSession) -> CommandResult {
        let config = session.config();
        let usage = session.total_usage();
        let turns = session.turns();

        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!(
            "Model:      {} ({})\n",
            config.model.id,
            config.model.provider.name()
        ));
        output.push_str(&format!("Timeout:    {}s\n", config.timeout.as_secs()));
        output.push_str(&match session.current_image() {
            Some(image) => format!("Image:      {} ({})\n", image.name(), format_size(image.len())),
            None => "Image:      none\n".to_string(),
        });
        output.push_str(&format!("State:      {}\n", phase_label(session.phase())));
        output.push('\n');

        let questions = turns.iter().filter(|t| t.role() == Role::User).count();
        let failures = turns.iter().filter(|t| t.is_error()).count();
        output.push_str(&format!(
            "Questions:  {} ({} failed)\n",
            questions, failures
        ));
        output.push_str(&format!(
            "Tokens:     {} in, {} out",
            format_number(usage.input),
            format_number(usage.output)
        ));

        CommandResult::Message(output)
    }
}

fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Empty => "waiting for an image",
        SessionPhase::ImageLoaded => "ready for questions",
        SessionPhase::Active => "in conversation",
    }
}

fn format_number(n: u32) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.5k");
        assert_eq!(format_number(2_000_000), "2.0M");
    }

    #[test]
    fn test_empty_session_info() {
        let session = ConversationSession::new(
            iris_session::SessionConfig::new(iris_ai::models::default_model()),
            std::sync::Arc::new(iris_ai::OpenAIProvider::new("test-key")),
        );
        match SessionCommand::execute(&session) {
            CommandResult::Message(text) => {
                assert!(text.contains("Image:      none"));
                assert!(text.contains("waiting for an image"));
                assert!(text.contains("Questions:  0 (0 failed)"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
