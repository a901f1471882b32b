//! /model command - list and switch vision models

use super::CommandResult;
use iris_ai::Model;

pub struct ModelCommand;

impl ModelCommand {
    /// List models with no args, otherwise switch to the best match
    pub fn execute(args: &str, current: &Model, available: &[Model]) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(list_models(current, available));
        }
        match find_model(args, available) {
            Some(model) => CommandResult::ChangeModel(model),
            None => CommandResult::Message(format!(
                "No model found matching '{}'\nUse /model to list available models",
                args
            )),
        }
    }
}

fn list_models(current: &Model, models: &[Model]) -> String {
    if models.is_empty() {
        return format!("Current model: {} (no other models known for {})", current.id, current.provider.name());
    }

    let mut output = format!("{} vision models:\n", current.provider.name());
    for model in models {
        let marker = if model.id == current.id { " *" } else { "" };
        output.push_str(&format!("  {:<48} {}{}\n", model.id, model.name, marker));
    }
    if !models.iter().any(|m| m.id == current.id) {
        output.push_str(&format!("\nCurrent (custom): {}\n", current.id));
    }
    output.push_str("\nSwitch with: /model <name>");
    output
}

fn find_model(query: &str, models: &[Model]) -> Option<Model> {
    let query = query.to_lowercase();

    models
        .iter()
        .find(|m| m.id.to_lowercase() == query)
        .or_else(|| models.iter().find(|m| m.id.to_lowercase().contains(&query)))
        .or_else(|| models.iter().find(|m| m.name.to_lowercase().contains(&query)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_ai::{Provider, models};

    #[test]
    fn test_switch_by_partial_id() {
        let available = models::get_models(Provider::Groq);
        let current = models::default_model();
        match ModelCommand::execute("maverick", &current, &available) {
            CommandResult::ChangeModel(m) => assert!(m.id.contains("maverick")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_exact_match_preferred() {
        let available = models::get_models(Provider::Groq);
        let found = find_model("LLAMA-3.2-11B-VISION-PREVIEW", &available).unwrap();
        assert_eq!(found.id, "llama-3.2-11b-vision-preview");
    }

    #[test]
    fn test_list_marks_current() {
        let available = models::get_models(Provider::Groq);
        let current = models::default_model();
        let text = list_models(&current, &available);
        assert!(text.contains("llama-3.2-90b-vision-preview"));
        assert!(text.lines().any(|l| l.contains(&current.id) && l.ends_with(" *")));
    }

    #[test]
    fn test_no_match() {
        let available = models::get_models(Provider::Groq);
        let current = models::default_model();
        assert!(matches!(
            ModelCommand::execute("claude", &current, &available),
            CommandResult::Message(m) if m.contains("No model found")
        ));
    }
}
