//! Core types for vision model requests

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Known inference providers.
///
/// All of them expose an OpenAI-compatible Chat Completions endpoint that
/// accepts `image_url` content parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    OpenAI,
    OpenRouter,
    Custom,
}

impl Provider {
    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::OpenAI => "OpenAI",
            Provider::OpenRouter => "OpenRouter",
            Provider::Custom => "Custom",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::OpenRouter => Some("OPENROUTER_API_KEY"),
            Provider::Custom => None,
        }
    }

    /// Default API base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::Custom => "",
        }
    }

    /// Parse a provider from its config/CLI spelling. Unknown names map to `Custom`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "groq" => Provider::Groq,
            "openai" => Provider::OpenAI,
            "openrouter" => Provider::OpenRouter,
            _ => Provider::Custom,
        }
    }
}

/// Model definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier sent to the API (e.g., "llama-3.2-90b-vision-preview")
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Provider
    pub provider: Provider,
    /// Base URL for API calls
    pub base_url: String,
    /// Whether the model accepts image input
    pub vision: bool,
    /// Maximum output tokens the model allows
    pub max_tokens: u32,
    /// Additional headers for API calls
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Model {
    /// Build a model entry for an id the registry does not know about.
    pub fn custom(provider: Provider, id: impl Into<String>, base_url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            provider,
            base_url: base_url.into(),
            vision: true,
            max_tokens: 8192,
            headers: HashMap::new(),
        }
    }

    /// Short display name (last path segment of the id)
    pub fn short_name(&self) -> &str {
        self.id.split('/').next_back().unwrap_or(&self.id)
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input: u32,
    pub output: u32,
}

impl Usage {
    /// Add another usage record to this one
    pub fn add(&mut self, other: &Usage) {
        self.input = self.input.saturating_add(other.input);
        self.output = self.output.saturating_add(other.output);
    }
}

/// Reason why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response
    Stop,
    /// Maximum tokens reached
    Length,
    /// Provider filtered the output
    ContentFilter,
}

/// Content parts of a request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Text content
    Text { text: String },
    /// Image content (base64 encoded)
    Image { data: String, mime_type: String },
}

impl Content {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create image content from base64 data
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Get text if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// `data:` URL for image content
    pub fn data_url(&self) -> Option<String> {
        match self {
            Self::Image { data, mime_type } => Some(format!("data:{};base64,{}", mime_type, data)),
            _ => None,
        }
    }
}

/// Sampling options for a request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceOptions {
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

/// A single-turn multimodal request: one user message made of content parts.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: Model,
    pub content: Vec<Content>,
    pub options: InferenceOptions,
}

impl InferenceRequest {
    /// Create a request with default options
    pub fn new(model: Model, content: Vec<Content>) -> Self {
        Self {
            model,
            content,
            options: InferenceOptions::default(),
        }
    }

    /// Set sampling options
    pub fn with_options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    /// Combined text of all text parts
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Number of image parts
    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .filter(|c| matches!(c, Content::Image { .. }))
            .count()
    }
}

/// A complete (non-streamed) model response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Model that produced the response, as reported by the API
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Usage,
    pub stop_reason: Option<StopReason>,
}

impl Completion {
    /// Completion holding just text (used by stubs and tests)
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            usage: Usage::default(),
            stop_reason: Some(StopReason::Stop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("groq"), Provider::Groq);
        assert_eq!(Provider::parse("OpenAI"), Provider::OpenAI);
        assert_eq!(Provider::parse("openrouter"), Provider::OpenRouter);
        assert_eq!(Provider::parse("somewhere"), Provider::Custom);
    }

    #[test]
    fn test_image_data_url() {
        let content = Content::image("QUJD", "image/jpeg");
        assert_eq!(content.data_url().as_deref(), Some("data:image/jpeg;base64,QUJD"));
        assert!(Content::text("hi").data_url().is_none());
    }

    #[test]
    fn test_request_text_and_images() {
        let model = Model::custom(Provider::Groq, "m", "http://localhost");
        let req = InferenceRequest::new(
            model,
            vec![Content::text("a"), Content::image("x", "image/jpeg"), Content::text("b")],
        );
        assert_eq!(req.text(), "ab");
        assert_eq!(req.image_count(), 1);
    }

    #[test]
    fn test_usage_add_saturates() {
        let mut total = Usage { input: 10, output: u32::MAX - 1 };
        total.add(&Usage { input: 5, output: 7 });
        assert_eq!(total, Usage { input: 15, output: u32::MAX });
    }

    #[test]
    fn test_short_name() {
        let model = Model::custom(Provider::OpenRouter, "meta-llama/llama-3.2-90b-vision", "");
        assert_eq!(model.short_name(), "llama-3.2-90b-vision");
    }
}
