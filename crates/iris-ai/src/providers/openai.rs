//! OpenAI-compatible Chat Completions provider (Groq, OpenAI, OpenRouter)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::InferenceClient;
use crate::{
    error::{Error, Result},
    types::{Completion, Content, InferenceRequest, Model, StopReason, Usage},
};

/// Chat Completions client
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAIProvider {
    /// Create a new provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(model: &Model) -> Result<String> {
        if model.base_url.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "no base URL configured for model {}",
                model.id
            )));
        }
        Ok(format!("{}/chat/completions", model.base_url.trim_end_matches('/')))
    }
}

#[async_trait]
impl InferenceClient for OpenAIProvider {
    async fn complete(&self, request: &InferenceRequest) -> Result<Completion> {
        let url = Self::endpoint(&request.model)?;
        let body = build_request(request);

        tracing::debug!(
            model = %request.model.id,
            images = request.image_count(),
            "sending chat completion request"
        );

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);

        // Add model-specific headers
        for (key, value) in &request.model.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(Error::RateLimited { retry_after });
        }

        let text = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(error_from_body(status, &text));
        }

        parse_response(&text)
    }
}

/// Build the wire request: a single user message with a text part and image parts.
fn build_request(request: &InferenceRequest) -> ChatRequest {
    let parts = request
        .content
        .iter()
        .map(|c| match c {
            Content::Text { text } => ContentPart::Text { text: text.clone() },
            Content::Image { .. } => ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: c.data_url().unwrap_or_default(),
                },
            },
        })
        .collect();

    ChatRequest {
        model: request.model.id.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: parts,
        }],
        temperature: request.options.temperature,
        max_tokens: request
            .options
            .max_tokens
            .map(|t| t.min(request.model.max_tokens)),
        stream: false,
    }
}

/// Turn a non-2xx body into a typed error
fn error_from_body(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        401 | 403 => Error::Auth(message),
        _ => Error::api(status, message),
    }
}

/// Extract the first choice's text from a 2xx body
fn parse_response(body: &str) -> Result<Completion> {
    let response: ChatResponse = serde_json::from_str(body)?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedResponse("no choices in response".to_string()))?;

    let text = choice
        .message
        .content
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::UnexpectedResponse("empty message content".to_string()))?;

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("stop") => Some(StopReason::Stop),
        Some("length") => Some(StopReason::Length),
        Some("content_filter") => Some(StopReason::ContentFilter),
        _ => None,
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input: u.prompt_tokens,
            output: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(Completion {
        text,
        model: response.model,
        usage,
        stop_reason,
    })
}

// Request types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

// Response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provider;
    use crate::{InferenceOptions, models};

    fn vision_request() -> InferenceRequest {
        InferenceRequest::new(
            models::default_model(),
            vec![Content::text("What do you see?"), Content::image("AAAA", "image/jpeg")],
        )
        .with_options(InferenceOptions {
            temperature: Some(0.7),
            max_tokens: Some(1024),
        })
    }

    #[test]
    fn test_build_request_shape() {
        let json = serde_json::to_value(build_request(&vision_request())).unwrap();

        assert_eq!(json["model"], "llama-3.2-90b-vision-preview");
        assert_eq!(json["stream"], false);
        assert_eq!(json["max_tokens"], 1024);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1, "no system prompt is sent");
        assert_eq!(messages[0]["role"], "user");

        let parts = messages[0]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "What do you see?");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn test_build_request_caps_max_tokens_to_model() {
        let mut req = vision_request();
        req.options.max_tokens = Some(100_000);
        let json = serde_json::to_value(build_request(&req)).unwrap();
        assert_eq!(json["max_tokens"], 8192);
    }

    #[test]
    fn test_build_request_omits_unset_options() {
        let mut req = vision_request();
        req.options = InferenceOptions::default();
        let json = serde_json::to_value(build_request(&req)).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_response_success() {
        let body = r#"{
            "model": "llama-3.2-90b-vision-preview",
            "choices": [{"message": {"role": "assistant", "content": "No signs detected"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 812, "completion_tokens": 14, "total_tokens": 826}
        }"#;
        let completion = parse_response(body).unwrap();
        assert_eq!(completion.text, "No signs detected");
        assert_eq!(completion.stop_reason, Some(StopReason::Stop));
        assert_eq!(completion.usage, Usage { input: 812, output: 14 });
        assert_eq!(completion.model.as_deref(), Some("llama-3.2-90b-vision-preview"));
    }

    #[test]
    fn test_parse_response_no_choices() {
        let err = parse_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[test]
    fn test_parse_response_null_content() {
        let body = r#"{"choices": [{"message": {"content": null}, "finish_reason": "length"}]}"#;
        assert!(matches!(parse_response(body), Err(Error::UnexpectedResponse(_))));
    }

    #[test]
    fn test_parse_response_malformed_json() {
        assert!(matches!(parse_response("<html>"), Err(Error::Json(_))));
    }

    #[test]
    fn test_error_from_structured_body() {
        let body = r#"{"error": {"message": "The model has been decommissioned", "type": "invalid_request_error"}}"#;
        match error_from_body(400, body) {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "The model has been decommissioned");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_from_plain_body() {
        match error_from_body(502, "  Bad Gateway\n") {
            Error::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_auth_status() {
        let body = r#"{"error": {"message": "Invalid API Key"}}"#;
        assert!(matches!(error_from_body(401, body), Error::Auth(m) if m == "Invalid API Key"));
    }

    #[test]
    fn test_endpoint_requires_base_url() {
        let model = Model::custom(Provider::Custom, "llava", "");
        assert!(matches!(
            OpenAIProvider::endpoint(&model),
            Err(Error::InvalidConfig(_))
        ));
        let model = Model::custom(Provider::Custom, "llava", "http://localhost:8080/v1/");
        assert_eq!(
            OpenAIProvider::endpoint(&model).unwrap(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_complete_fails_before_network_without_base_url() {
        let provider = OpenAIProvider::new("gsk-test");
        let request = InferenceRequest::new(
            Model::custom(Provider::Custom, "llava", ""),
            vec![Content::text("hi")],
        );
        assert!(matches!(
            provider.complete(&request).await,
            Err(Error::InvalidConfig(_))
        ));
    }
}
