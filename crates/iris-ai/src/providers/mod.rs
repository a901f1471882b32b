//! Inference provider implementations

pub mod openai;

use crate::{Completion, Error, InferenceRequest, Provider, Result};
use async_trait::async_trait;

pub use openai::OpenAIProvider;

/// A remote model that answers one multimodal request with one complete response.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send the request and wait for the full (non-streamed) response
    async fn complete(&self, request: &InferenceRequest) -> Result<Completion>;
}

/// Get an API key from a provided value or the provider's environment variable
pub fn get_api_key(provided: Option<&str>, provider: Provider) -> Result<String> {
    if let Some(key) = provided.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }

    let env_var = provider.api_key_env_var().ok_or(Error::InvalidApiKey)?;
    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or(Error::InvalidApiKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provided_key_wins() {
        let key = get_api_key(Some("gsk-test"), Provider::Groq).unwrap();
        assert_eq!(key, "gsk-test");
    }

    #[test]
    fn test_custom_provider_needs_explicit_key() {
        assert!(matches!(
            get_api_key(None, Provider::Custom),
            Err(Error::InvalidApiKey)
        ));
        assert!(matches!(
            get_api_key(Some("  "), Provider::Custom),
            Err(Error::InvalidApiKey)
        ));
    }
}
