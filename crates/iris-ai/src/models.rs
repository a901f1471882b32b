//! Model registry: the vision-capable models iris knows how to address.

use crate::{Model, Provider};
use std::collections::HashMap;

/// Id of the model used when nothing else is configured
pub const DEFAULT_MODEL_ID: &str = "llama-3.2-90b-vision-preview";

struct ModelEntry {
    id: &'static str,
    name: &'static str,
    provider: Provider,
    max_tokens: u32,
}

const MODEL_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        id: "llama-3.2-90b-vision-preview",
        name: "Llama 3.2 90B Vision",
        provider: Provider::Groq,
        max_tokens: 8192,
    },
    ModelEntry {
        id: "llama-3.2-11b-vision-preview",
        name: "Llama 3.2 11B Vision",
        provider: Provider::Groq,
        max_tokens: 8192,
    },
    ModelEntry {
        id: "meta-llama/llama-4-scout-17b-16e-instruct",
        name: "Llama 4 Scout",
        provider: Provider::Groq,
        max_tokens: 8192,
    },
    ModelEntry {
        id: "meta-llama/llama-4-maverick-17b-128e-instruct",
        name: "Llama 4 Maverick",
        provider: Provider::Groq,
        max_tokens: 8192,
    },
    ModelEntry {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: Provider::OpenAI,
        max_tokens: 16384,
    },
    ModelEntry {
        id: "gpt-4o-mini",
        name: "GPT-4o mini",
        provider: Provider::OpenAI,
        max_tokens: 16384,
    },
    ModelEntry {
        id: "meta-llama/llama-3.2-90b-vision-instruct",
        name: "Llama 3.2 90B Vision (OpenRouter)",
        provider: Provider::OpenRouter,
        max_tokens: 8192,
    },
];

impl ModelEntry {
    fn to_model(&self) -> Model {
        Model {
            id: self.id.to_string(),
            name: self.name.to_string(),
            provider: self.provider,
            base_url: self.provider.default_base_url().to_string(),
            vision: true,
            max_tokens: self.max_tokens,
            headers: HashMap::new(),
        }
    }
}

/// Look up a model by provider and ID.
pub fn get_model(provider: Provider, id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id && e.provider == provider)
        .map(|e| e.to_model())
}

/// Look up a model by ID only (first match across all providers).
pub fn get_model_by_id(id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.to_model())
}

/// Get all models for a specific provider.
pub fn get_models(provider: Provider) -> Vec<Model> {
    MODEL_ENTRIES
        .iter()
        .filter(|e| e.provider == provider)
        .map(|e| e.to_model())
        .collect()
}

/// The default vision model.
pub fn default_model() -> Model {
    get_model_by_id(DEFAULT_MODEL_ID)
        .unwrap_or_else(|| Model::custom(Provider::Groq, DEFAULT_MODEL_ID, Provider::Groq.default_base_url()))
}

/// Resolve a model id for a provider, falling back to a custom entry.
///
/// `base_url` overrides the provider's default endpoint in both cases.
pub fn resolve(provider: Provider, id: &str, base_url: Option<&str>) -> Model {
    let mut model = get_model(provider, id)
        .or_else(|| get_model_by_id(id).filter(|m| provider == Provider::Custom || m.provider == provider))
        .unwrap_or_else(|| Model::custom(provider, id, provider.default_base_url()));
    // A registry id served from a custom endpoint keeps its limits only
    if model.provider != provider {
        model.provider = provider;
        model.base_url = provider.default_base_url().to_string();
    }
    if let Some(url) = base_url {
        model.base_url = url.trim_end_matches('/').to_string();
    }
    model
}
