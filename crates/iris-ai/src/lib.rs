//! iris-ai: inference client for vision-capable language models
//!
//! This crate defines the request/response types exchanged with a remote
//! multimodal model and the `InferenceClient` trait the session layer calls.
//! The bundled provider speaks the OpenAI-compatible Chat Completions API
//! (Groq, OpenAI, OpenRouter).

pub mod error;
pub mod models;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use providers::{InferenceClient, OpenAIProvider};
pub use types::*;
