//! The conversation session: owns the transcript and mediates inference calls.

use std::sync::Arc;
use std::time::Duration;

use iris_ai::{
    Completion, Content, InferenceClient, InferenceOptions, InferenceRequest, Model, Usage,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    conversation::{ConversationState, SessionPhase, Turn},
    error::{Error, Result},
    events::SessionEvent,
    handle::SessionHandle,
    normalizer::{EncodedPayload, ImageNormalizer, NormalizeOptions, SourceImage},
    prompt::build_prompt,
};

/// Sampling temperature sent with every request
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Output token cap sent with every request
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// How long to wait for the inference service
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefix of the assistant text recorded when inference fails
pub const INFERENCE_ERROR_PREFIX: &str = "Error processing image and query";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Vision model to query
    pub model: Model,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Upper bound on one inference call
    pub timeout: Duration,
    /// Image normalization limits
    pub normalize: NormalizeOptions,
}

impl SessionConfig {
    /// Defaults for a model: temperature 0.7, 1024 tokens, 60 s timeout
    pub fn new(model: Model) -> Self {
        Self {
            model,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            normalize: NormalizeOptions::default(),
        }
    }
}

/// One user, one transcript, one request in flight.
///
/// `submit_query` borrows the session mutably, so a host cannot issue a second
/// query on the same session before the first resolves.
pub struct ConversationSession {
    config: SessionConfig,
    state: ConversationState,
    client: Arc<dyn InferenceClient>,
    normalizer: ImageNormalizer,
    event_tx: broadcast::Sender<SessionEvent>,
    handle: SessionHandle,
    total_usage: Usage,
}

impl ConversationSession {
    /// Create an empty session
    pub fn new(config: SessionConfig, client: Arc<dyn InferenceClient>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            normalizer: ImageNormalizer::new(config.normalize),
            config,
            state: ConversationState::new(),
            client,
            event_tx,
            handle: SessionHandle::new(),
            total_usage: Usage::default(),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get a handle for abort/busy checks from other tasks
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Switch the model used for subsequent queries
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model;
    }

    pub fn turns(&self) -> &[Turn] {
        self.state.turns()
    }

    pub fn current_image(&self) -> Option<&SourceImage> {
        self.state.current_image()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Token usage summed over the session
    pub fn total_usage(&self) -> &Usage {
        &self.total_usage
    }

    /// Store a new current image. Existing turns are kept.
    pub fn set_image(&mut self, image: SourceImage) {
        tracing::info!(name = image.name(), bytes = image.len(), "image set");
        let event = SessionEvent::ImageSet {
            name: image.name().to_string(),
            bytes: image.len(),
        };
        self.state.set_image(image);
        self.emit(event);
    }

    /// Reset to an empty session: no turns, no image.
    pub fn clear(&mut self) {
        self.state.clear();
        self.total_usage = Usage::default();
        tracing::info!("session cleared");
        self.emit(SessionEvent::Cleared);
    }

    /// Ask a question about the current image.
    ///
    /// Fails with `NoImage`, `EmptyQuery` or an image error before anything is
    /// appended. Once the request is sent, exactly two turns are appended: the
    /// user turn, then either the answer or an error turn describing why the
    /// inference call failed. Inference failures are not returned as `Err`.
    pub async fn submit_query(&mut self, query: &str) -> Result<()> {
        let image = self.state.current_image().cloned().ok_or(Error::NoImage)?;
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        let payload = self.normalizer.normalize(&image)?;
        let request = self.build_request(query, &payload);

        self.emit(SessionEvent::QueryStart);
        self.push_turn(Turn::user(query, image));

        let (cancel, _busy) = self.handle.begin();
        let outcome = run_inference(
            self.client.as_ref(),
            &request,
            self.config.timeout,
            cancel,
        )
        .await;

        let (turn, usage) = match outcome {
            Ok(completion) => {
                tracing::debug!(
                    input = completion.usage.input,
                    output = completion.usage.output,
                    "inference complete"
                );
                self.total_usage.add(&completion.usage);
                (Turn::assistant(completion.text), completion.usage)
            }
            Err(e) => {
                tracing::warn!(error = %e, transport = e.is_transport(), "inference failed");
                (
                    Turn::assistant_error(format!("{}: {}", INFERENCE_ERROR_PREFIX, e)),
                    Usage::default(),
                )
            }
        };

        let is_error = turn.is_error();
        self.push_turn(turn);
        self.emit(SessionEvent::QueryEnd { usage, is_error });
        Ok(())
    }

    fn build_request(&self, query: &str, payload: &EncodedPayload) -> InferenceRequest {
        InferenceRequest::new(
            self.config.model.clone(),
            vec![Content::text(build_prompt(query)), payload.to_content()],
        )
        .with_options(InferenceOptions {
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        })
    }

    fn push_turn(&mut self, turn: Turn) {
        self.state.push(turn.clone());
        self.emit(SessionEvent::TurnAppended { turn });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

/// One bounded, abortable call to the inference service
async fn run_inference(
    client: &dyn InferenceClient,
    request: &InferenceRequest,
    timeout: Duration,
    cancel: CancellationToken,
) -> iris_ai::Result<Completion> {
    tokio::select! {
        _ = cancel.cancelled() => Err(iris_ai::Error::Aborted),
        result = tokio::time::timeout(timeout, client.complete(request)) => {
            result.unwrap_or(Err(iris_ai::Error::Timeout(timeout)))
        }
    }
}
