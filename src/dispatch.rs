//! Request assembly, provider routing, and the retry loop.

use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::error::{Error, ErrorClass};
use crate::normalize::{extract_system_instruction, normalize_history};
use crate::provider::GenerateRequest;
use crate::registry::ProviderRegistry;
use crate::retry::RetryPolicy;
use crate::types::{GenerationConfig, Message, Role};

/// Why a dispatch failed, for callers that need more than `None`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unrecognized model name: {0}")]
    UnsupportedModel(String),

    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: Error },

    #[error(transparent)]
    Fatal(Error),
}

/// Normalizes a conversation history, routes it to a provider by model-name
/// prefix, and retries transient failures with randomized backoff.
///
/// The request is normalized and mapped once; only the send is repeated.
pub struct Dispatcher {
    registry: ProviderRegistry,
    retry: RetryPolicy,
    config: GenerationConfig,
}

impl Dispatcher {
    /// Create a dispatcher with default retry and generation settings.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            retry: RetryPolicy::default(),
            config: GenerationConfig::default(),
        }
    }

    /// Create a dispatcher over providers configured from the environment.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::new(ProviderRegistry::from_env()?))
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the generation parameters.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Ask `model` to continue `history`, returning the response text or
    /// `None` on any failure. Failure detail goes to the log stream only;
    /// use [`try_ask`](Self::try_ask) to get it back as a value.
    pub async fn ask(&self, model: &str, history: &[Message]) -> Option<String> {
        self.try_ask(model, history).await.ok()
    }

    /// Like [`ask`](Self::ask) but reporting why the call failed.
    pub async fn try_ask(
        &self,
        model: &str,
        history: &[Message],
    ) -> Result<String, DispatchError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("ask", model = %model, request_id = %request_id);
        self.dispatch(model, history).instrument(span).await
    }

    async fn dispatch(&self, model: &str, history: &[Message]) -> Result<String, DispatchError> {
        let Some(provider) = self.registry.resolve(model) else {
            warn!("Unrecognized model name: {}", model);
            return Err(DispatchError::UnsupportedModel(model.to_string()));
        };

        let request = match self.build_request(model, history) {
            Ok(request) => request,
            Err(err) => {
                error!(detail = ?err, "Unexpected error: {}", err);
                return Err(DispatchError::Fatal(err));
            }
        };

        let max_attempts = self.retry.max_attempts;
        let mut attempt = 0;
        loop {
            match provider.generate(&request).await {
                Ok(text) => {
                    if attempt > 0 {
                        info!("{} recovered after {} failed attempts", provider.name(), attempt);
                    }
                    return Ok(text);
                }
                Err(err) => match err.class() {
                    ErrorClass::Transient => {
                        attempt += 1;
                        warn!("API error: {}", err);
                        if attempt >= max_attempts {
                            error!("Giving up after {} attempts", attempt);
                            return Err(DispatchError::Exhausted {
                                attempts: attempt,
                                source: err,
                            });
                        }
                        let delay = self.retry.delay();
                        warn!(
                            "Attempt {}/{}. Waiting {:.1} seconds...",
                            attempt,
                            max_attempts,
                            delay.as_secs_f64()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    ErrorClass::Unsupported => {
                        warn!("Unrecognized model name: {}", model);
                        return Err(DispatchError::UnsupportedModel(model.to_string()));
                    }
                    ErrorClass::Fatal => {
                        error!(detail = ?err, "Unexpected error: {}", err);
                        return Err(DispatchError::Fatal(err));
                    }
                },
            }
        }
    }

    /// Normalize the history and assemble the provider-agnostic request.
    fn build_request(&self, model: &str, history: &[Message]) -> Result<GenerateRequest, Error> {
        let normalized = normalize_history(history)?;
        let system_instruction = extract_system_instruction(&normalized);
        let turns = normalized
            .into_iter()
            .filter(|msg| msg.role != Role::System)
            .collect();
        Ok(GenerateRequest {
            model: model.to_string(),
            turns,
            system_instruction,
            config: self.config.clone(),
        })
    }
}
