//! Model-name based routing to provider adapters.

use std::sync::Arc;

use crate::error::Error;
use crate::provider::ProviderAdapter;
use crate::providers::{AnthropicProvider, GeminiProvider};

/// Maps model-name prefixes to provider adapters.
///
/// Resolution scans registrations in insertion order and returns the first
/// prefix match, so register more specific prefixes first.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    routes: Vec<(String, Arc<dyn ProviderAdapter>)>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every model whose name starts with `prefix` to `provider`.
    pub fn register(
        mut self,
        prefix: impl Into<String>,
        provider: Arc<dyn ProviderAdapter>,
    ) -> Self {
        self.routes.push((prefix.into(), provider));
        self
    }

    /// Find the provider responsible for a model name.
    pub fn resolve(&self, model: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.routes
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix.as_str()))
            .map(|(_, provider)| Arc::clone(provider))
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build a registry from environment credentials. `GEMINI_API_KEY`
    /// registers the `gemini` prefix and `ANTHROPIC_API_KEY` the `claude`
    /// prefix; at least one must be set.
    pub fn from_env() -> Result<Self, Error> {
        let mut registry = Self::new();
        if std::env::var("GEMINI_API_KEY").is_ok() {
            registry = registry.register("gemini", Arc::new(GeminiProvider::from_env()?));
        }
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            registry = registry.register("claude", Arc::new(AnthropicProvider::from_env()?));
        }
        if registry.is_empty() {
            return Err(Error::config(
                "No valid API credentials found in environment. Set GEMINI_API_KEY and/or ANTHROPIC_API_KEY",
            ));
        }
        Ok(registry)
    }
}
