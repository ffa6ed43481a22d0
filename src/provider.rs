use crate::error::Error;
use crate::normalize::NormalizedMessage;
use crate::types::GenerationConfig;

/// A fully normalized generation request, ready for a provider to map onto
/// its wire format.
///
/// `turns` holds the user and assistant messages in conversation order;
/// system text has already been pulled out into `system_instruction`.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub turns: Vec<NormalizedMessage>,
    pub system_instruction: Option<String>,
    pub config: GenerationConfig,
}

/// A trait for LLM providers that can answer a normalized request with
/// plain text. Implementations own their wire mapping and error taxonomy;
/// a new backend means one implementation of this trait plus a model-name
/// prefix in the registry.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync + 'static {
    /// Short name used in diagnostics and error payloads.
    fn name(&self) -> &'static str;

    /// Send one generation request and extract the response text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, Error>;
}
