pub mod types;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use std::time::Duration;

use self::types::*;
use crate::error::Error;
use crate::normalize::ContentPart;
use crate::provider::{GenerateRequest, ProviderAdapter};
use crate::types::Role;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider via the Messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: String) -> Result<Self, Error> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a new Anthropic provider with custom base URL (for testing).
    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        let mut provider = Self::new(api_key)?;
        provider.base_url = base_url;
        Ok(provider)
    }

    /// Create a provider using the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| Error::config("ANTHROPIC_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Convert a normalized request to the Messages API wire format.
    fn convert_request(&self, request: &GenerateRequest) -> Result<AnthropicRequest, Error> {
        let mut messages = Vec::with_capacity(request.turns.len());
        for turn in &request.turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                // System text travels in the top-level system field.
                Role::System => continue,
            };
            messages.push(AnthropicMessage {
                role: role.to_string(),
                content: turn
                    .parts
                    .iter()
                    .map(convert_part)
                    .collect::<Result<Vec<_>, _>>()?,
            });
        }

        Ok(AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.config.max_output_tokens,
            system: request.system_instruction.clone(),
            messages,
        })
    }

    fn get_endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    /// Concatenate the text blocks of the response content.
    fn extract_text(&self, response: AnthropicResponse) -> Result<String, Error> {
        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                _ => None,
            })
            .collect();

        if text.is_empty() {
            Err(Error::empty_response(self.name()))
        } else {
            Ok(text)
        }
    }
}

fn convert_part(part: &ContentPart) -> Result<AnthropicContentBlock, Error> {
    match part {
        ContentPart::Text { text } => Ok(AnthropicContentBlock::Text { text: text.clone() }),
        ContentPart::Image { media_type, data } => {
            // Reject corrupt payloads before they reach the wire.
            let bytes = BASE64.decode(data.trim()).map_err(|err| {
                Error::invalid_content(format!("invalid base64 image payload: {err}"))
            })?;
            Ok(AnthropicContentBlock::Image {
                source: AnthropicImageSource::Base64 {
                    media_type: media_type.clone(),
                    data: BASE64.encode(bytes),
                },
            })
        }
        ContentPart::ImageRef { uri, .. } => Ok(AnthropicContentBlock::Image {
            source: AnthropicImageSource::Url { url: uri.clone() },
        }),
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, Error> {
        let anthropic_request = self.convert_request(request)?;
        let endpoint = self.get_endpoint();

        let response = self
            .client
            .post(&endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorResponse>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(Error::from_status(self.name(), status.as_u16(), message));
        }

        let anthropic_response: AnthropicResponse = response.json().await?;
        self.extract_text(anthropic_response)
    }
}
