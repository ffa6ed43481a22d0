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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider via the Generative Language API.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    pub fn new(api_key: String) -> Result<Self, Error> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a new Gemini provider with custom base URL (for testing).
    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        let mut provider = Self::new(api_key)?;
        provider.base_url = base_url;
        Ok(provider)
    }

    /// Create a provider using the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::config("GEMINI_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Convert a normalized request to the Gemini wire format.
    fn convert_request(&self, request: &GenerateRequest) -> Result<GeminiRequest, Error> {
        let mut contents = Vec::with_capacity(request.turns.len());
        for turn in &request.turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "model",
                // System text travels in systemInstruction, never in contents.
                Role::System => continue,
            };
            contents.push(GeminiContent {
                role: Some(role.to_string()),
                parts: convert_parts(&turn.parts)?,
            });
        }

        let system_instruction = request
            .system_instruction
            .as_ref()
            .map(|text| GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::Text { text: text.clone() }],
            });

        Ok(GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.config.max_output_tokens,
            },
        })
    }

    /// Get the API endpoint for a Gemini model.
    fn get_endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(&self, response: GeminiResponse) -> Result<String, Error> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| match part {
                        GeminiPart::Text { text } => Some(text),
                        _ => None,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            Err(Error::empty_response(self.name()))
        } else {
            Ok(text)
        }
    }
}

fn convert_parts(parts: &[ContentPart]) -> Result<Vec<GeminiPart>, Error> {
    parts.iter().map(convert_part).collect()
}

fn convert_part(part: &ContentPart) -> Result<GeminiPart, Error> {
    match part {
        ContentPart::Text { text } => Ok(GeminiPart::Text { text: text.clone() }),
        ContentPart::Image { media_type, data } => {
            // Decode to catch corrupt payloads here instead of as an opaque
            // 400 from the API; the wire carries the canonical re-encoding.
            let bytes = BASE64
                .decode(data.trim())
                .map_err(|e| Error::invalid_content(format!("invalid base64 image data: {e}")))?;
            Ok(GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: media_type.clone(),
                    data: BASE64.encode(bytes),
                },
            })
        }
        ContentPart::ImageRef { uri, mime_type } => Ok(GeminiPart::FileData {
            file_data: GeminiFileData {
                mime_type: mime_type.clone(),
                file_uri: uri.clone(),
            },
        }),
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, Error> {
        let gemini_request = self.convert_request(request)?;
        let endpoint = self.get_endpoint(&request.model);

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Keep the status-derived classification even when the error
            // body cannot be read or parsed.
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(Error::from_status(self.name(), status.as_u16(), message));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        self.extract_text(gemini_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedMessage;
    use crate::types::GenerationConfig;
    use serde_json::json;

    fn provider() -> GeminiProvider {
        GeminiProvider::new("test-key".to_string()).unwrap()
    }

    fn request_with_turns(turns: Vec<NormalizedMessage>) -> GenerateRequest {
        GenerateRequest {
            model: "gemini-2.0-flash".to_string(),
            turns,
            system_instruction: None,
            config: GenerationConfig::default(),
        }
    }

    #[test]
    fn test_roles_map_to_user_and_model() {
        let request = request_with_turns(vec![
            NormalizedMessage {
                role: Role::User,
                parts: vec![ContentPart::Text {
                    text: "hi".to_string(),
                }],
            },
            NormalizedMessage {
                role: Role::Assistant,
                parts: vec![ContentPart::Text {
                    text: "hello".to_string(),
                }],
            },
        ]);
        let wire = provider().convert_request(&request).unwrap();
        assert_eq!(wire.contents[0].role.as_deref(), Some("user"));
        assert_eq!(wire.contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_system_instruction_omitted_when_absent() {
        let request = request_with_turns(vec![NormalizedMessage {
            role: Role::User,
            parts: vec![ContentPart::Text {
                text: "hi".to_string(),
            }],
        }]);
        let wire = provider().convert_request(&request).unwrap();
        let body = serde_json::to_value(&wire).unwrap();
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], json!(4096));
    }

    #[test]
    fn test_system_instruction_rides_as_user_content() {
        let mut request = request_with_turns(vec![]);
        request.system_instruction = Some("be terse".to_string());
        let wire = provider().convert_request(&request).unwrap();
        let body = serde_json::to_value(&wire).unwrap();
        assert_eq!(body["systemInstruction"]["role"], json!("user"));
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            json!("be terse")
        );
    }

    #[test]
    fn test_inline_image_is_validated_and_re_encoded() {
        let request = request_with_turns(vec![NormalizedMessage {
            role: Role::User,
            parts: vec![ContentPart::Image {
                media_type: "image/png".to_string(),
                data: "aGVsbG8=".to_string(),
            }],
        }]);
        let wire = provider().convert_request(&request).unwrap();
        let body = serde_json::to_value(&wire).unwrap();
        assert_eq!(
            body["contents"][0]["parts"][0]["inlineData"],
            json!({"mimeType": "image/png", "data": "aGVsbG8="})
        );
    }

    #[test]
    fn test_corrupt_base64_is_rejected() {
        let request = request_with_turns(vec![NormalizedMessage {
            role: Role::User,
            parts: vec![ContentPart::Image {
                media_type: "image/png".to_string(),
                data: "@@not-base64@@".to_string(),
            }],
        }]);
        let err = provider().convert_request(&request).unwrap_err();
        assert!(matches!(err, Error::InvalidContent(_)));
    }

    #[test]
    fn test_image_reference_becomes_file_data() {
        let request = request_with_turns(vec![NormalizedMessage {
            role: Role::User,
            parts: vec![ContentPart::ImageRef {
                uri: "https://example.com/cat.png".to_string(),
                mime_type: None,
            }],
        }]);
        let wire = provider().convert_request(&request).unwrap();
        let body = serde_json::to_value(&wire).unwrap();
        assert_eq!(
            body["contents"][0]["parts"][0]["fileData"]["fileUri"],
            json!("https://example.com/cat.png")
        );
    }

    #[test]
    fn test_response_text_concatenates_first_candidate_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " world"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(provider().extract_text(response).unwrap(), "Hello world");
    }

    #[test]
    fn test_blocked_candidate_without_content_is_an_empty_response() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        let err = provider().extract_text(response).unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
    }

    #[test]
    fn test_empty_candidate_list_is_an_empty_response() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        let err = provider().extract_text(response).unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
    }
}
