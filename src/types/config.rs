use serde::{Deserialize, Serialize};

/// Output cap applied when the caller does not override it.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Generation parameters forwarded to the provider with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}
