//! Provider implementations for different LLM services.

pub mod anthropic;
pub mod gemini;

// Re-export commonly used provider types
pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
