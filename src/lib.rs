//! A thin adapter between chat-style conversation histories and LLM
//! provider APIs.
//!
//! This library normalizes caller-supplied messages into a provider-agnostic
//! representation, maps them onto the wire format of Google Gemini or
//! Anthropic Claude selected by model-name prefix, and dispatches the
//! request with randomized backoff on transient failures.
//!
//! ```no_run
//! use llm_relay::{Dispatcher, Message};
//!
//! # async fn run() -> Result<(), llm_relay::Error> {
//! let dispatcher = Dispatcher::from_env()?;
//! let history = vec![
//!     Message::system("You are a concise assistant."),
//!     Message::user("What is the capital of France?"),
//! ];
//! if let Some(text) = dispatcher.ask("gemini-2.0-flash", &history).await {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod normalize;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod retry;
pub mod types;

// Re-export core types for easy usage
pub use dispatch::{DispatchError, Dispatcher};
pub use error::{Error, ErrorClass};
pub use normalize::{
    extract_system_instruction, normalize_content, normalize_history, ContentPart,
    NormalizedMessage,
};
pub use provider::{GenerateRequest, ProviderAdapter};
pub use providers::*;
pub use registry::ProviderRegistry;
pub use retry::RetryPolicy;
pub use types::*;
