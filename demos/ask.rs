//! Minimal example showing the simplest usage of the library.
//!
//! Run with `cargo run --example ask -- gemini-2.0-flash` (or any model
//! name whose prefix is registered for your credentials).

use llm_relay::{Dispatcher, Message};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load API keys from environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let model = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "gemini-2.0-flash".to_string());

    // Registers providers for every credential found in the environment
    let dispatcher = Dispatcher::from_env()?;

    let history = vec![
        Message::system("You are a concise assistant."),
        Message::user("What is the capital of France?"),
    ];

    match dispatcher.ask(&model, &history).await {
        Some(text) => println!("AI: {}", text),
        None => println!("No response; see the log output for the reason."),
    }

    Ok(())
}
