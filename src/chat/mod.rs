pub mod config;
pub mod gemini;
pub mod relay;

use std::sync::Arc;

pub use config::ChatConfig;
pub use gemini::GeminiBackend;
pub use relay::{ChatMessage, ChatRelay, ChatRole, CompletionBackend, RelayError};

/// Build the relay used by the server from configuration
pub fn relay_from_config(config: &ChatConfig) -> Result<ChatRelay, RelayError> {
    let backend = GeminiBackend::new(config)?;
    Ok(ChatRelay::new(Arc::new(backend), config.system_prompt.clone()))
}
