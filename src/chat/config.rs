use std::{collections::HashMap, time::Duration};

use serde::Deserialize;

pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_CHAT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the outbound chat-completion API.
///
/// Everything except the API key may come from the config file; the key is
/// only ever read from the environment.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub system_prompt: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            system_prompt: None,
            api_key: None,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(&std::env::vars().collect());
        config
    }

    /// Overlay values from an environment snapshot. Empty values are ignored.
    pub fn apply_env(&mut self, values: &HashMap<String, String>) {
        fn read<'a>(values: &'a HashMap<String, String>, key: &str) -> Option<&'a String> {
            values.get(key).filter(|value| !value.trim().is_empty())
        }

        if let Some(model) = read(values, "LECTERN_CHAT_MODEL") {
            self.model = model.clone();
        }
        if let Some(base_url) = read(values, "LECTERN_CHAT_BASE_URL") {
            self.base_url = base_url.clone();
        }
        if let Some(timeout) = read(values, "LECTERN_CHAT_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid LECTERN_CHAT_TIMEOUT_SECS={}", timeout),
            }
        }
        if let Some(prompt) = read(values, "LECTERN_CHAT_SYSTEM_PROMPT") {
            self.system_prompt = Some(prompt.clone());
        }

        self.api_key = read(values, "GOOGLE_API_KEY")
            .or_else(|| read(values, "GEMINI_API_KEY"))
            .cloned()
            .or_else(|| self.api_key.take());
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_environment() {
        let mut config = ChatConfig::default();
        config.apply_env(&HashMap::new());

        assert_eq!(config.model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.base_url, DEFAULT_CHAT_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn environment_overrides_and_key_fallback() {
        let mut config = ChatConfig::default();
        config.apply_env(&env(&[
            ("LECTERN_CHAT_MODEL", "gemini-pro"),
            ("LECTERN_CHAT_TIMEOUT_SECS", "5"),
            ("GOOGLE_API_KEY", ""),
            ("GEMINI_API_KEY", "secret"),
        ]));

        assert_eq!(config.model, "gemini-pro");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn invalid_timeout_keeps_previous_value() {
        let mut config = ChatConfig::default();
        config.apply_env(&env(&[("LECTERN_CHAT_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout_secs, 60);
    }
}
