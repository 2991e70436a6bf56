use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    OpenAI,
    Google,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LLMConfig {
    /// Settings used for report card extraction: vision-capable model, near
    /// deterministic decoding.
    pub fn extraction_default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: Some(2000),
            temperature: Some(0.1),
            ..Self::default()
        }
    }

    pub fn analysis_default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(1000),
            temperature: Some(0.2),
            ..Self::default()
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            max_tokens: Some(1024),
            temperature: Some(0.7),
        }
    }
}
