use super::{ImagePart, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAIClient {
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn api_key(config: &LLMConfig) -> Result<String> {
        config
            .api_key
            .clone()
            .ok_or_else(|| AppError::LLMError("Missing API key for OpenAI provider".to_string()))
    }

    fn completions_url(config: &LLMConfig) -> String {
        if config.base_url.ends_with('/') {
            format!("{}chat/completions", config.base_url)
        } else {
            format!("{}/chat/completions", config.base_url)
        }
    }

    pub(crate) fn build_body(config: &LLMConfig, system: &str, user_content: Value) -> Value {
        json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": system
                },
                {
                    "role": "user",
                    "content": user_content
                }
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        })
    }

    pub(crate) fn image_content(user: &str, image: &ImagePart) -> Value {
        json!([
            {
                "type": "text",
                "text": user
            },
            {
                "type": "image_url",
                "image_url": {
                    "url": image.data_url()
                }
            }
        ])
    }

    async fn complete(&self, config: &LLMConfig, body: &Value) -> Result<String> {
        let api_key = Self::api_key(config)?;
        let url = Self::completions_url(config);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let body = Self::build_body(config, system, Value::String(user.to_string()));
        self.complete(config, &body).await
    }

    async fn generate_with_image(
        &self,
        config: &LLMConfig,
        system: &str,
        user: &str,
        image: &ImagePart,
    ) -> Result<String> {
        let body = Self::build_body(config, system, Self::image_content(user, image));
        self.complete(config, &body).await
    }
}
