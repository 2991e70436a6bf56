use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::time::timeout;
use tracing::info;

use super::prompts::{
    build_image_system_prompt, build_image_user_prompt, build_text_system_prompt,
    build_text_user_prompt,
};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::{ImagePart, LLMClient};

pub enum ExtractionInput<'a> {
    Image { bytes: &'a [u8], mime_type: &'a str },
    Text(&'a str),
}

/// Sends a report card to the completion service and hands back whatever it
/// answered. Validation of that answer happens in `llm_output`.
pub struct StructuredExtractionClient {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    call_timeout: Duration,
}

impl StructuredExtractionClient {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: LLMConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm_client,
            config,
            call_timeout,
        }
    }

    pub async fn extract(&self, input: ExtractionInput<'_>) -> Result<String> {
        let call = async {
            match input {
                ExtractionInput::Image { bytes, mime_type } => {
                    info!(
                        bytes = bytes.len(),
                        mime_type,
                        model = %self.config.model,
                        "Requesting structured extraction from image"
                    );
                    let image = ImagePart {
                        mime_type: mime_type.to_string(),
                        data_base64: STANDARD.encode(bytes),
                    };
                    self.llm_client
                        .generate_with_image(
                            &self.config,
                            &build_image_system_prompt(),
                            &build_image_user_prompt(),
                            &image,
                        )
                        .await
                }
                ExtractionInput::Text(text) => {
                    info!(
                        chars = text.chars().count(),
                        model = %self.config.model,
                        "Requesting structured extraction from text"
                    );
                    self.llm_client
                        .generate(
                            &self.config,
                            &build_text_system_prompt(),
                            &build_text_user_prompt(text),
                        )
                        .await
                }
            }
        };

        timeout(self.call_timeout, call).await.map_err(|_| {
            AppError::Timeout(format!(
                "structured extraction exceeded {}s",
                self.call_timeout.as_secs()
            ))
        })?
    }
}
