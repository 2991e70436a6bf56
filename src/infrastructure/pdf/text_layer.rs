use lopdf::Document;
use tracing::debug;

use super::TextLayerExtractor;
use crate::domain::error::{AppError, Result};

pub struct LopdfTextExtractor;

impl LopdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextLayerExtractor for LopdfTextExtractor {
    fn extract_text(&self, pdf: &[u8]) -> Result<String> {
        let document = Document::load_mem(pdf)
            .map_err(|e| AppError::ExtractionFailure(format!("Failed to load PDF: {}", e)))?;

        let mut page_texts: Vec<String> = Vec::new();

        // Per page so one undecodable page does not hide the others
        for (page_num, _) in document.get_pages() {
            match document.extract_text(&[page_num]) {
                Ok(page_text) => {
                    let trimmed = page_text.trim();
                    if !trimmed.is_empty() {
                        page_texts.push(trimmed.to_string());
                    }
                }
                Err(err) => {
                    debug!(page = page_num, error = %err, "No text layer on page");
                }
            }
        }

        Ok(page_texts.join("\n"))
    }
}
