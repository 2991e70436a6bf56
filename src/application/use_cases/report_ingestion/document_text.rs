use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::OcrConfig;
use crate::infrastructure::ocr::{OcrEngine, OcrWorkerScope};
use crate::infrastructure::pdf::{PageRasterizer, TextLayerExtractor};

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub min_text_chars: usize,
    pub render_dpi: u32,
    pub max_concurrent_pages: usize,
    pub page_timeout: Duration,
    pub render_timeout: Duration,
}

impl ResolverSettings {
    pub fn from_config(ocr: &OcrConfig, min_text_chars: usize) -> Self {
        Self {
            min_text_chars,
            render_dpi: ocr.render_dpi(),
            max_concurrent_pages: ocr.max_concurrent_pages.max(1),
            page_timeout: Duration::from_secs(ocr.page_timeout_secs),
            render_timeout: Duration::from_secs(ocr.render_timeout_secs),
        }
    }
}

/// Turns a PDF into one text blob: the embedded text layer when it has enough
/// content, otherwise OCR over rasterized pages.
pub struct DocumentTextResolver {
    text_layer: Arc<dyn TextLayerExtractor + Send + Sync>,
    rasterizer: Arc<dyn PageRasterizer + Send + Sync>,
    ocr_engine: Arc<dyn OcrEngine + Send + Sync>,
    settings: ResolverSettings,
}

impl DocumentTextResolver {
    pub fn new(
        text_layer: Arc<dyn TextLayerExtractor + Send + Sync>,
        rasterizer: Arc<dyn PageRasterizer + Send + Sync>,
        ocr_engine: Arc<dyn OcrEngine + Send + Sync>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            text_layer,
            rasterizer,
            ocr_engine,
            settings,
        }
    }

    pub async fn resolve(&self, pdf: &[u8]) -> Result<String> {
        let text = match self.text_layer.extract_text(pdf) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "Text layer unreadable, treating PDF as scanned");
                String::new()
            }
        };

        let chars = text.trim().chars().count();
        if chars > self.settings.min_text_chars {
            info!(chars, "Using embedded text layer");
            return Ok(text);
        }

        info!(
            chars,
            threshold = self.settings.min_text_chars,
            "Text layer too short, running OCR"
        );
        self.ocr_pdf(pdf).await
    }

    async fn ocr_pdf(&self, pdf: &[u8]) -> Result<String> {
        let pages = timeout(
            self.settings.render_timeout,
            self.rasterizer.rasterize(pdf, self.settings.render_dpi),
        )
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "rasterization exceeded {}s",
                self.settings.render_timeout.as_secs()
            ))
        })??;

        info!(pages = pages.len(), "Processing page images with OCR");

        let scope = OcrWorkerScope::acquire(self.ocr_engine.as_ref()).await?;
        let texts = self.recognize_pages(&scope, pages).await?;

        Ok(texts.join("\n"))
    }

    /// Page OCR runs concurrently up to `max_concurrent_pages`; output keeps
    /// page order. The first failing page fails the document.
    async fn recognize_pages(
        &self,
        scope: &OcrWorkerScope,
        pages: Vec<Vec<u8>>,
    ) -> Result<Vec<String>> {
        let page_count = pages.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_pages));
        let mut tasks = JoinSet::new();

        for (index, image) in pages.into_iter().enumerate() {
            let worker = scope.worker();
            let semaphore = semaphore.clone();
            let page_timeout = self.settings.page_timeout;

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| AppError::Internal("OCR page queue closed".to_string()))?;
                let page_number = index + 1;
                debug!(page = page_number, "OCR processing page");

                let text = timeout(page_timeout, worker.recognize(page_number, image))
                    .await
                    .map_err(|_| {
                        AppError::Timeout(format!(
                            "OCR of page {} exceeded {}s",
                            page_number,
                            page_timeout.as_secs()
                        ))
                    })??;
                Ok::<_, AppError>((index, text))
            });
        }

        let mut texts = vec![String::new(); page_count];
        while let Some(joined) = tasks.join_next().await {
            let (index, text) = joined
                .map_err(|e| AppError::ExtractionFailure(format!("OCR task failed: {}", e)))??;
            texts[index] = text;
        }

        info!(pages = page_count, "OCR extracted text from all pages");
        Ok(texts)
    }
}
