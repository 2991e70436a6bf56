use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{preprocess, OcrEngine, OcrWorker, SharedOcrWorker};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::OcrConfig;
use crate::infrastructure::storage::TempWorkspace;

/// OCR engine backed by the `tesseract` command line tool.
pub struct TesseractEngine {
    command: String,
    languages: String,
    preprocessing_enabled: bool,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        let languages = if config.languages.trim().is_empty() {
            "eng".to_string()
        } else {
            config.languages.trim().to_string()
        };
        Self {
            command: config.tesseract_cmd.clone(),
            languages,
            preprocessing_enabled: config.preprocessing_enabled,
        }
    }

    fn new_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        if let Ok(tessdata_prefix) = std::env::var("TESSDATA_PREFIX") {
            command.env("TESSDATA_PREFIX", tessdata_prefix);
        }
        command.kill_on_drop(true);
        command
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn start_worker(&self) -> Result<SharedOcrWorker> {
        let probe = self
            .new_command()
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                AppError::ExtractionFailure(format!("OCR engine unavailable ({}): {}", self.command, e))
            })?;
        if !probe.status.success() {
            return Err(AppError::ExtractionFailure(format!(
                "OCR engine unavailable ({}): exit status {}",
                self.command, probe.status
            )));
        }

        let workspace = TempWorkspace::new("reportlens-ocr").map_err(|e| {
            AppError::ExtractionFailure(format!("Failed to create OCR workspace: {}", e))
        })?;
        info!(languages = %self.languages, "Started tesseract worker");

        Ok(Arc::new(TesseractWorker {
            engine: TesseractEngine {
                command: self.command.clone(),
                languages: self.languages.clone(),
                preprocessing_enabled: self.preprocessing_enabled,
            },
            workspace: Mutex::new(Some(workspace)),
        }))
    }
}

/// Owns a scratch directory for page images; terminating removes it.
pub struct TesseractWorker {
    engine: TesseractEngine,
    workspace: Mutex<Option<TempWorkspace>>,
}

impl TesseractWorker {
    fn page_path(&self, page_number: usize) -> Result<std::path::PathBuf> {
        let guard = self
            .workspace
            .lock()
            .map_err(|_| AppError::Internal("OCR workspace lock poisoned".to_string()))?;
        guard
            .as_ref()
            .map(|workspace| workspace.join(&format!("page-{}.png", page_number)))
            .ok_or_else(|| AppError::ExtractionFailure("OCR worker already terminated".to_string()))
    }
}

#[async_trait]
impl OcrWorker for TesseractWorker {
    async fn recognize(&self, page_number: usize, image: Vec<u8>) -> Result<String> {
        let page_path = self.page_path(page_number)?;

        let image = if self.engine.preprocessing_enabled {
            match tokio::task::spawn_blocking({
                let original = image.clone();
                move || preprocess::prepare_page(&original)
            })
            .await
            {
                Ok(Some(prepared)) => {
                    debug!(page = page_number, "Applied OCR preprocessing");
                    prepared
                }
                Ok(None) => image,
                Err(err) => {
                    warn!(page = page_number, error = %err, "OCR preprocessing task failed");
                    image
                }
            }
        } else {
            image
        };

        tokio::fs::write(&page_path, &image).await.map_err(|e| {
            AppError::ExtractionFailure(format!("Failed to stage page {}: {}", page_number, e))
        })?;

        let output = self
            .engine
            .new_command()
            .arg(&page_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.engine.languages)
            .output()
            .await
            .map_err(|e| {
                AppError::ExtractionFailure(format!("Tesseract failed to start: {}", e))
            })?;

        let _ = tokio::fs::remove_file(&page_path).await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ExtractionFailure(format!(
                "Tesseract failed on page {}: {}",
                page_number,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn terminate(&self) {
        if let Ok(mut guard) = self.workspace.lock() {
            if guard.take().is_some() {
                debug!("Terminated tesseract worker");
            }
        }
    }
}
