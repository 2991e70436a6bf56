use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::PageRasterizer;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::storage::TempWorkspace;

/// Rasterizes pages by shelling out to poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    command: String,
}

impl PdftoppmRasterizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>> {
        let workspace = TempWorkspace::new("reportlens-raster").map_err(|e| {
            AppError::ExtractionFailure(format!("Failed to create raster workspace: {}", e))
        })?;

        let input_path = workspace.join("input.pdf");
        tokio::fs::write(&input_path, pdf).await.map_err(|e| {
            AppError::ExtractionFailure(format!("Failed to stage PDF for rasterization: {}", e))
        })?;

        info!(command = %self.command, dpi, "Rasterizing PDF pages");

        let output_prefix = workspace.join("page");
        let output = Command::new(&self.command)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(&input_path)
            .arg(&output_prefix)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AppError::ExtractionFailure(format!("{} not available: {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ExtractionFailure(format!(
                "{} failed: {}",
                self.command,
                stderr.trim()
            )));
        }

        let images = workspace.files_with_extension("png").map_err(|e| {
            AppError::ExtractionFailure(format!("Failed to read rendered pages: {}", e))
        })?;
        if images.is_empty() {
            return Err(AppError::ExtractionFailure(format!(
                "{} produced no page images",
                self.command
            )));
        }

        let mut pages = Vec::with_capacity(images.len());
        for image_path in &images {
            let bytes = tokio::fs::read(image_path).await.map_err(|e| {
                AppError::ExtractionFailure(format!(
                    "Failed to read {}: {}",
                    image_path.display(),
                    e
                ))
            })?;
            pages.push(bytes);
        }

        debug!(pages = pages.len(), "Rasterization finished");
        Ok(pages)
    }
}
