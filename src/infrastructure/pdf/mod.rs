pub mod pdftoppm;
pub mod text_layer;

use crate::domain::error::Result;
use async_trait::async_trait;

pub use pdftoppm::PdftoppmRasterizer;
pub use text_layer::LopdfTextExtractor;

/// Reads the embedded text layer of a PDF.
pub trait TextLayerExtractor {
    /// Page texts in page order, joined with `\n`. A PDF without a text layer
    /// yields an empty string, not an error.
    fn extract_text(&self, pdf: &[u8]) -> Result<String>;
}

/// Renders PDF pages to images for OCR.
#[async_trait]
pub trait PageRasterizer {
    /// One encoded image per page, in page order.
    async fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>>;
}
