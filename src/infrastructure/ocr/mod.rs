pub mod preprocess;
pub mod tesseract;

use crate::domain::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use tesseract::TesseractEngine;

pub type SharedOcrWorker = Arc<dyn OcrWorker + Send + Sync>;

/// Hands out recognition workers. One worker serves one document.
#[async_trait]
pub trait OcrEngine {
    async fn start_worker(&self) -> Result<SharedOcrWorker>;
}

/// A started recognition worker. `recognize` may be called concurrently.
#[async_trait]
pub trait OcrWorker {
    async fn recognize(&self, page_number: usize, image: Vec<u8>) -> Result<String>;

    /// Releases the worker. Called exactly once, by [`OcrWorkerScope`].
    fn terminate(&self);
}

/// Holds a worker for the duration of one document and terminates it when
/// dropped, whichever way the document processing ends.
pub struct OcrWorkerScope {
    worker: SharedOcrWorker,
}

impl OcrWorkerScope {
    pub async fn acquire(engine: &(dyn OcrEngine + Send + Sync)) -> Result<Self> {
        let worker = engine.start_worker().await?;
        Ok(Self { worker })
    }

    pub fn worker(&self) -> SharedOcrWorker {
        self.worker.clone()
    }
}

impl Drop for OcrWorkerScope {
    fn drop(&mut self) {
        self.worker.terminate();
    }
}
