use crate::domain::error::Result;
use crate::domain::report::{
    DocumentKind, ProcessedReport, SubjectPerformanceRecord, UploadedDocument,
};

use tracing::{info, instrument};

mod analysis;
mod document_text;
mod extraction;
mod persistence;
mod prompts;

pub use analysis::{contract_violations, WeaknessAnalysis, WeaknessAnalyzer};
pub use document_text::{DocumentTextResolver, ResolverSettings};
pub use extraction::{ExtractionInput, StructuredExtractionClient};
pub use persistence::{build_rows, PerformanceWriter};

use super::llm_output::normalize_report;

/// Report card upload pipeline: type dispatch, text resolution, structured
/// extraction, normalization, weakness analysis, persistence. Stages run one
/// after the other and the first failure ends the upload.
pub struct ReportIngestionUseCase {
    resolver: DocumentTextResolver,
    extractor: StructuredExtractionClient,
    analyzer: WeaknessAnalyzer,
    writer: PerformanceWriter,
}

impl ReportIngestionUseCase {
    pub fn new(
        resolver: DocumentTextResolver,
        extractor: StructuredExtractionClient,
        analyzer: WeaknessAnalyzer,
        writer: PerformanceWriter,
    ) -> Self {
        Self {
            resolver,
            extractor,
            analyzer,
            writer,
        }
    }

    #[instrument(skip_all, fields(user_id = user_id, file_name = %document.file_name, mime = %document.mime_type))]
    pub async fn process(
        &self,
        user_id: i64,
        document: UploadedDocument,
    ) -> Result<ProcessedReport> {
        let kind = document.kind()?;
        info!(bytes = document.bytes.len(), "Starting report ingestion");

        let raw_output = match &kind {
            DocumentKind::Image { mime } => {
                self.extractor
                    .extract(ExtractionInput::Image {
                        bytes: &document.bytes,
                        mime_type: mime,
                    })
                    .await?
            }
            DocumentKind::Pdf => {
                let text = self.resolver.resolve(&document.bytes).await?;
                self.extractor.extract(ExtractionInput::Text(&text)).await?
            }
        };
        drop(document);

        let report = normalize_report(&raw_output)?;
        info!(subjects = report.subjects.len(), "Parsed report card");

        let WeaknessAnalysis {
            result: analysis,
            violations,
        } = self.analyzer.analyze(&report).await?;

        let records = self.writer.persist(user_id, &report, &analysis).await?;

        Ok(ProcessedReport {
            report,
            analysis,
            records,
            violations,
        })
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<SubjectPerformanceRecord>> {
        self.writer.history(user_id).await
    }
}
