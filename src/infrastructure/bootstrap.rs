use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::application::use_cases::report_ingestion::{
    DocumentTextResolver, PerformanceWriter, ResolverSettings, StructuredExtractionClient,
    WeaknessAnalyzer,
};
use crate::application::ReportIngestionUseCase;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::report_results::ReportResultsRepository;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::infrastructure::ocr::TesseractEngine;
use crate::infrastructure::pdf::{LopdfTextExtractor, PdftoppmRasterizer};
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Constructs every shared adapter once and wires them into the pipeline.
pub async fn build_state(config: &AppConfig, logs: Arc<Mutex<Vec<LogEntry>>>) -> Result<HttpState> {
    let repository = Arc::new(ReportResultsRepository::init(&config.database.url).await?);
    add_log(
        &logs,
        "INFO",
        "Bootstrap",
        &format!("Report results store ready at {}", config.database.url),
    );

    warn_missing_key("extraction", &config.extraction, &logs);
    warn_missing_key("analysis", &config.analysis, &logs);

    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new());
    let call_timeout = Duration::from_secs(config.pipeline.llm_timeout_secs);

    let resolver = DocumentTextResolver::new(
        Arc::new(LopdfTextExtractor::new()),
        Arc::new(PdftoppmRasterizer::new(config.ocr.pdftoppm_cmd.clone())),
        Arc::new(TesseractEngine::new(&config.ocr)),
        ResolverSettings::from_config(&config.ocr, config.pipeline.min_text_chars),
    );
    info!(
        tesseract = %config.ocr.tesseract_cmd,
        pdftoppm = %config.ocr.pdftoppm_cmd,
        languages = %config.ocr.languages,
        dpi = config.ocr.render_dpi(),
        "OCR fallback configured"
    );

    let ingestion = ReportIngestionUseCase::new(
        resolver,
        StructuredExtractionClient::new(llm_client.clone(), config.extraction.clone(), call_timeout),
        WeaknessAnalyzer::new(
            llm_client,
            config.analysis.clone(),
            call_timeout,
            config.pipeline.max_weaknesses,
        ),
        PerformanceWriter::new(repository),
    );

    Ok(HttpState {
        ingestion: Arc::new(ingestion),
        logs,
        started_at: Instant::now(),
    })
}

fn warn_missing_key(stage: &str, llm: &LLMConfig, logs: &Mutex<Vec<LogEntry>>) {
    if llm.api_key.is_none() {
        warn!(stage, provider = ?llm.provider, "No API key configured");
        add_log(
            logs,
            "WARN",
            "Bootstrap",
            &format!("No API key configured for {} ({:?})", stage, llm.provider),
        );
    }
}
