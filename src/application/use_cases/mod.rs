pub mod llm_output;
pub mod report_ingestion;
