use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    ValidationError(String),
    ConfigError(String),
    UnsupportedFileType(String),
    ExtractionFailure(String),
    MalformedExtraction { reason: String, raw: String },
    LLMError(String),
    Timeout(String),
    DatabaseError(String),
    IoError(String),
}

impl AppError {
    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::ValidationError(_) => "validation",
            AppError::ConfigError(_) => "config",
            AppError::UnsupportedFileType(_) => "unsupported_file_type",
            AppError::ExtractionFailure(_) => "extraction_failure",
            AppError::MalformedExtraction { .. } => "malformed_extraction",
            AppError::LLMError(_) => "llm",
            AppError::Timeout(_) => "timeout",
            AppError::DatabaseError(_) => "persistence",
            AppError::IoError(_) => "io",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::UnsupportedFileType(mime) => write!(f, "Unsupported file type: {}", mime),
            AppError::ExtractionFailure(msg) => write!(f, "Extraction failed: {}", msg),
            AppError::MalformedExtraction { reason, .. } => {
                write!(f, "Malformed extraction output: {}", reason)
            }
            AppError::LLMError(msg) => write!(f, "LLM error: {}", msg),
            AppError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
