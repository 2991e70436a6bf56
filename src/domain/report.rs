use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

pub const PDF_MIME: &str = "application/pdf";

/// A report card as received from the caller. Lives only as long as the
/// request that carries it.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl UploadedDocument {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn kind(&self) -> Result<DocumentKind> {
        DocumentKind::from_mime(&self.mime_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image { mime: String },
}

impl DocumentKind {
    /// Only `application/pdf` and `image/*` are accepted. The comparison is
    /// exact on the declared value.
    pub fn from_mime(mime: &str) -> Result<Self> {
        if mime == PDF_MIME {
            return Ok(DocumentKind::Pdf);
        }
        match mime.strip_prefix("image/") {
            Some(subtype) if !subtype.is_empty() => Ok(DocumentKind::Image {
                mime: mime.to_string(),
            }),
            _ => Err(AppError::UnsupportedFileType(mime.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub subject: String,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedReport {
    pub subjects: Vec<SubjectRecord>,
}

impl ParsedReport {
    pub fn find(&self, subject: &str) -> Option<&SubjectRecord> {
        self.subjects.iter().find(|s| s.subject == subject)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.find(subject).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeaknessResult {
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl WeaknessResult {
    pub fn is_weak(&self, subject: &str) -> bool {
        self.weaknesses.iter().any(|w| w == subject)
    }
}

/// A weakness the analyzer named that does not exist in the source report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContractViolation {
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubjectPerformance {
    pub user_id: i64,
    pub subject: String,
    pub percentage: f64,
    pub needs_focus: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPerformanceRecord {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub percentage: f64,
    pub needs_focus: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedReport {
    pub report: ParsedReport,
    pub analysis: WeaknessResult,
    pub records: Vec<SubjectPerformanceRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<AnalysisContractViolation>,
}
