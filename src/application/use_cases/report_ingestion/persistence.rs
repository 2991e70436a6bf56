use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::error::Result;
use crate::domain::report::{
    NewSubjectPerformance, ParsedReport, SubjectPerformanceRecord, WeaknessResult,
};
use crate::infrastructure::db::report_results::ReportResultsRepository;

/// Rows to append for one upload. Subjects without a numeric percentage are
/// left out since they cannot take part in lowest-percentage queries.
pub fn build_rows(
    user_id: i64,
    report: &ParsedReport,
    result: &WeaknessResult,
) -> Vec<NewSubjectPerformance> {
    report
        .subjects
        .iter()
        .filter_map(|subject| {
            let percentage = subject.percentage?;
            Some(NewSubjectPerformance {
                user_id,
                subject: subject.subject.clone(),
                percentage,
                needs_focus: result.is_weak(&subject.subject),
            })
        })
        .collect()
}

pub struct PerformanceWriter {
    repository: Arc<ReportResultsRepository>,
}

impl PerformanceWriter {
    pub fn new(repository: Arc<ReportResultsRepository>) -> Self {
        Self { repository }
    }

    /// Appends one row per subject. Rows written before a failing insert stay
    /// written.
    pub async fn persist(
        &self,
        user_id: i64,
        report: &ParsedReport,
        result: &WeaknessResult,
    ) -> Result<Vec<SubjectPerformanceRecord>> {
        let rows = build_rows(user_id, report, result);
        let skipped = report.subjects.len() - rows.len();
        if skipped > 0 {
            debug!(skipped, "Skipping subjects without a numeric percentage");
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(self.repository.insert(row).await?);
        }

        info!(user_id, rows = records.len(), "Persisted subject results");
        Ok(records)
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<SubjectPerformanceRecord>> {
        self.repository.list_for_user(user_id).await
    }
}
