use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::{info, warn};

use super::prompts::{build_analysis_system_prompt, build_analysis_user_prompt};
use crate::application::use_cases::llm_output::{
    malformed_output, recover_json, DEFAULT_STRATEGIES,
};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::report::{AnalysisContractViolation, ParsedReport, WeaknessResult};
use crate::infrastructure::llm_clients::LLMClient;

/// Ranked weaknesses plus every candidate name the report does not contain,
/// including names the cap cut off.
#[derive(Debug, Default)]
pub struct WeaknessAnalysis {
    pub result: WeaknessResult,
    pub violations: Vec<AnalysisContractViolation>,
}

/// Asks the completion service for the weakest subjects of a parsed report.
pub struct WeaknessAnalyzer {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    call_timeout: Duration,
    max_weaknesses: usize,
}

impl WeaknessAnalyzer {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: LLMConfig,
        call_timeout: Duration,
        max_weaknesses: usize,
    ) -> Self {
        Self {
            llm_client,
            config,
            call_timeout,
            max_weaknesses,
        }
    }

    pub async fn analyze(&self, report: &ParsedReport) -> Result<WeaknessAnalysis> {
        if report.subjects.is_empty() {
            info!("Report has no subjects, skipping weakness analysis");
            return Ok(WeaknessAnalysis::default());
        }

        let raw = timeout(
            self.call_timeout,
            self.llm_client.generate(
                &self.config,
                &build_analysis_system_prompt(self.max_weaknesses),
                &build_analysis_user_prompt(report),
            ),
        )
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "weakness analysis exceeded {}s",
                self.call_timeout.as_secs()
            ))
        })??;

        let object = recover_json(&raw, DEFAULT_STRATEGIES)?;
        let weaknesses = match object.get("weaknesses") {
            Some(Value::Array(items)) => string_items(items),
            _ => {
                return Err(malformed_output(
                    "missing `weaknesses` array in analysis output",
                    &raw,
                ))
            }
        };
        let recommendations = match object.get("recommendations") {
            Some(Value::Array(items)) => string_items(items),
            _ => Vec::new(),
        };

        let candidates = dedupe(weaknesses);
        let violations = contract_violations(report, &candidates);
        let result = WeaknessResult {
            weaknesses: rank_weaknesses(report, candidates, self.max_weaknesses),
            recommendations,
        };
        info!(
            weaknesses = ?result.weaknesses,
            violations = violations.len(),
            "Weakness analysis finished"
        );
        Ok(WeaknessAnalysis { result, violations })
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedupe(candidates: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Dedupes, orders subjects known to the report by ascending percentage
/// (stable, unknown percentages last), keeps unmatched names after them and
/// applies the cap.
pub(crate) fn rank_weaknesses(
    report: &ParsedReport,
    candidates: Vec<String>,
    max_weaknesses: usize,
) -> Vec<String> {
    let (mut matched, unmatched): (Vec<String>, Vec<String>) =
        dedupe(candidates).into_iter().partition(|name| report.contains(name));

    matched.sort_by(|a, b| {
        let pa = report.find(a).and_then(|s| s.percentage);
        let pb = report.find(b).and_then(|s| s.percentage);
        match (pa, pb) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });

    matched
        .into_iter()
        .chain(unmatched)
        .take(max_weaknesses)
        .collect()
}

/// Candidate names with no exactly matching subject in the report. Runs
/// before the cap so a trimmed name is still reported. Each one is logged;
/// none of them stops persistence.
pub fn contract_violations(
    report: &ParsedReport,
    candidates: &[String],
) -> Vec<AnalysisContractViolation> {
    candidates
        .iter()
        .filter(|name| !report.contains(name))
        .map(|name| {
            warn!(subject = %name, "Analyzer returned a subject not present in the report");
            AnalysisContractViolation {
                subject: name.clone(),
            }
        })
        .collect()
}
