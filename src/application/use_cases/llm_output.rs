//! Recovery of structured data from free-form completion output.
//!
//! Models are asked for bare JSON but regularly wrap it in code fences, add a
//! sentence before or after it, or emit reasoning tags. [`recover_json`] runs
//! an ordered list of [`ParseStrategy`] values over the cleaned text and fails
//! with [`AppError::MalformedExtraction`] when none of them yields an object.
//! [`normalize_report`] then coerces the object into a [`ParsedReport`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::report::{ParsedReport, SubjectRecord};
use crate::infrastructure::response::{clean_llm_response, strip_code_fences};

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(\.\d+)?").unwrap());

/// One way of turning cleaned model output into a JSON object.
pub trait ParseStrategy: Sync {
    fn name(&self) -> &'static str;
    fn attempt(&self, cleaned: &str) -> Option<Map<String, Value>>;
}

/// The whole cleaned string is the object.
pub struct DirectParse;

impl ParseStrategy for DirectParse {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn attempt(&self, cleaned: &str) -> Option<Map<String, Value>> {
        match serde_json::from_str::<Value>(cleaned).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

/// The object sits between the first `{` and the last `}`, with prose around it.
pub struct BraceSlice;

impl ParseStrategy for BraceSlice {
    fn name(&self) -> &'static str {
        "brace_slice"
    }

    fn attempt(&self, cleaned: &str) -> Option<Map<String, Value>> {
        let start = cleaned.find('{')?;
        let end = cleaned.rfind('}')?;
        if end <= start {
            return None;
        }
        DirectParse.attempt(&cleaned[start..=end])
    }
}

pub static DEFAULT_STRATEGIES: &[&dyn ParseStrategy] = &[&DirectParse, &BraceSlice];

/// Cleans `raw` and returns the first object any strategy recovers.
pub fn recover_json(raw: &str, strategies: &[&dyn ParseStrategy]) -> Result<Map<String, Value>> {
    let cleaned = strip_code_fences(&clean_llm_response(raw));

    for strategy in strategies {
        if let Some(map) = strategy.attempt(&cleaned) {
            debug!(strategy = strategy.name(), "Recovered JSON from model output");
            return Ok(map);
        }
    }

    Err(malformed_output("no JSON object could be recovered from model output", raw))
}

/// Builds [`AppError::MalformedExtraction`] and logs the offending output,
/// which `Display` leaves out.
pub fn malformed_output(reason: &str, raw: &str) -> AppError {
    warn!(reason, raw = %raw, "Model output could not be normalized");
    AppError::MalformedExtraction {
        reason: reason.to_string(),
        raw: raw.to_string(),
    }
}

/// Full normalization of extraction output into a [`ParsedReport`].
pub fn normalize_report(raw: &str) -> Result<ParsedReport> {
    let object = recover_json(raw, DEFAULT_STRATEGIES)?;

    let entries = match object.get("subjects") {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(malformed_output("`subjects` is not an array", raw)),
        None => return Err(malformed_output("missing `subjects` array", raw)),
    };

    let mut subjects = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match normalize_subject(entry) {
            Some(record) => subjects.push(record),
            None => warn!(index, entry = %entry, "Dropping subject entry without a name"),
        }
    }

    Ok(ParsedReport { subjects })
}

fn normalize_subject(entry: &Value) -> Option<SubjectRecord> {
    let object = entry.as_object()?;
    let subject = object
        .get("subject")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    Some(SubjectRecord {
        subject,
        score: object.get("score").and_then(coerce_number),
        percentage: object.get("percentage").and_then(coerce_number),
        level: object.get("level").and_then(coerce_label),
    })
}

/// Numbers pass through; strings give their first numeric run; anything else
/// is absent.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER_PATTERN
            .find(s)
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    }
}

fn coerce_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_report_round_trips() {
        let original = json!({
            "subjects": [
                {"subject": "Mathematics", "score": 42.0, "percentage": 42.0, "level": "3"},
                {"subject": "English Home Language", "score": 71.5, "percentage": 71.5, "level": "6"},
                {"subject": "Life Orientation", "score": null, "percentage": null, "level": null}
            ]
        });
        let raw = format!("```json\n{}\n```", serde_json::to_string_pretty(&original).unwrap());

        let report = normalize_report(&raw).unwrap();
        assert_eq!(serde_json::to_value(&report).unwrap(), original);
    }

    #[test]
    fn test_prose_around_object_is_sliced_away() {
        let report = normalize_report("Here is the result: {\"subjects\":[]} Thanks!").unwrap();
        assert_eq!(report, ParsedReport { subjects: vec![] });
    }

    #[test]
    fn test_no_json_is_malformed_with_raw_attached() {
        let raw = "I could not read this report card, sorry.";
        match normalize_report(raw).unwrap_err() {
            AppError::MalformedExtraction { raw: kept, .. } => assert_eq!(kept, raw),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_broken_json_is_malformed() {
        let err = normalize_report("{\"subjects\": [ {\"subject\": \"Maths\", ").unwrap_err();
        assert!(matches!(err, AppError::MalformedExtraction { .. }));
    }

    #[test]
    fn test_missing_subjects_is_malformed() {
        let err = normalize_report("{\"students\": []}").unwrap_err();
        assert!(matches!(err, AppError::MalformedExtraction { .. }));
    }

    #[test]
    fn test_percentage_strings_are_coerced() {
        let raw = r#"{"subjects": [
            {"subject": "Mathematics", "percentage": "87%", "score": "87/100"},
            {"subject": "Afrikaans FAL", "percentage": "N/A", "score": 12},
            {"subject": "Physical Sciences", "percentage": "approx. 64.5 %"}
        ]}"#;
        let report = normalize_report(raw).unwrap();

        assert_eq!(report.subjects[0].percentage, Some(87.0));
        assert_eq!(report.subjects[0].score, Some(87.0));
        assert_eq!(report.subjects[1].percentage, None);
        assert_eq!(report.subjects[1].score, Some(12.0));
        assert_eq!(report.subjects[2].percentage, Some(64.5));
        assert_eq!(report.subjects[2].level, None);
    }

    #[test]
    fn test_entries_without_subject_are_dropped() {
        let raw = r#"{"subjects": [{"subject": "  "}, {"percentage": 50}, "Maths", {"subject": "History", "level": 5}]}"#;
        let report = normalize_report(raw).unwrap();
        assert_eq!(report.subjects.len(), 1);
        assert_eq!(report.subjects[0].subject, "History");
        assert_eq!(report.subjects[0].level.as_deref(), Some("5"));
    }

    #[test]
    fn test_think_tags_before_fence_are_removed() {
        let raw = "<think>reading the table</think>\n```json\n{\"subjects\": [{\"subject\": \"Geography\", \"percentage\": 58}]}\n```";
        let report = normalize_report(raw).unwrap();
        assert_eq!(report.subjects[0].percentage, Some(58.0));
    }

    #[test]
    fn test_strategies_run_in_order() {
        assert!(DirectParse.attempt("note {\"a\": 1}").is_none());
        assert!(BraceSlice.attempt("note {\"a\": 1}").is_some());
        assert!(BraceSlice.attempt("} backwards {").is_none());
        assert!(DirectParse.attempt("[1, 2]").is_none());
    }

    #[test]
    fn test_coerce_number_variants() {
        assert_eq!(coerce_number(&json!(55)), Some(55.0));
        assert_eq!(coerce_number(&json!("Level 4 (55%)")), Some(4.0));
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!("")), None);
    }
}
