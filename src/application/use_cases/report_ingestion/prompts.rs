use crate::domain::report::ParsedReport;

pub(super) const REPORT_SCHEMA: &str = r#"{
  "subjects": [
    {
      "subject": "string",
      "score": "number",
      "percentage": "number",
      "level": "string"
    }
  ]
}"#;

pub(super) fn build_image_system_prompt() -> String {
    "You are an expert at parsing South African school report cards. \
Extract student performance data including academic performance by subject \
(subject name, score, percentage and achievement level). \
Return the data as structured JSON only."
        .to_string()
}

pub(super) fn build_image_user_prompt() -> String {
    format!(
        "Extract all student performance data from this South African report card.\n\
Return strictly as JSON with the following structure:\n{}\n\
Use the subject names exactly as printed. Use null for values that are not on the card.",
        REPORT_SCHEMA
    )
}

pub(super) fn build_text_system_prompt() -> String {
    "You are an expert at parsing South African school report cards from text. \
Return the data as structured JSON only."
        .to_string()
}

pub(super) fn build_text_user_prompt(report_text: &str) -> String {
    format!(
        "Extract student performance data from this South African report card text:\n\n\
{}\n\n\
Return strictly as JSON with the following structure:\n{}\n\
Use the subject names exactly as printed. Use null for values that are not in the text.",
        report_text.trim(),
        REPORT_SCHEMA
    )
}

pub(super) fn build_analysis_system_prompt(max_weaknesses: usize) -> String {
    format!(
        "You analyse student report cards. Identify the {max} subjects with the lowest \
\"percentage\" values and return them sorted from lowest to highest. \
Copy each \"subject\" value exactly as it appears in the input: no paraphrasing, \
no translation, no abbreviation. If fewer than {max} subjects have a percentage, \
return only those. You may add at most {max} short recommendations. \
Respond with JSON only, shaped as {{\"weaknesses\": [\"subject\"], \"recommendations\": [\"text\"]}}.",
        max = max_weaknesses
    )
}

pub(super) fn build_analysis_user_prompt(report: &ParsedReport) -> String {
    let report_json =
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{\"subjects\": []}".to_string());
    format!(
        "Here is a student performance report in JSON:\n{}",
        report_json
    )
}
