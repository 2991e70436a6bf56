use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static LEADING_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap());

static TRAILING_FENCE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?[ \t]*```$").unwrap());

/// Removes reasoning artifacts some models emit before their answer.
pub fn clean_llm_response(response: &str) -> String {
    let mut cleaned = THINK_TAG_PATTERN.replace_all(response, "").to_string();
    cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "").to_string();
    cleaned.trim().to_string()
}

/// Strips one surrounding markdown code fence (with or without a language
/// tag) and the whitespace around it. Text without a fence is only trimmed.
pub fn strip_code_fences(value: &str) -> String {
    let trimmed = value.trim();
    let without_open = LEADING_FENCE_PATTERN.replace(trimmed, "");
    let without_close = TRAILING_FENCE_PATTERN.replace(&without_open, "");
    without_close.trim().to_string()
}
