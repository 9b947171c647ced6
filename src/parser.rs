//! Turns free-form model output into issue records.
//!
//! The line parser never fails. Text it cannot use is skipped, so bad output
//! shows up as missed issues rather than as an error.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::issue::{IssueRecord, Severity};

/// Lines shorter than this (after trimming) are not issues.
pub const MIN_LINE_LEN: usize = 15;

/// How far past an issue header to look for its severity, in bytes.
const SEVERITY_LOOKAHEAD: usize = 200;

static ISSUE_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)(?:Issue|Problem)\s*#?(\d+)[:\s]*([^\n]+)").expect("header pattern is valid")
});

static SEVERITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Severity[:\s]*(Critical|High|Medium|Low)").expect("severity pattern is valid")
});

/// Parse one output field into issue records, one per qualifying line.
///
/// `None` and the literal `N/A` yield nothing. Blank lines, lines shorter
/// than [`MIN_LINE_LEN`] characters and markdown headings are skipped.
pub fn parse_issues(text: Option<&str>) -> Vec<IssueRecord> {
    let text = match text {
        Some(t) if t != "N/A" => t,
        _ => return Vec::new(),
    };

    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= MIN_LINE_LEN)
        .filter(|line| !line.starts_with('#'))
        .map(IssueRecord::from_line)
        .collect()
}

/// Extract `Issue #N: title` style headers from a longer review.
///
/// Severity comes from the first `Severity: X` shortly after the header and
/// defaults to Medium.
pub fn extract_structured_issues(output: &str) -> Vec<IssueRecord> {
    ISSUE_HEADER_RE
        .captures_iter(output)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let title = caps.get(2)?.as_str().trim();
            let window = lookahead_window(output, whole.end());
            let severity = SEVERITY_RE
                .captures(window)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(Severity::Medium);
            Some(IssueRecord::new(title, Some(severity)))
        })
        .collect()
}

/// Slice of `text` starting at `start`, at most [`SEVERITY_LOOKAHEAD`] bytes,
/// cut back to a char boundary.
fn lookahead_window(text: &str, start: usize) -> &str {
    let mut end = (start + SEVERITY_LOOKAHEAD).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}

/// Coerce a model's "issues" output into records.
///
/// Tries a JSON array (bare, fenced, or embedded in prose), then
/// `Issue #N` headers. Anything else is treated as no issues.
pub fn issues_from_prediction(raw: &str) -> Vec<IssueRecord> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "N/A" {
        return Vec::new();
    }

    if let Some(block) = extract_json_array(trimmed) {
        match serde_json::from_str::<serde_json::Value>(&block) {
            Ok(value) => return IssueRecord::list_from_value(&value),
            Err(e) => debug!("prediction is not a JSON issue list: {}", e),
        }
    }

    let issues = extract_structured_issues(trimmed);
    if issues.is_empty() {
        debug!("no issues recognised in prediction ({} bytes)", trimmed.len());
    }
    issues
}

/// Find a JSON array in text that may carry markdown fences or preamble.
fn extract_json_array(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            let inner = text[start + 7..start + 7 + end].trim();
            if inner.starts_with('[') {
                return Some(inner.to_string());
            }
        }
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| text[start..=end].to_string())
}
