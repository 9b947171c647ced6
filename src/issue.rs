//! Issue records shared by the parser, matcher and scorers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Four-level severity scale, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Position on the scale (Low = 0 .. Critical = 3).
    pub fn index(self) -> usize {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(()),
        }
    }
}

/// Unknown or non-string severities deserialize to `None` instead of failing.
fn lenient_severity<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok()))
}

/// String form of a loose JSON scalar. Null is absent.
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Null deserializes to an empty string, other non-strings to their JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(value).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(value))
}

/// Accepts a list, a single string, or null. Null list entries are dropped.
fn lenient_locations<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().filter_map(value_text).collect(),
        other => value_text(other).into_iter().collect(),
    })
}

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)in\s+\w+|at\s+line|location:").expect("location pattern is valid")
});

const IMPACT_WORDS: &[&str] = &["impact", "allows", "can", "enables", "leads to"];

/// Cheap textual signals derived from one line of model output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextSignals {
    pub has_detail: bool,
    pub has_location: bool,
    pub has_impact: bool,
    pub has_example: bool,
}

impl TextSignals {
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self {
            has_detail: text.chars().count() > 50,
            has_location: LOCATION_RE.is_match(text),
            has_impact: IMPACT_WORDS.iter().any(|w| lower.contains(w)),
            has_example: text.contains("```") || lower.contains("example:"),
        }
    }
}

/// One detected or expected problem.
///
/// Records are plain values: built once per evaluation, never mutated by the
/// matcher. Matching state lives in the matcher, keyed by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, alias = "text", deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Option<Severity>,
    #[serde(default, deserialize_with = "lenient_locations")]
    pub locations: Vec<String>,
    #[serde(
        default,
        alias = "fix_description",
        deserialize_with = "lenient_opt_string"
    )]
    pub suggested_fix: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub code_example: Option<String>,
    /// Present on records produced by the line parser.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub signals: Option<TextSignals>,
}

impl IssueRecord {
    pub fn new(title: impl Into<String>, severity: Option<Severity>) -> Self {
        Self {
            title: title.into(),
            severity,
            ..Self::default()
        }
    }

    /// Record for a single line of free text, with its signals precomputed.
    pub fn from_line(line: &str) -> Self {
        Self {
            description: line.to_string(),
            signals: Some(TextSignals::detect(line)),
            ..Self::default()
        }
    }

    /// Records from a JSON list of issue objects. Entries that are not
    /// objects are skipped so one bad entry cannot drop its siblings.
    pub fn list_from_value(value: &Value) -> Vec<IssueRecord> {
        let Some(items) = value.as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match IssueRecord::deserialize(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("skipping issue entry {}: {}", i, e);
                    None
                }
            })
            .collect()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    /// Title and description joined with a space, the text used for matching.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    /// Stored signals for parsed lines, otherwise detected from the record text.
    pub fn signals(&self) -> TextSignals {
        self.signals
            .unwrap_or_else(|| TextSignals::detect(self.text().trim()))
    }

    /// Text judged by the fix-quality heuristic: the suggested fix when one
    /// was given, else the record text.
    pub fn fix_text(&self) -> String {
        match self.suggested_fix.as_deref() {
            Some(fix) if !fix.trim().is_empty() => fix.to_string(),
            _ => self.text().trim().to_string(),
        }
    }

    /// Whether the record carries a worked example for its fix.
    pub fn has_code_example(&self) -> bool {
        self.code_example
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
            || self.signals().has_example
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Some(Severity::Critical)
    }
}
