//! Adapter between prompt-optimizer examples and the evaluator.
//!
//! Optimizers hand the metric a labelled example and a model prediction
//! whose fields may be strings, lists or anything else a model produced.
//! Those fields are coerced here; the evaluator only ever sees text and
//! issue records.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::config::{Profile, ScoringConfig};
use crate::evaluator::{EvaluationInput, EvaluationResult, Evaluator};
use crate::issue::{IssueRecord, Severity};
use crate::parser::issues_from_prediction;

/// Ground truth for one training example.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Example {
    #[serde(default)]
    pub expected_issues: Vec<IssueRecord>,
    #[serde(default)]
    pub expected_critical_count: usize,
    #[serde(default)]
    pub expected_high_count: usize,
    #[serde(default)]
    pub code: Option<String>,
}

/// Raw model output for one example.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub issues: Value,
    #[serde(default)]
    pub critical_issues: Value,
    #[serde(default)]
    pub high_issues: Value,
}

/// String form of a model field. Null means absent.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(field_text)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    }
}

impl Prediction {
    /// Predicted issue records, whether given as a list or as text.
    pub fn issue_records(&self) -> Vec<IssueRecord> {
        match &self.issues {
            Value::Null => Vec::new(),
            Value::String(s) => issues_from_prediction(s),
            Value::Array(_) => IssueRecord::list_from_value(&self.issues),
            other => issues_from_prediction(&other.to_string()),
        }
    }

    pub fn critical_text(&self) -> Option<String> {
        field_text(&self.critical_issues)
    }

    pub fn high_text(&self) -> Option<String> {
        field_text(&self.high_issues)
    }
}

/// Objective function handed to an optimizer: example and prediction in,
/// overall score out.
#[derive(Debug, Clone, Default)]
pub struct Metric {
    profile: Profile,
    evaluator: Evaluator,
}

impl Metric {
    pub fn new(profile: Profile, evaluator: Evaluator) -> Self {
        Self { profile, evaluator }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.profile, Evaluator::from_config(config))
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn evaluate(&self, example: &Example, prediction: &Prediction) -> EvaluationResult {
        match self.profile {
            Profile::Matching => {
                let predicted = prediction.issue_records();
                self.evaluator.evaluate(&EvaluationInput::Issues {
                    predicted: &predicted,
                    expected: &example.expected_issues,
                    code_context: example.code.as_deref(),
                })
            }
            Profile::Counts => {
                let critical = prediction.critical_text();
                let high = prediction.high_text();
                self.evaluator.evaluate(&EvaluationInput::Counts {
                    critical_text: critical.as_deref(),
                    high_text: high.as_deref(),
                    expected_critical: example.expected_critical_count,
                    expected_high: example.expected_high_count,
                })
            }
        }
    }

    pub fn score(&self, example: &Example, prediction: &Prediction) -> f64 {
        self.evaluate(example, prediction).overall_score
    }
}

/// A labelled review case with a recorded model prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingCase {
    pub id: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expected_issues: Vec<IssueRecord>,
    /// Expected issue count per severity name, e.g. `{"Critical": 2}`.
    #[serde(default)]
    pub severity_distribution: HashMap<String, usize>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub prediction: Prediction,
}

impl TrainingCase {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read case file {}", path.display()))?;
        let case: TrainingCase = serde_json::from_str(&content)
            .with_context(|| format!("invalid case file {}", path.display()))?;
        Ok(case)
    }

    /// Expected count for a severity, from the distribution if it names
    /// one, else counted from the expected issues.
    ///
    /// An exact key such as `"Critical"` wins. Otherwise every key that names
    /// the severity in another case (`"critical"`, `"CRITICAL"`) is summed.
    pub fn expected_count(&self, severity: Severity) -> usize {
        if let Some(&count) = self.severity_distribution.get(&severity.to_string()) {
            return count;
        }

        let variants: Vec<(&String, usize)> = self
            .severity_distribution
            .iter()
            .filter(|(name, _)| name.parse::<Severity>() == Ok(severity))
            .map(|(name, &count)| (name, count))
            .collect();
        if !variants.is_empty() {
            debug!("case {}: {} count taken from {:?}", self.id, severity, variants);
            return variants.iter().map(|(_, count)| count).sum();
        }

        self.expected_issues
            .iter()
            .filter(|i| i.severity == Some(severity))
            .count()
    }

    pub fn example(&self) -> Example {
        Example {
            expected_issues: self.expected_issues.clone(),
            expected_critical_count: self.expected_count(Severity::Critical),
            expected_high_count: self.expected_count(Severity::High),
            code: self.code.clone(),
        }
    }
}
