//! Composite score over the per-dimension scorers.
//!
//! One evaluator, two algorithms. The matching profile pairs predicted issue
//! records with ground truth. The count profile parses two free-text fields
//! and compares line counts with the expected critical/high counts, for when
//! only counts are known.

use serde::Serialize;
use tracing::debug;

use crate::config::{CountWeights, MatchingWeights, Profile, ScoringConfig};
use crate::issue::IssueRecord;
use crate::matcher::match_issues;
use crate::parser::parse_issues;
use crate::scoring::{self, BucketScore, MatchCounts};

/// What one evaluation call scores.
#[derive(Debug, Clone)]
pub enum EvaluationInput<'a> {
    /// Full issue records on both sides.
    Issues {
        predicted: &'a [IssueRecord],
        expected: &'a [IssueRecord],
        /// Reviewed source. Not used by any score yet.
        code_context: Option<&'a str>,
    },
    /// Free-text model output plus expected counts per severity bucket.
    Counts {
        critical_text: Option<&'a str>,
        high_text: Option<&'a str>,
        expected_critical: usize,
        expected_high: usize,
    },
}

impl EvaluationInput<'_> {
    pub fn profile(&self) -> Profile {
        match self {
            EvaluationInput::Issues { .. } => Profile::Matching,
            EvaluationInput::Counts { .. } => Profile::Counts,
        }
    }
}

/// Scores for one evaluation. Every field is in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub profile: Profile,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub issue_detection: f64,
    pub severity_accuracy: f64,
    pub critical_recall: f64,
    pub explanation_quality: f64,
    pub fix_quality: f64,
    /// Lower is better.
    pub false_positive_rate: f64,
    pub overall_score: f64,
}

/// Stateless apart from its weights; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    matching: MatchingWeights,
    counts: CountWeights,
}

impl Evaluator {
    pub fn new(matching: MatchingWeights, counts: CountWeights) -> Self {
        Self { matching, counts }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.matching, config.counts)
    }

    pub fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
        match *input {
            EvaluationInput::Issues {
                predicted,
                expected,
                code_context: _,
            } => self.score_issues(predicted, expected),
            EvaluationInput::Counts {
                critical_text,
                high_text,
                expected_critical,
                expected_high,
            } => self.score_counts(critical_text, high_text, expected_critical, expected_high),
        }
    }

    /// Matching profile: pair issues, then weigh precision, recall, critical
    /// recall, severity accuracy and fix quality.
    pub fn score_issues(
        &self,
        predicted: &[IssueRecord],
        expected: &[IssueRecord],
    ) -> EvaluationResult {
        let pairs = match_issues(predicted, expected);
        let counts = MatchCounts::from_pairs(&pairs);

        let precision = scoring::precision(&counts);
        let recall = scoring::recall(&counts, expected.len());
        let f1_score = scoring::f1(precision, recall);
        let severity_accuracy = scoring::severity_accuracy(&pairs);
        let critical_recall = scoring::critical_recall(&pairs, expected);
        let false_positive_rate = scoring::false_positive_rate(&counts, predicted.len());
        let fix_quality = scoring::fix_quality(predicted);
        let explanation_quality = scoring::explanation_quality(predicted);

        let w = &self.matching;
        let overall = w.precision * precision
            + w.recall * recall
            + w.critical_recall * critical_recall
            + w.severity_accuracy * severity_accuracy
            + w.fix_quality * fix_quality;

        let result = EvaluationResult {
            profile: Profile::Matching,
            precision,
            recall,
            f1_score,
            issue_detection: f1_score,
            severity_accuracy,
            critical_recall,
            explanation_quality,
            fix_quality,
            false_positive_rate,
            overall_score: clamp_unit(overall),
        };
        debug!(
            "matching score {:.3} (tp={} fp={} fn={})",
            result.overall_score, counts.true_positives, counts.false_positives, counts.false_negatives
        );
        result
    }

    /// Count profile: parse both text fields into lines and compare counts.
    pub fn score_counts(
        &self,
        critical_text: Option<&str>,
        high_text: Option<&str>,
        expected_critical: usize,
        expected_high: usize,
    ) -> EvaluationResult {
        let critical_issues = parse_issues(critical_text);
        let high_issues = parse_issues(high_text);
        let found_critical = critical_issues.len();
        let found_high = high_issues.len();

        let critical = BucketScore::compare(found_critical, expected_critical);
        let high = BucketScore::compare(found_high, expected_high);
        let issue_detection = scoring::blend_buckets(critical.f1, high.f1);

        let severity_accuracy =
            scoring::bucket_severity_score(found_critical, expected_critical, found_high, expected_high);

        let mut all_issues = critical_issues;
        all_issues.extend(high_issues);
        let explanation_quality = scoring::explanation_quality(&all_issues);
        let fix_quality = scoring::fix_quality(&all_issues);

        let false_positive_rate = scoring::over_reporting_rate(
            found_critical + found_high,
            expected_critical + expected_high,
        );

        let w = &self.counts;
        let overall = w.issue_detection * issue_detection
            + w.severity_accuracy * severity_accuracy
            + w.explanation_quality * explanation_quality
            + w.fix_quality * fix_quality
            - w.false_positive_penalty * false_positive_rate;

        let result = EvaluationResult {
            profile: Profile::Counts,
            precision: scoring::blend_buckets(
                critical.reported_precision(),
                high.reported_precision(),
            ),
            recall: scoring::blend_buckets(critical.reported_recall(), high.reported_recall()),
            f1_score: issue_detection,
            issue_detection,
            severity_accuracy,
            critical_recall: critical.reported_recall(),
            explanation_quality,
            fix_quality,
            false_positive_rate,
            overall_score: clamp_unit(overall),
        };
        debug!(
            "count score {:.3} (critical {}/{}, high {}/{})",
            result.overall_score, found_critical, expected_critical, found_high, expected_high
        );
        result
    }
}

/// Clamp to [0, 1]; NaN maps to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
