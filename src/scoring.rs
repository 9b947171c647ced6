//! Per-dimension scores. Every function here is total and returns a value
//! in [0, 1]; empty denominators fall back to a fixed neutral value.

use crate::issue::IssueRecord;
use crate::matcher::MatchPair;

/// True/false positive and false negative tallies over a set of pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl MatchCounts {
    pub fn from_pairs(pairs: &[MatchPair<'_>]) -> Self {
        pairs.iter().fold(Self::default(), |mut c, pair| {
            match pair {
                MatchPair::Matched { .. } => c.true_positives += 1,
                MatchPair::Spurious { .. } => c.false_positives += 1,
                MatchPair::Missed { .. } => c.false_negatives += 1,
            }
            c
        })
    }
}

/// TP / (TP + FP); 1.0 with no predictions.
pub fn precision(counts: &MatchCounts) -> f64 {
    let predicted = counts.true_positives + counts.false_positives;
    if predicted == 0 {
        return 1.0;
    }
    counts.true_positives as f64 / predicted as f64
}

/// TP / expected; 1.0 when nothing was expected.
pub fn recall(counts: &MatchCounts, total_expected: usize) -> f64 {
    if total_expected == 0 {
        return 1.0;
    }
    counts.true_positives as f64 / total_expected as f64
}

pub fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * (precision * recall) / (precision + recall)
}

/// Share of matched pairs whose severities are at most one level apart.
///
/// Pairs where either side has no recognised severity are left out of the
/// count entirely. 1.0 when no pair can be judged.
pub fn severity_accuracy(pairs: &[MatchPair<'_>]) -> f64 {
    let mut correct = 0usize;
    let mut judged = 0usize;

    for pair in pairs {
        if let MatchPair::Matched {
            predicted, expected, ..
        } = pair
        {
            if let (Some(p), Some(e)) = (predicted.severity, expected.severity) {
                judged += 1;
                if p.index().abs_diff(e.index()) <= 1 {
                    correct += 1;
                }
            }
        }
    }

    if judged == 0 {
        return 1.0;
    }
    correct as f64 / judged as f64
}

/// Share of expected Critical issues that were matched by anything,
/// whatever severity the prediction claimed. 1.0 with no Critical issues.
pub fn critical_recall(pairs: &[MatchPair<'_>], expected: &[IssueRecord]) -> f64 {
    let critical_expected = expected.iter().filter(|e| e.is_critical()).count();
    if critical_expected == 0 {
        return 1.0;
    }

    let critical_found = pairs
        .iter()
        .filter(|p| matches!(p, MatchPair::Matched { expected, .. } if expected.is_critical()))
        .count();

    critical_found as f64 / critical_expected as f64
}

/// FP / predicted; 0.0 with no predictions.
pub fn false_positive_rate(counts: &MatchCounts, total_predicted: usize) -> f64 {
    if total_predicted == 0 {
        return 0.0;
    }
    counts.false_positives as f64 / total_predicted as f64
}

const ACTION_WORDS: &[&str] = &["use", "should", "replace", "change", "instead"];

/// Points for one issue's fix text. The three parts add up to 0.9, not 1.0.
fn fix_points(issue: &IssueRecord) -> f64 {
    let text = issue.fix_text().to_lowercase();
    let mut score = 0.0;

    if ACTION_WORDS.iter().any(|w| text.contains(w)) {
        score += 0.3;
    }
    if issue.has_code_example() || text.contains('`') {
        score += 0.4;
    }
    if text.chars().count() > 100 {
        score += 0.2;
    }

    score
}

/// Mean fix score across issues; 0.0 with no issues.
pub fn fix_quality(issues: &[IssueRecord]) -> f64 {
    if issues.is_empty() {
        return 0.0;
    }
    issues.iter().map(fix_points).sum::<f64>() / issues.len() as f64
}

/// Mean explanation score across issues; 0.0 with no issues.
///
/// 0.4 for detail, 0.3 for a location, 0.3 for a stated impact.
pub fn explanation_quality(issues: &[IssueRecord]) -> f64 {
    if issues.is_empty() {
        return 0.0;
    }

    let total: f64 = issues
        .iter()
        .map(|issue| {
            let s = issue.signals();
            let mut score = 0.0;
            if s.has_detail {
                score += 0.4;
            }
            if s.has_location {
                score += 0.3;
            }
            if s.has_impact {
                score += 0.3;
            }
            score
        })
        .sum();

    total / issues.len() as f64
}

/// Found-versus-expected comparison for one severity bucket, used when only
/// counts are known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketScore {
    pub found: usize,
    pub expected: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl BucketScore {
    /// Recall is `found / expected` capped at 1, precision is
    /// `expected / found` capped at 1. Either is 0.0 when its denominator is
    /// zero, so an empty bucket that was expected empty scores 0.
    pub fn compare(found: usize, expected: usize) -> Self {
        let recall = if expected > 0 {
            (found as f64 / expected as f64).min(1.0)
        } else {
            0.0
        };
        let precision = if found > 0 {
            (expected as f64 / found as f64).min(1.0)
        } else {
            0.0
        };
        Self {
            found,
            expected,
            precision,
            recall,
            f1: f1(precision, recall),
        }
    }

    /// Precision as reported to callers: 1.0 when nothing was found.
    pub fn reported_precision(&self) -> f64 {
        if self.found == 0 {
            return 1.0;
        }
        self.precision
    }

    /// Recall as reported to callers: 1.0 when nothing was expected.
    pub fn reported_recall(&self) -> f64 {
        if self.expected == 0 {
            return 1.0;
        }
        self.recall
    }
}

pub const CRITICAL_BUCKET_WEIGHT: f64 = 0.7;
pub const HIGH_BUCKET_WEIGHT: f64 = 0.3;

/// Blend a critical-bucket value with a high-bucket value.
pub fn blend_buckets(critical: f64, high: f64) -> f64 {
    critical * CRITICAL_BUCKET_WEIGHT + high * HIGH_BUCKET_WEIGHT
}

/// 0.5 base, plus 0.25 per bucket that reached 80% of its expected count.
pub fn bucket_severity_score(
    found_critical: usize,
    expected_critical: usize,
    found_high: usize,
    expected_high: usize,
) -> f64 {
    let mut score = 0.5;
    if found_critical as f64 >= expected_critical as f64 * 0.8 {
        score += 0.25;
    }
    if found_high as f64 >= expected_high as f64 * 0.8 {
        score += 0.25;
    }
    score
}

/// Share of reported issues beyond the expected total; 0.0 with none reported.
pub fn over_reporting_rate(total_found: usize, total_expected: usize) -> f64 {
    if total_found == 0 {
        return 0.0;
    }
    total_found.saturating_sub(total_expected) as f64 / total_found as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use crate::matcher::match_issues;

    fn rec(title: &str, severity: Option<Severity>) -> IssueRecord {
        IssueRecord::new(title, severity).with_category("security")
    }

    #[test]
    fn test_precision_recall_defaults() {
        let none = MatchCounts::default();
        assert_eq!(precision(&none), 1.0);
        assert_eq!(recall(&none, 0), 1.0);
        assert_eq!(false_positive_rate(&none, 0), 0.0);
        assert_eq!(f1(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_counts_from_pairs() {
        let exp = [rec("sql injection", None), rec("path traversal", None)];
        let preds = [rec("sql injection", None), rec("rate limiting absent", None)];
        let pairs = match_issues(&preds, &exp);
        let counts = MatchCounts::from_pairs(&pairs);
        assert_eq!(
            counts,
            MatchCounts {
                true_positives: 1,
                false_positives: 1,
                false_negatives: 1
            }
        );
        assert_eq!(precision(&counts), 0.5);
        assert_eq!(recall(&counts, exp.len()), 0.5);
        assert_eq!(false_positive_rate(&counts, preds.len()), 0.5);
    }

    #[test]
    fn test_severity_tolerance() {
        let exp = [rec("sql injection", Some(Severity::Critical))];

        let preds = [rec("sql injection", Some(Severity::High))];
        let pairs = match_issues(&preds, &exp);
        assert_eq!(severity_accuracy(&pairs), 1.0);

        let preds = [rec("sql injection", Some(Severity::Medium))];
        let pairs = match_issues(&preds, &exp);
        assert_eq!(severity_accuracy(&pairs), 0.0);
    }

    #[test]
    fn test_severity_unparseable_excluded() {
        let exp = [
            rec("sql injection", Some(Severity::Critical)),
            rec("weak hashing", Some(Severity::High)),
        ];
        let preds = [
            rec("sql injection", Some(Severity::Critical)),
            rec("weak hashing", None),
        ];
        let pairs = match_issues(&preds, &exp);
        assert_eq!(pairs.iter().filter(|p| p.is_matched()).count(), 2);
        assert_eq!(severity_accuracy(&pairs), 1.0);
    }

    #[test]
    fn test_severity_accuracy_without_matches() {
        assert_eq!(severity_accuracy(&[]), 1.0);
    }

    #[test]
    fn test_critical_recall_ignores_predicted_severity() {
        let exp = [
            rec("sql injection", Some(Severity::Critical)),
            rec("command injection", Some(Severity::Critical)),
            rec("verbose errors", Some(Severity::Low)),
        ];
        let preds = [rec("sql injection", Some(Severity::Low))];
        let pairs = match_issues(&preds, &exp);
        assert_eq!(critical_recall(&pairs, &exp), 0.5);
    }

    #[test]
    fn test_critical_recall_no_critical_expected() {
        let exp = [rec("verbose errors", Some(Severity::Low))];
        assert_eq!(critical_recall(&[], &exp), 1.0);
        assert_eq!(critical_recall(&[], &[]), 1.0);
    }

    #[test]
    fn test_fix_quality_points() {
        assert_eq!(fix_quality(&[]), 0.0);

        let plain = IssueRecord::from_line("Passwords stored as md5 hashes");
        assert_eq!(fix_quality(std::slice::from_ref(&plain)), 0.0);

        let verb = IssueRecord::from_line("Passwords hashed with md5, use bcrypt");
        assert!((fix_quality(&[verb]) - 0.3).abs() < 1e-9);

        let tick = IssueRecord::from_line("Passwords hashed with `md5`, use bcrypt");
        assert!((fix_quality(&[tick]) - 0.7).abs() < 1e-9);

        let long = format!("Replace string concatenation with `cursor.execute(q, params)` {}", "x".repeat(60));
        let full = IssueRecord::from_line(&long);
        assert!((fix_quality(&[full]) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_fix_quality_code_example_field() {
        let mut issue = IssueRecord::new("Weak hash", None).with_suggested_fix("Switch to bcrypt");
        issue.code_example = Some("bcrypt.hashpw(pw, bcrypt.gensalt())".to_string());
        assert!((fix_quality(&[issue]) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_explanation_quality() {
        assert_eq!(explanation_quality(&[]), 0.0);
        let good = IssueRecord::from_line(
            "SQL injection in authenticate_user allows attackers to bypass authentication",
        );
        let bare = IssueRecord::from_line("Magic number 42 here");
        assert!((explanation_quality(&[good.clone()]) - 1.0).abs() < 1e-9);
        assert!((explanation_quality(&[good, bare]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_compare() {
        let b = BucketScore::compare(0, 2);
        assert_eq!(b.recall, 0.0);
        assert_eq!(b.f1, 0.0);

        let b = BucketScore::compare(4, 2);
        assert_eq!(b.recall, 1.0);
        assert_eq!(b.precision, 0.5);

        let b = BucketScore::compare(0, 0);
        assert_eq!(b.f1, 0.0);
    }

    #[test]
    fn test_bucket_reported_values_use_neutral_defaults() {
        let b = BucketScore::compare(0, 0);
        assert_eq!(b.reported_precision(), 1.0);
        assert_eq!(b.reported_recall(), 1.0);

        let b = BucketScore::compare(0, 2);
        assert_eq!(b.reported_precision(), 1.0);
        assert_eq!(b.reported_recall(), 0.0);

        let b = BucketScore::compare(3, 0);
        assert_eq!(b.reported_precision(), 0.0);
        assert_eq!(b.reported_recall(), 1.0);
        assert_eq!(b.f1, 0.0);
    }

    #[test]
    fn test_bucket_severity_and_over_reporting() {
        assert_eq!(bucket_severity_score(0, 2, 0, 0), 0.75);
        assert_eq!(bucket_severity_score(2, 2, 1, 1), 1.0);
        assert_eq!(over_reporting_rate(0, 3), 0.0);
        assert_eq!(over_reporting_rate(4, 3), 0.25);
        assert_eq!(over_reporting_rate(2, 3), 0.0);
    }
}
