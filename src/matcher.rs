//! Fuzzy pairing of predicted issues against expected issues.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use crate::issue::IssueRecord;

/// A pair scores as a match only when its similarity is strictly above this.
pub const MATCH_THRESHOLD: f64 = 0.6;

const TEXT_WEIGHT: f64 = 0.6;
const CATEGORY_WEIGHT: f64 = 0.2;
const LOCATION_WEIGHT: f64 = 0.2;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Outcome for one issue after matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPair<'a> {
    /// Both sides present, similarity above [`MATCH_THRESHOLD`].
    Matched {
        predicted: &'a IssueRecord,
        expected: &'a IssueRecord,
        score: f64,
    },
    /// Expected issue nobody reported (false negative).
    Missed { expected: &'a IssueRecord },
    /// Reported issue with no expected counterpart (false positive).
    Spurious { predicted: &'a IssueRecord },
}

impl<'a> MatchPair<'a> {
    pub fn predicted(&self) -> Option<&'a IssueRecord> {
        match *self {
            MatchPair::Matched { predicted, .. } | MatchPair::Spurious { predicted } => {
                Some(predicted)
            }
            MatchPair::Missed { .. } => None,
        }
    }

    pub fn expected(&self) -> Option<&'a IssueRecord> {
        match *self {
            MatchPair::Matched { expected, .. } | MatchPair::Missed { expected } => Some(expected),
            MatchPair::Spurious { .. } => None,
        }
    }

    pub fn score(&self) -> f64 {
        match *self {
            MatchPair::Matched { score, .. } => score,
            _ => 0.0,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchPair::Matched { .. })
    }
}

/// Whether a similarity score clears the match threshold.
pub fn exceeds_threshold(score: f64) -> bool {
    score > MATCH_THRESHOLD
}

fn word_set(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// |a ∩ b| / |a ∪ b|, or `None` when either side is empty.
fn jaccard<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let overlap = a.intersection(b).count();
    let total = a.union(b).count();
    Some(overlap as f64 / total as f64)
}

/// Similarity in [0, 1]: 0.6 word overlap, 0.2 category, 0.2 location overlap.
///
/// Two records that both lack a category count as a category match.
pub fn issue_similarity(predicted: &IssueRecord, expected: &IssueRecord) -> f64 {
    let mut score = 0.0;

    if let Some(overlap) = jaccard(
        &word_set(&predicted.text()),
        &word_set(&expected.text()),
    ) {
        score += TEXT_WEIGHT * overlap;
    }

    if predicted.category == expected.category {
        score += CATEGORY_WEIGHT;
    }

    let pred_locs: HashSet<&str> = predicted.locations.iter().map(String::as_str).collect();
    let exp_locs: HashSet<&str> = expected.locations.iter().map(String::as_str).collect();
    if let Some(overlap) = jaccard(&pred_locs, &exp_locs) {
        score += LOCATION_WEIGHT * overlap;
    }

    score.min(1.0)
}

/// Greedy matching, expected issues first, in input order.
///
/// Each expected issue takes the unused prediction with the highest
/// similarity, if that similarity clears the threshold. Ties go to the
/// earlier prediction. Output order: matches, then misses, then spurious
/// predictions, each in input order.
pub fn match_issues<'a>(
    predicted: &'a [IssueRecord],
    expected: &'a [IssueRecord],
) -> Vec<MatchPair<'a>> {
    let mut pairs = Vec::with_capacity(predicted.len() + expected.len());
    let mut used_predicted: HashSet<usize> = HashSet::new();
    let mut used_expected: HashSet<usize> = HashSet::new();

    for (i, exp) in expected.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;

        for (j, pred) in predicted.iter().enumerate() {
            if used_predicted.contains(&j) {
                continue;
            }
            let score = issue_similarity(pred, exp);
            let better = best.is_none_or(|(_, best_score)| score > best_score);
            if better && exceeds_threshold(score) {
                best = Some((j, score));
            }
        }

        if let Some((j, score)) = best {
            pairs.push(MatchPair::Matched {
                predicted: &predicted[j],
                expected: exp,
                score,
            });
            used_predicted.insert(j);
            used_expected.insert(i);
        }
    }

    let matched = pairs.len();

    pairs.extend(
        expected
            .iter()
            .enumerate()
            .filter(|(i, _)| !used_expected.contains(i))
            .map(|(_, expected)| MatchPair::Missed { expected }),
    );
    pairs.extend(
        predicted
            .iter()
            .enumerate()
            .filter(|(j, _)| !used_predicted.contains(j))
            .map(|(_, predicted)| MatchPair::Spurious { predicted }),
    );

    debug!(
        "matched {} of {} expected issues ({} predicted, {} spurious)",
        matched,
        expected.len(),
        predicted.len(),
        predicted.len() - matched
    );

    pairs
}
