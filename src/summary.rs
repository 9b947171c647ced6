//! Aggregates over a batch of evaluated cases.

use serde::Serialize;

use crate::evaluator::EvaluationResult;

/// An improvement at least this large counts as significant.
pub const SIGNIFICANT_IMPROVEMENT: f64 = 0.10;

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub id: String,
    #[serde(flatten)]
    pub result: EvaluationResult,
}

/// Mean scores over a batch. All zero for an empty batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub cases: usize,
    pub average_precision: f64,
    pub average_recall: f64,
    pub average_f1: f64,
    pub average_critical_recall: f64,
    pub average_overall: f64,
}

impl Summary {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a EvaluationResult>,
    {
        let mut sum = Summary::default();
        for r in results {
            sum.cases += 1;
            sum.average_precision += r.precision;
            sum.average_recall += r.recall;
            sum.average_f1 += r.f1_score;
            sum.average_critical_recall += r.critical_recall;
            sum.average_overall += r.overall_score;
        }
        if sum.cases == 0 {
            return sum;
        }

        let n = sum.cases as f64;
        Summary {
            cases: sum.cases,
            average_precision: sum.average_precision / n,
            average_recall: sum.average_recall / n,
            average_f1: sum.average_f1 / n,
            average_critical_recall: sum.average_critical_recall / n,
            average_overall: sum.average_overall / n,
        }
    }

    fn metrics(&self) -> [(&'static str, f64); 5] {
        [
            ("precision", self.average_precision),
            ("recall", self.average_recall),
            ("f1_score", self.average_f1),
            ("critical_recall", self.average_critical_recall),
            ("overall_score", self.average_overall),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDelta {
    pub metric: &'static str,
    pub baseline: f64,
    pub optimized: f64,
    pub improvement: f64,
}

impl MetricDelta {
    pub fn is_significant(&self) -> bool {
        self.improvement >= SIGNIFICANT_IMPROVEMENT
    }
}

/// Per-metric change from a baseline batch to an optimized one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub deltas: Vec<MetricDelta>,
}

impl Comparison {
    pub fn between(baseline: &Summary, optimized: &Summary) -> Self {
        let deltas = baseline
            .metrics()
            .into_iter()
            .zip(optimized.metrics())
            .map(|((metric, before), (_, after))| MetricDelta {
                metric,
                baseline: before,
                optimized: after,
                improvement: after - before,
            })
            .collect();
        Self { deltas }
    }

    pub fn significant_improvements(&self) -> impl Iterator<Item = &MetricDelta> {
        self.deltas.iter().filter(|d| d.is_significant())
    }
}
