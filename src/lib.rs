//! skillscore - Heuristic quality metric for code-review skill prompts
//!
//! Scores a model's code review against ground truth so a prompt optimizer
//! can use it as its objective. Free-text output is parsed into issue
//! records, fuzzily matched against expected issues, and scored on
//! detection, severity, explanation and fix quality. Every score is a pure
//! function of its inputs.

pub mod cli;
pub mod config;
pub mod evaluator;
pub mod issue;
pub mod matcher;
pub mod metric;
pub mod parser;
pub mod scoring;
pub mod summary;

pub use config::{Config, Profile};
pub use evaluator::{EvaluationInput, EvaluationResult, Evaluator};
pub use issue::{IssueRecord, Severity, TextSignals};
pub use matcher::MatchPair;
pub use metric::Metric;
