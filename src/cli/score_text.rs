use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::evaluator::{EvaluationInput, EvaluationResult, Evaluator};

/// Score two text files with the count profile.
pub fn evaluate_files(
    config: &Config,
    critical_path: &str,
    high_path: &str,
    expected_critical: usize,
    expected_high: usize,
) -> Result<EvaluationResult> {
    let critical = super::read_input(critical_path)?;
    let high = super::read_input(high_path)?;

    let evaluator = Evaluator::from_config(&config.scoring);
    let result = evaluator.evaluate(&EvaluationInput::Counts {
        critical_text: Some(&critical),
        high_text: Some(&high),
        expected_critical,
        expected_high,
    });
    info!("overall score: {:.3}", result.overall_score);
    Ok(result)
}

pub fn run(
    config: &Config,
    critical_path: &str,
    high_path: &str,
    expected_critical: usize,
    expected_high: usize,
) -> Result<()> {
    let result = evaluate_files(config, critical_path, high_path, expected_critical, expected_high)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
