use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::metric::{Metric, TrainingCase};
use crate::summary::{CaseResult, Summary};

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub profile: String,
    pub results: Vec<CaseResult>,
    pub summary: Summary,
}

/// Evaluate recorded predictions for each case file.
pub fn score_cases(config: &Config, paths: &[String]) -> Result<BatchReport> {
    if paths.is_empty() {
        bail!("No case files given");
    }

    let metric = Metric::from_config(&config.scoring);
    info!("Scoring {} case(s) with the {} profile", paths.len(), metric.profile());

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let file = super::ensure_file(path)?;
        let case = TrainingCase::load(file)?;
        let result = metric.evaluate(&case.example(), &case.prediction);
        if result.critical_recall < 1.0 {
            warn!("{}: missed critical issues (critical recall {:.2})", case.id, result.critical_recall);
        }
        info!("{}: overall {:.3}", case.id, result.overall_score);
        results.push(CaseResult {
            id: case.id,
            result,
        });
    }

    let summary = Summary::from_results(results.iter().map(|r| &r.result));
    Ok(BatchReport {
        profile: metric.profile().to_string(),
        results,
        summary,
    })
}

pub fn run(config: &Config, paths: &[String]) -> Result<()> {
    let report = score_cases(config, paths)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use std::path::Path;

    fn write_case(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_no_paths() {
        let result = score_cases(&Config::default(), &[]);
        assert!(result.unwrap_err().to_string().contains("No case files"));
    }

    #[test]
    fn test_missing_case_file() {
        let result = run(
            &Config::default(),
            &["/tmp/nonexistent-skillscore-case.json".to_string()],
        );
        assert!(result.unwrap_err().to_string().contains("File not found"));
    }

    #[test]
    fn test_directory_is_not_a_case_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap().to_string();
        let err = score_cases(&Config::default(), &[path]).unwrap_err();
        assert!(err.to_string().contains("Path is not a file"));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_case(dir.path(), "bad.json", "{ not json");
        let result = score_cases(&Config::default(), &[path]);
        assert!(result.unwrap_err().to_string().contains("invalid case file"));
    }

    #[test]
    fn test_score_matching_cases() {
        let dir = tempfile::TempDir::new().unwrap();
        let perfect = write_case(
            dir.path(),
            "perfect.json",
            r#"{
                "id": "sql-auth",
                "expected_issues": [
                    {"title": "SQL Injection", "description": "string concatenation in query", "severity": "Critical", "category": "security"}
                ],
                "prediction": {
                    "issues": [
                        {"title": "SQL Injection", "description": "string concatenation in query", "severity": "Critical", "category": "security"}
                    ]
                }
            }"#,
        );
        let silent = write_case(
            dir.path(),
            "silent.json",
            r#"{
                "id": "silent",
                "expected_issues": [
                    {"title": "Command Injection", "severity": "Critical", "category": "security"}
                ],
                "prediction": {"issues": "N/A"}
            }"#,
        );

        let mut config = Config::default();
        config.scoring.profile = Profile::Matching;
        let report = score_cases(&config, &[perfect, silent]).unwrap();

        assert_eq!(report.profile, "matching");
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].result.critical_recall, 1.0);
        assert_eq!(report.results[1].result.critical_recall, 0.0);
        assert_eq!(report.summary.cases, 2);
        assert!((report.summary.average_critical_recall - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_count_case_without_critical_issues() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_case(
            dir.path(),
            "high-only.json",
            r#"{
                "id": "high-only",
                "severity_distribution": {"High": 1},
                "prediction": {
                    "critical_issues": "N/A",
                    "high_issues": "Weak md5 password hashing in users.py allows offline cracking"
                }
            }"#,
        );

        let report = score_cases(&Config::default(), &[path]).unwrap();
        assert_eq!(report.profile, "counts");
        let result = &report.results[0].result;
        assert_eq!(result.critical_recall, 1.0);
        assert_eq!(result.recall, 1.0);
        assert_eq!(result.precision, 1.0);
    }
}
