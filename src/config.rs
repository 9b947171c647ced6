use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming a config file, used when no path is passed.
pub const CONFIG_ENV: &str = "SKILLSCORE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Which scoring algorithm the metric runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Fuzzy matching against full ground-truth issue records.
    Matching,
    /// Line counts against expected critical/high counts.
    #[default]
    Counts,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Matching => write!(f, "matching"),
            Profile::Counts => write!(f, "counts"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub matching: MatchingWeights,
    #[serde(default)]
    pub counts: CountWeights,
}

/// Weights for the matching profile. Defaults sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingWeights {
    pub precision: f64,
    pub recall: f64,
    /// Heaviest term: missing a critical issue is the costliest failure.
    pub critical_recall: f64,
    pub severity_accuracy: f64,
    pub fix_quality: f64,
}

impl Default for MatchingWeights {
    fn default() -> Self {
        Self {
            precision: 0.15,
            recall: 0.25,
            critical_recall: 0.30,
            severity_accuracy: 0.15,
            fix_quality: 0.15,
        }
    }
}

/// Weights for the count profile. The penalty is subtracted, the rest added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountWeights {
    pub issue_detection: f64,
    pub severity_accuracy: f64,
    pub explanation_quality: f64,
    pub fix_quality: f64,
    pub false_positive_penalty: f64,
}

impl Default for CountWeights {
    fn default() -> Self {
        Self {
            issue_detection: 0.35,
            severity_accuracy: 0.20,
            explanation_quality: 0.20,
            fix_quality: 0.15,
            false_positive_penalty: 0.10,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("weight '{name}' must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("weight '{name}' must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
}

fn check_weights(weights: &[(&'static str, f64)]) -> Result<f64, WeightsError> {
    let mut sum = 0.0;
    for &(name, value) in weights {
        if !value.is_finite() {
            return Err(WeightsError::NotFinite { name, value });
        }
        if value < 0.0 {
            return Err(WeightsError::Negative { name, value });
        }
        sum += value;
    }
    Ok(sum)
}

fn warn_if_unbalanced(profile: Profile, sum: f64) {
    if (sum - 1.0).abs() > 1e-6 {
        warn!("{} weights sum to {:.3}, not 1.0", profile, sum);
    }
}

impl MatchingWeights {
    pub fn validate(&self) -> Result<(), WeightsError> {
        let sum = check_weights(&[
            ("precision", self.precision),
            ("recall", self.recall),
            ("critical_recall", self.critical_recall),
            ("severity_accuracy", self.severity_accuracy),
            ("fix_quality", self.fix_quality),
        ])?;
        warn_if_unbalanced(Profile::Matching, sum);
        Ok(())
    }
}

impl CountWeights {
    pub fn validate(&self) -> Result<(), WeightsError> {
        let sum = check_weights(&[
            ("issue_detection", self.issue_detection),
            ("severity_accuracy", self.severity_accuracy),
            ("explanation_quality", self.explanation_quality),
            ("fix_quality", self.fix_quality),
            ("false_positive_penalty", self.false_positive_penalty),
        ])?;
        warn_if_unbalanced(Profile::Counts, sum);
        Ok(())
    }
}

impl Config {
    /// Load config from the working directory or user config directory
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        let explicit = path.or_else(|| env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty()));

        // An explicit path must exist; search paths may be absent
        if let Some(config_path) = explicit {
            debug!("Loading config from explicit path: {}", config_path);
            let config = Self::load_from_path(&config_path)
                .with_context(|| format!("failed to load config from {}", config_path))?;
            config.validate()?;
            return Ok(config);
        }

        if let Ok(config) = Self::load_from_path("skillscore.toml") {
            debug!("Loaded config from ./skillscore.toml");
            config.validate()?;
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("skillscore").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                config.validate()?;
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WeightsError> {
        self.scoring.matching.validate()?;
        self.scoring.counts.validate()
    }
}
