//! Evaluation options: serde-backed, TOML-loadable, env-overridable.
//!
//! No persisted defaults live in the core; callers pass a `CompareOptions`
//! per evaluation. The TOML/env loaders exist for binaries and tests that
//! want the same configuration surface the rest of the stack uses.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::comparison::parse_generic_value_comparison;
use crate::error::ParseError;

pub const DEFAULT_MIN_WORD_COUNT: usize = 1;
pub const DEFAULT_GAP_ALLOWANCE: usize = 0;
pub const DEFAULT_MATCH_SCORE: f64 = 85.0;
pub const DEFAULT_KEEP_REMOVED: bool = false;
pub const DEFAULT_USE_PROCESSING_AS_REFERENCE: bool = true;
pub const DEFAULT_THRESHOLD: &str = ">= 3";

pub const DEFAULT_CONFIG_PATH: &str = "config/repeat.toml";

pub const ENV_CONFIG_PATH: &str = "REPEAT_CONFIG_PATH";
pub const ENV_MATCH_SCORE: &str = "REPEAT_MATCH_SCORE";
pub const ENV_THRESHOLD: &str = "REPEAT_THRESHOLD";

/// Per-evaluation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Minimum identifier length (in characters) for an activity to be
    /// eligible for comparison.
    pub min_word_count: usize,
    /// Number of non-matching activities tolerated inside an
    /// otherwise-continuing run.
    pub gap_allowance: usize,
    /// 0–100 similarity threshold: content is a repeat when its weighted
    /// sameness score is at or above this value.
    pub match_score: f64,
    /// Include activities already removed by moderation.
    pub keep_removed: bool,
    /// Narrow results to runs matching the activity under evaluation.
    pub use_processing_as_reference: bool,
    /// Comparison expression deciding how many repeats trigger, e.g. `>= 3`.
    pub threshold: String,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            min_word_count: DEFAULT_MIN_WORD_COUNT,
            gap_allowance: DEFAULT_GAP_ALLOWANCE,
            match_score: DEFAULT_MATCH_SCORE,
            keep_removed: DEFAULT_KEEP_REMOVED,
            use_processing_as_reference: DEFAULT_USE_PROCESSING_AS_REFERENCE,
            threshold: DEFAULT_THRESHOLD.to_string(),
        }
    }
}

impl CompareOptions {
    /// Load from the TOML file at `REPEAT_CONFIG_PATH` (default
    /// `config/repeat.toml`), then apply env overrides.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read repeat config at {}", path.display()))?;

        let mut opts = Self::from_toml_str(&content)?;

        if let Some(score) = parse_score_env(std::env::var(ENV_MATCH_SCORE).ok()) {
            opts.match_score = score;
        }
        if let Ok(threshold) = std::env::var(ENV_THRESHOLD) {
            if !threshold.trim().is_empty() {
                opts.threshold = threshold;
            }
        }

        Ok(opts.normalized())
    }

    /// Load from a TOML string.
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let opts: CompareOptions = toml::from_str(raw).context("invalid repeat config TOML")?;
        Ok(opts.normalized())
    }

    /// Parse the threshold eagerly so misconfiguration fails at load time
    /// instead of mid-evaluation.
    pub fn validate(&self) -> Result<(), ParseError> {
        parse_generic_value_comparison(&self.threshold).map(|_| ())
    }

    // Parameter hygiene: scores outside 0..=100 are meaningless.
    fn normalized(mut self) -> Self {
        self.match_score = self.match_score.clamp(0.0, 100.0);
        self
    }
}

// parse optional float env and clamp to 0..=100
fn parse_score_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .map(|v| v.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_values() {
        let opts = CompareOptions::default();
        assert_eq!(opts.min_word_count, 1);
        assert_eq!(opts.gap_allowance, 0);
        assert_eq!(opts.match_score, 85.0);
        assert!(!opts.keep_removed);
        assert!(opts.use_processing_as_reference);
        assert_eq!(opts.threshold, ">= 3");
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn toml_overrides_and_fills_defaults() {
        let opts = CompareOptions::from_toml_str(
            r#"
gap_allowance = 2
match_score = 90.0
threshold = "> 5"
"#,
        )
        .unwrap();
        assert_eq!(opts.gap_allowance, 2);
        assert_eq!(opts.match_score, 90.0);
        assert_eq!(opts.threshold, "> 5");
        // untouched fields keep their defaults
        assert_eq!(opts.min_word_count, 1);
        assert!(!opts.keep_removed);
    }

    #[test]
    fn match_score_is_clamped_on_load() {
        let opts = CompareOptions::from_toml_str("match_score = 250.0").unwrap();
        assert_eq!(opts.match_score, 100.0);
        let opts = CompareOptions::from_toml_str("match_score = -5.0").unwrap();
        assert_eq!(opts.match_score, 0.0);
    }

    #[test]
    fn validate_rejects_bad_threshold() {
        let opts = CompareOptions {
            threshold: "three or more".to_string(),
            ..CompareOptions::default()
        };
        assert_eq!(
            opts.validate().unwrap_err(),
            ParseError::InvalidComparison("three or more".to_string())
        );
    }

    #[test]
    fn score_env_parsing_clamps() {
        assert_eq!(parse_score_env(Some(" 88.5 ".into())), Some(88.5));
        assert_eq!(parse_score_env(Some("120".into())), Some(100.0));
        assert_eq!(parse_score_env(Some("abc".into())), None);
        assert_eq!(parse_score_env(None), None);
    }
}
