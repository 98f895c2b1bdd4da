use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ReconError;
use crate::matcher::DEFAULT_SIMILARITY_THRESHOLD;
use crate::model::ConfigHash;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Tunables for one reconciliation run. Every field has a default, so an
/// empty TOML document is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// A pair is the same subject only when similarity is strictly above this.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default)]
    pub duplicate_subjects: DuplicatePolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            duplicate_subjects: DuplicatePolicy::default(),
        }
    }
}

/// How extracted records whose subjects normalize identically are indexed.
///
/// `LastWriteWins` keeps one record per normalized subject (the last one seen,
/// at the position of the first). Two terms' grades for the same subject
/// collide under it. `PreferSameTerm` keys the index by subject, term and
/// academic year, and breaks equal-similarity ties in favour of the candidate
/// from the manual grade's own term and year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    LastWriteWins,
    PreferSameTerm,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastWriteWins => write!(f, "last_write_wins"),
            Self::PreferSameTerm => write!(f, "prefer_same_term"),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceConfig {
    /// Maximum accepted |manual - extracted| on the 0-20 scale.
    #[serde(default = "default_score_tolerance")]
    pub score: f64,
    /// Gaps strictly above this are HIGH severity.
    #[serde(default = "default_high_severity_gap")]
    pub high_severity_gap: f64,
    /// Matched extractions strictly below this confidence are flagged.
    #[serde(default = "default_min_extraction_confidence")]
    pub min_extraction_confidence: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            score: default_score_tolerance(),
            high_severity_gap: default_high_severity_gap(),
            min_extraction_confidence: default_min_extraction_confidence(),
        }
    }
}

fn default_score_tolerance() -> f64 {
    1.0
}

fn default_high_severity_gap() -> f64 {
    2.0
}

fn default_min_extraction_confidence() -> f64 {
    0.6
}

// ---------------------------------------------------------------------------
// Recommendation ladder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendationConfig {
    /// At most this many anomalies can still be sent to review.
    #[serde(default = "default_review_max_anomalies")]
    pub review_max_anomalies: usize,
    /// Review also requires a match rate strictly above this.
    #[serde(default = "default_review_min_match_rate")]
    pub review_min_match_rate: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            review_max_anomalies: default_review_max_anomalies(),
            review_min_match_rate: default_review_min_match_rate(),
        }
    }
}

fn default_review_max_anomalies() -> usize {
    2
}

fn default_review_min_match_rate() -> f64 {
    0.8
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default config with a different similarity threshold and score tolerance.
    pub fn with_parameters(similarity_threshold: f64, score_tolerance: f64) -> Self {
        let mut config = Self::default();
        config.matching.similarity_threshold = similarity_threshold;
        config.tolerance.score = score_tolerance;
        config
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        unit_interval("matching.similarity_threshold", self.matching.similarity_threshold)?;
        non_negative("tolerance.score", self.tolerance.score)?;
        non_negative("tolerance.high_severity_gap", self.tolerance.high_severity_gap)?;
        unit_interval(
            "tolerance.min_extraction_confidence",
            self.tolerance.min_extraction_confidence,
        )?;
        unit_interval(
            "recommendation.review_min_match_rate",
            self.recommendation.review_min_match_rate,
        )?;
        Ok(())
    }

    /// Stable hash of the effective parameters, used as a cache key component.
    pub fn fingerprint(&self) -> ConfigHash {
        // Struct field order is fixed, so the JSON form is canonical.
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let digest = Sha256::digest(canonical.as_bytes());
        ConfigHash(format!("{digest:x}"))
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), ReconError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ReconError::ConfigValidation(format!(
            "{field} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<(), ReconError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ReconError::ConfigValidation(format!(
            "{field} must be a finite, non-negative number, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
