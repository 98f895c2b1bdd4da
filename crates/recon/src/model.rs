use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque candidature identifier supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex SHA-256 of a canonical config serialization. See `ReconConfig::fingerprint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    /// First 12 hex chars, enough for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordSource {
    /// Typed by the candidate on the application form.
    #[default]
    Manual,
    /// Produced by the transcription service from an uploaded transcript.
    Extracted,
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Extracted => write!(f, "extracted"),
        }
    }
}

/// A single grade, either declared or transcribed.
///
/// Invariants (enforced by `ingest::validate_record`, assumed by the engine):
/// `score` in [0, 20], `weight >= 1`, `confidence` in [0, 1] when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedRecord {
    pub subject: String,
    pub score: f64,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub academic_year: String,
    #[serde(default)]
    pub source: RecordSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
}

fn default_weight() -> u32 {
    1
}

impl GradedRecord {
    pub fn manual(
        subject: impl Into<String>,
        score: f64,
        weight: u32,
        term: impl Into<String>,
        academic_year: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            score,
            weight,
            term: term.into(),
            academic_year: academic_year.into(),
            source: RecordSource::Manual,
            confidence: None,
            source_document: None,
        }
    }

    pub fn extracted(
        subject: impl Into<String>,
        score: f64,
        weight: u32,
        term: impl Into<String>,
        academic_year: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            subject: subject.into(),
            score,
            weight,
            term: term.into(),
            academic_year: academic_year.into(),
            source: RecordSource::Extracted,
            confidence: Some(confidence),
            source_document: None,
        }
    }

    pub fn with_source_document(mut self, document: impl Into<String>) -> Self {
        self.source_document = Some(document.into());
        self
    }
}

/// Family name + given name as printed on a form or transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub last: String,
    pub first: String,
}

impl PersonName {
    pub fn new(last: impl Into<String>, first: impl Into<String>) -> Self {
        Self {
            last: last.into(),
            first: first.into(),
        }
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.last)
    }
}

/// A name read off one supporting document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIdentity {
    #[serde(flatten)]
    pub name: PersonName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
}

impl DocumentIdentity {
    pub fn new(last: impl Into<String>, first: impl Into<String>) -> Self {
        Self {
            name: PersonName::new(last, first),
            source_document: None,
        }
    }

    pub fn from_document(mut self, document: impl Into<String>) -> Self {
        self.source_document = Some(document.into());
        self
    }
}

impl fmt::Display for DocumentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_document {
            Some(doc) => write!(f, "{} ({doc})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Everything the engine needs for one candidature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSubmission {
    pub candidate_id: CandidateId,
    pub form_identity: PersonName,
    #[serde(default)]
    pub document_identities: Vec<DocumentIdentity>,
    /// Overall average the candidate declared on the form, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_average: Option<f64>,
    #[serde(default)]
    pub manual: Vec<GradedRecord>,
    #[serde(default)]
    pub extracted: Vec<GradedRecord>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Matched,
    UnmatchedManual,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::UnmatchedManual => write!(f, "unmatched_manual"),
        }
    }
}

/// One row of the comparison table: a manual grade and its best extracted match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub manual_subject: String,
    pub manual_score: f64,
    pub manual_weight: u32,
    pub manual_term: String,
    pub manual_academic_year: String,
    pub extracted_subject: Option<String>,
    pub extracted_score: Option<f64>,
    pub extracted_weight: Option<u32>,
    pub extracted_confidence: Option<f64>,
    pub extracted_document: Option<String>,
    pub similarity: Option<f64>,
    /// `|manual_score - extracted_score|`, filled by the classifier.
    pub score_delta: Option<f64>,
    pub status: EntryStatus,
    pub is_anomaly: bool,
}

impl ComparisonEntry {
    pub(crate) fn unmatched(manual: &GradedRecord) -> Self {
        Self {
            manual_subject: manual.subject.clone(),
            manual_score: manual.score,
            manual_weight: manual.weight,
            manual_term: manual.term.clone(),
            manual_academic_year: manual.academic_year.clone(),
            extracted_subject: None,
            extracted_score: None,
            extracted_weight: None,
            extracted_confidence: None,
            extracted_document: None,
            similarity: None,
            score_delta: None,
            status: EntryStatus::UnmatchedManual,
            is_anomaly: false,
        }
    }

    pub(crate) fn matched(manual: &GradedRecord, extracted: &GradedRecord, similarity: f64) -> Self {
        Self {
            extracted_subject: Some(extracted.subject.clone()),
            extracted_score: Some(extracted.score),
            extracted_weight: Some(extracted.weight),
            extracted_confidence: extracted.confidence,
            extracted_document: extracted.source_document.clone(),
            similarity: Some(similarity),
            status: EntryStatus::Matched,
            ..Self::unmatched(manual)
        }
    }
}

/// Output of the pair resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Exactly one entry per manual record, in manual order.
    pub entries: Vec<ComparisonEntry>,
    /// Extracted records no manual subject matched, in extracted order.
    pub extra_extracted: Vec<GradedRecord>,
}

// ---------------------------------------------------------------------------
// Anomalies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    LargeScoreGap,
    ManualNotFound,
    ExtraExtracted,
    LowExtractionConfidence,
    InconsistentAverage,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LargeScoreGap => write!(f, "large_score_gap"),
            Self::ManualNotFound => write!(f, "manual_not_found"),
            Self::ExtraExtracted => write!(f, "extra_extracted"),
            Self::LowExtractionConfidence => write!(f, "low_extraction_confidence"),
            Self::InconsistentAverage => write!(f, "inconsistent_average"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub severity: Severity,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityVerdict {
    pub form_name: PersonName,
    pub document_names: Vec<DocumentIdentity>,
    pub usurpation_detected: bool,
    /// No usurpation and at least one document name agreed with the form.
    pub identity_confirmed: bool,
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Clean,
    Fraud,
    WithDiscrepancies,
}

/// The finding the review UI must surface first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityFinding {
    IdentityFraud,
    GradeDiscrepancies,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Accept,
    Review,
    Reject,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Review => write!(f, "review"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerificationStatus,
    pub priority_finding: PriorityFinding,
    pub recommendation: Recommendation,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconStats {
    pub manual_count: usize,
    pub extracted_count: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub extra_extracted_count: usize,
    pub match_rate: f64,
    pub anomaly_count: usize,
    pub severity_counts: SeverityCounts,
    pub mean_extraction_confidence: f64,
    pub manual_weighted_mean: Option<f64>,
    pub extracted_weighted_mean: Option<f64>,
    pub tolerance_used: f64,
    pub threshold_used: f64,
}

/// Immutable result of one reconciliation run. Rebuild, never mutate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub candidate_id: CandidateId,
    pub entries: Vec<ComparisonEntry>,
    pub anomalies: Vec<Anomaly>,
    pub identity: IdentityVerdict,
    pub stats: ReconStats,
    pub verdict: Verdict,
    pub config_hash: ConfigHash,
    pub engine_version: String,
    pub computed_at: DateTime<Utc>,
}

impl ReconciliationReport {
    /// Anomalies of one kind, in report order.
    pub fn anomalies_of(&self, kind: AnomalyKind) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.iter().filter(move |a| a.kind == kind)
    }

    pub fn has_high_severity(&self) -> bool {
        self.stats.severity_counts.high > 0
    }
}
