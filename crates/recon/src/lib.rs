//! `gradecheck-recon`: grade reconciliation engine.
//!
//! Compares the grades a candidate typed on the application form with the
//! grades transcribed from the uploaded transcripts, flags discrepancies,
//! checks the candidate's identity against the documents, and produces an
//! auditable verdict.
//!
//! Pure engine crate: receives pre-loaded records, returns a report.
//! No CLI or file IO. `ingest` parses strings, never paths.

pub mod cache;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod export;
pub mod identity;
pub mod ingest;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod resolve;
pub mod verdict;

pub use cache::{CacheKey, ReportCache};
pub use config::{DuplicatePolicy, ReconConfig};
pub use engine::{build_report, build_report_at, run};
pub use error::{ReconError, ReconResult};
pub use identity::verify_identity;
pub use matcher::similarity;
pub use model::{
    Anomaly, AnomalyKind, CandidateId, CandidateSubmission, ComparisonEntry, ConfigHash,
    DocumentIdentity, EntryStatus, GradedRecord, IdentityVerdict, PersonName, PriorityFinding,
    ReconStats, ReconciliationReport, Recommendation, RecordSource, Severity, Verdict,
    VerificationStatus,
};
pub use normalize::{normalize_subject, NormalizedSubject};
pub use resolve::{resolve, resolve_with_policy};
pub use verdict::{Candidature, VerificationState};
