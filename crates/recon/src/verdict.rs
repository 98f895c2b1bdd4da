//! Verdict derivation and the per-candidature verification lifecycle.
//!
//! Identity fraud outranks every grade finding: the anomalies are still
//! computed and reported, but `priority_finding` says what comes first.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{ReconConfig, RecommendationConfig};
use crate::engine::build_report;
use crate::model::{
    CandidateId, CandidateSubmission, IdentityVerdict, PriorityFinding, ReconStats,
    ReconciliationReport, Recommendation, Verdict, VerificationStatus,
};

pub fn derive_verdict(
    identity: &IdentityVerdict,
    stats: &ReconStats,
    config: &RecommendationConfig,
) -> Verdict {
    if identity.usurpation_detected {
        return Verdict {
            status: VerificationStatus::Fraud,
            priority_finding: PriorityFinding::IdentityFraud,
            recommendation: Recommendation::Reject,
        };
    }

    if stats.anomaly_count == 0 {
        return Verdict {
            status: VerificationStatus::Clean,
            priority_finding: PriorityFinding::None,
            recommendation: Recommendation::Accept,
        };
    }

    let recommendation = if stats.anomaly_count <= config.review_max_anomalies
        && stats.match_rate > config.review_min_match_rate
    {
        Recommendation::Review
    } else {
        Recommendation::Reject
    };

    Verdict {
        status: VerificationStatus::WithDiscrepancies,
        priority_finding: PriorityFinding::GradeDiscrepancies,
        recommendation,
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationState {
    Unverified,
    VerifiedClean,
    VerifiedFraud,
    VerifiedWithDiscrepancies,
}

impl From<VerificationStatus> for VerificationState {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Clean => Self::VerifiedClean,
            VerificationStatus::Fraud => Self::VerifiedFraud,
            VerificationStatus::WithDiscrepancies => Self::VerifiedWithDiscrepancies,
        }
    }
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unverified => write!(f, "unverified"),
            Self::VerifiedClean => write!(f, "verified_clean"),
            Self::VerifiedFraud => write!(f, "verified_fraud"),
            Self::VerifiedWithDiscrepancies => write!(f, "verified_with_discrepancies"),
        }
    }
}

/// One candidature moving through verification. Terminal states are
/// re-enterable: `verify` always rebuilds and replaces the report.
#[derive(Debug, Clone)]
pub struct Candidature {
    candidate_id: CandidateId,
    state: VerificationState,
    report: Option<Arc<ReconciliationReport>>,
}

impl Candidature {
    pub fn new(candidate_id: CandidateId) -> Self {
        Self {
            candidate_id,
            state: VerificationState::Unverified,
            report: None,
        }
    }

    pub fn candidate_id(&self) -> &CandidateId {
        &self.candidate_id
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    pub fn report(&self) -> Option<&Arc<ReconciliationReport>> {
        self.report.as_ref()
    }

    pub fn verify(
        &mut self,
        submission: &CandidateSubmission,
        config: &ReconConfig,
    ) -> Arc<ReconciliationReport> {
        let report = Arc::new(build_report(submission, config));
        self.accept(Arc::clone(&report));
        report
    }

    /// Adopt an already-built report (e.g. served from a `ReportCache`).
    pub fn accept(&mut self, report: Arc<ReconciliationReport>) {
        let next = VerificationState::from(report.verdict.status);
        if self.state != next {
            log::info!("candidature {}: {} -> {}", self.candidate_id, self.state, next);
        }
        self.state = next;
        self.report = Some(report);
    }

    pub fn reset(&mut self) {
        self.state = VerificationState::Unverified;
        self.report = None;
    }
}
