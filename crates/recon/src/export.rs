//! Flat, presentation-ready view of a report.
//!
//! This is the only place scores are rounded. Rendering to a spreadsheet or
//! PDF is the consumer's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Anomaly, AnomalyKind, ComparisonEntry, EntryStatus, ReconciliationReport, Severity, Verdict,
};

pub const EXPORT_SCHEMA_VERSION: &str = "1";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Who the report is about, as the admissions office knows them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub last_name: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub subject: String,
    pub term: String,
    pub academic_year: String,
    pub weight: u32,
    pub manual_score: f64,
    pub extracted_subject: Option<String>,
    pub extracted_score: Option<f64>,
    pub gap: Option<f64>,
    pub confidence: Option<f64>,
    pub status: EntryStatus,
    pub flagged: bool,
}

impl From<&ComparisonEntry> for ExportRow {
    fn from(entry: &ComparisonEntry) -> Self {
        Self {
            subject: entry.manual_subject.clone(),
            term: entry.manual_term.clone(),
            academic_year: entry.manual_academic_year.clone(),
            weight: entry.manual_weight,
            manual_score: round2(entry.manual_score),
            extracted_subject: entry.extracted_subject.clone(),
            extracted_score: entry.extracted_score.map(round2),
            gap: entry.score_delta.map(round2),
            confidence: entry.extracted_confidence.map(round2),
            status: entry.status,
            flagged: entry.is_anomaly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportAnomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub subject: String,
    pub severity: Severity,
    pub manual_score: Option<f64>,
    pub extracted_score: Option<f64>,
    pub gap: Option<f64>,
}

impl From<&Anomaly> for ExportAnomaly {
    fn from(anomaly: &Anomaly) -> Self {
        Self {
            kind: anomaly.kind,
            subject: anomaly.subject.clone(),
            severity: anomaly.severity,
            manual_score: anomaly.manual_score.map(round2),
            extracted_score: anomaly.extracted_score.map(round2),
            gap: anomaly.gap.map(round2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub manual_count: usize,
    pub matched_count: usize,
    pub match_rate_percent: f64,
    pub anomaly_count: usize,
    pub high_severity_count: usize,
    pub mean_extraction_confidence: f64,
    pub manual_average: Option<f64>,
    pub extracted_average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportIdentity {
    pub form_name: String,
    pub document_names: Vec<String>,
    pub usurpation_detected: bool,
    pub identity_confirmed: bool,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub schema_version: &'static str,
    pub candidate_id: String,
    pub profile: CandidateProfile,
    pub verdict: Verdict,
    pub identity: ExportIdentity,
    pub summary: ExportSummary,
    pub rows: Vec<ExportRow>,
    pub anomalies: Vec<ExportAnomaly>,
    pub engine_version: String,
    pub config_hash: String,
    pub computed_at: DateTime<Utc>,
    pub exported_at: DateTime<Utc>,
}

impl ExportDocument {
    pub fn from_report(report: &ReconciliationReport, profile: &CandidateProfile) -> Self {
        Self::from_report_at(report, profile, Utc::now())
    }

    pub fn from_report_at(
        report: &ReconciliationReport,
        profile: &CandidateProfile,
        exported_at: DateTime<Utc>,
    ) -> Self {
        let stats = &report.stats;
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            candidate_id: report.candidate_id.to_string(),
            profile: profile.clone(),
            verdict: report.verdict,
            identity: ExportIdentity {
                form_name: report.identity.form_name.to_string(),
                document_names: report.identity.document_names.iter().map(|d| d.to_string()).collect(),
                usurpation_detected: report.identity.usurpation_detected,
                identity_confirmed: report.identity.identity_confirmed,
                detail: report.identity.detail.clone(),
            },
            summary: ExportSummary {
                manual_count: stats.manual_count,
                matched_count: stats.matched_count,
                match_rate_percent: round2(stats.match_rate * 100.0),
                anomaly_count: stats.anomaly_count,
                high_severity_count: stats.severity_counts.high,
                mean_extraction_confidence: round2(stats.mean_extraction_confidence),
                manual_average: stats.manual_weighted_mean.map(round2),
                extracted_average: stats.extracted_weighted_mean.map(round2),
            },
            rows: report.entries.iter().map(ExportRow::from).collect(),
            anomalies: report.anomalies.iter().map(ExportAnomaly::from).collect(),
            engine_version: report.engine_version.clone(),
            config_hash: report.config_hash.to_string(),
            computed_at: report.computed_at,
            exported_at,
        }
    }
}
