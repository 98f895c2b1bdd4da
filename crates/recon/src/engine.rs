use chrono::{DateTime, Utc};

use crate::classify::{check_declared_average, classify_confidence, classify_entry, classify_extra};
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::evidence::compute_stats;
use crate::identity::verify_identity;
use crate::ingest::validate_submission;
use crate::model::{CandidateSubmission, ComparisonEntry, ReconciliationReport};
use crate::resolve::resolve_with_policy;
use crate::verdict::derive_verdict;

/// Validate config and records, then build the report.
///
/// This is the checked entry point for callers that did not run the records
/// through `ingest` themselves.
pub fn run(
    config: &ReconConfig,
    submission: &CandidateSubmission,
) -> Result<ReconciliationReport, ReconError> {
    config.validate()?;
    validate_submission(submission)?;
    Ok(build_report(submission, config))
}

/// Build a report from already-validated input. Never fails: every degenerate
/// case (no manual grades, no transcripts, no document names) is report content.
pub fn build_report(submission: &CandidateSubmission, config: &ReconConfig) -> ReconciliationReport {
    build_report_at(submission, config, Utc::now())
}

/// `build_report` with an explicit timestamp.
pub fn build_report_at(
    submission: &CandidateSubmission,
    config: &ReconConfig,
    computed_at: DateTime<Utc>,
) -> ReconciliationReport {
    let identity = verify_identity(&submission.form_identity, &submission.document_identities);

    let resolution = resolve_with_policy(
        &submission.manual,
        &submission.extracted,
        config.matching.similarity_threshold,
        config.matching.duplicate_subjects,
    );

    let mut anomalies = Vec::new();

    let entries: Vec<ComparisonEntry> = resolution
        .entries
        .into_iter()
        .map(|entry| {
            let (entry, anomaly) = classify_entry(entry, &config.tolerance);
            anomalies.extend(anomaly);
            entry
        })
        .collect();

    anomalies.extend(resolution.extra_extracted.iter().map(classify_extra));

    anomalies.extend(
        entries
            .iter()
            .filter_map(|entry| classify_confidence(entry, &config.tolerance)),
    );

    anomalies.extend(check_declared_average(
        submission.declared_average,
        &submission.extracted,
        &config.tolerance,
    ));

    for anomaly in &anomalies {
        log::debug!("{} on '{}' ({})", anomaly.kind, anomaly.subject, anomaly.severity);
    }

    let stats = compute_stats(
        &submission.manual,
        &submission.extracted,
        &entries,
        resolution.extra_extracted.len(),
        &anomalies,
        config,
    );

    let verdict = derive_verdict(&identity, &stats, &config.recommendation);

    log::info!(
        "candidate {}: {}/{} matched ({:.0}%), {} anomalies, verdict {:?}",
        submission.candidate_id,
        stats.matched_count,
        stats.manual_count,
        stats.match_rate * 100.0,
        stats.anomaly_count,
        verdict.status,
    );

    ReconciliationReport {
        candidate_id: submission.candidate_id.clone(),
        entries,
        anomalies,
        identity,
        stats,
        verdict,
        config_hash: config.fingerprint(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        computed_at,
    }
}
