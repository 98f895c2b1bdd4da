use crate::classify::weighted_mean;
use crate::config::ReconConfig;
use crate::model::{Anomaly, ComparisonEntry, EntryStatus, GradedRecord, ReconStats, Severity, SeverityCounts};

/// Compute summary statistics from classified entries and collected anomalies.
pub fn compute_stats(
    manual: &[GradedRecord],
    extracted: &[GradedRecord],
    entries: &[ComparisonEntry],
    extra_extracted: usize,
    anomalies: &[Anomaly],
    config: &ReconConfig,
) -> ReconStats {
    let matched: Vec<&ComparisonEntry> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Matched)
        .collect();
    let matched_count = matched.len();

    // max(1, n) keeps an empty form at a 0 match rate instead of NaN.
    let match_rate = matched_count as f64 / manual.len().max(1) as f64;

    let confidences: Vec<f64> = matched.iter().filter_map(|e| e.extracted_confidence).collect();
    let mean_extraction_confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    let mut severity_counts = SeverityCounts::default();
    for anomaly in anomalies {
        match anomaly.severity {
            Severity::Low => severity_counts.low += 1,
            Severity::Medium => severity_counts.medium += 1,
            Severity::High => severity_counts.high += 1,
        }
    }

    ReconStats {
        manual_count: manual.len(),
        extracted_count: extracted.len(),
        matched_count,
        unmatched_count: entries.len() - matched_count,
        extra_extracted_count: extra_extracted,
        match_rate,
        anomaly_count: anomalies.len(),
        severity_counts,
        mean_extraction_confidence,
        manual_weighted_mean: weighted_mean(manual),
        extracted_weighted_mean: weighted_mean(extracted),
        tolerance_used: config.tolerance.score,
        threshold_used: config.matching.similarity_threshold,
    }
}
