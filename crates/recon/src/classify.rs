use crate::config::ToleranceConfig;
use crate::model::{Anomaly, AnomalyKind, ComparisonEntry, EntryStatus, GradedRecord, Severity};

/// Severity of a score gap that already exceeds tolerance.
fn gap_severity(gap: f64, high_severity_gap: f64) -> Severity {
    if gap > high_severity_gap {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Classify one comparison entry. First matching rule wins, so at most one
/// anomaly comes out per entry.
///
/// 1. Unmatched manual grade: `MANUAL_NOT_FOUND`, medium.
/// 2. Matched with `|manual - extracted| > tolerance`: `LARGE_SCORE_GAP`,
///    high when the gap exceeds `high_severity_gap`, medium otherwise.
///
/// Scores are compared unrounded.
pub fn classify_entry(
    mut entry: ComparisonEntry,
    tolerance: &ToleranceConfig,
) -> (ComparisonEntry, Option<Anomaly>) {
    let extracted_score = match (entry.status, entry.extracted_score) {
        (EntryStatus::Matched, Some(score)) => score,
        _ => {
            entry.status = EntryStatus::UnmatchedManual;
            entry.is_anomaly = true;
            let anomaly = Anomaly {
                kind: AnomalyKind::ManualNotFound,
                subject: entry.manual_subject.clone(),
                manual_score: Some(entry.manual_score),
                extracted_score: None,
                gap: None,
                confidence: None,
                severity: Severity::Medium,
            };
            return (entry, Some(anomaly));
        }
    };

    let gap = (entry.manual_score - extracted_score).abs();
    entry.score_delta = Some(gap);

    if gap > tolerance.score {
        entry.is_anomaly = true;
        let anomaly = Anomaly {
            kind: AnomalyKind::LargeScoreGap,
            subject: entry.manual_subject.clone(),
            manual_score: Some(entry.manual_score),
            extracted_score: Some(extracted_score),
            gap: Some(gap),
            confidence: entry.extracted_confidence,
            severity: gap_severity(gap, tolerance.high_severity_gap),
        };
        (entry, Some(anomaly))
    } else {
        entry.is_anomaly = false;
        (entry, None)
    }
}

/// An extracted grade nobody declared. Always medium, whatever the tolerance.
pub fn classify_extra(record: &GradedRecord) -> Anomaly {
    Anomaly {
        kind: AnomalyKind::ExtraExtracted,
        subject: record.subject.clone(),
        manual_score: None,
        extracted_score: Some(record.score),
        gap: None,
        confidence: record.confidence,
        severity: Severity::Medium,
    }
}

/// Matched entries whose transcription confidence is under the configured floor.
pub fn classify_confidence(entry: &ComparisonEntry, tolerance: &ToleranceConfig) -> Option<Anomaly> {
    if entry.status != EntryStatus::Matched {
        return None;
    }
    let confidence = entry.extracted_confidence?;
    if confidence >= tolerance.min_extraction_confidence {
        return None;
    }
    Some(Anomaly {
        kind: AnomalyKind::LowExtractionConfidence,
        subject: entry.manual_subject.clone(),
        manual_score: Some(entry.manual_score),
        extracted_score: entry.extracted_score,
        gap: None,
        confidence: Some(confidence),
        severity: Severity::Low,
    })
}

/// Weight-averaged score, `None` for an empty list.
pub fn weighted_mean(records: &[GradedRecord]) -> Option<f64> {
    let total_weight: u64 = records.iter().map(|r| u64::from(r.weight)).sum();
    if total_weight == 0 {
        return None;
    }
    let weighted: f64 = records.iter().map(|r| r.score * f64::from(r.weight)).sum();
    Some(weighted / total_weight as f64)
}

/// Compare the average declared on the form with the transcripts' weighted average.
pub fn check_declared_average(
    declared_average: Option<f64>,
    extracted: &[GradedRecord],
    tolerance: &ToleranceConfig,
) -> Option<Anomaly> {
    let declared = declared_average?;
    let actual = weighted_mean(extracted)?;
    let gap = (declared - actual).abs();
    if gap <= tolerance.score {
        return None;
    }
    Some(Anomaly {
        kind: AnomalyKind::InconsistentAverage,
        subject: "overall average".into(),
        manual_score: Some(declared),
        extracted_score: Some(actual),
        gap: Some(gap),
        confidence: None,
        severity: Severity::High,
    })
}
