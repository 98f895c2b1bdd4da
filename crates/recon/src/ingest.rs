//! Boundary between collaborators and the engine.
//!
//! Everything here returns `Result`: malformed records are rejected before
//! they reach the resolver, so the engine itself can stay infallible.

use crate::error::ReconError;
use crate::model::{CandidateSubmission, GradedRecord, RecordSource};

/// Confidence assumed for transcribed grades the transcription service did not score.
pub const DEFAULT_EXTRACTION_CONFIDENCE: f64 = 0.8;

pub const MAX_SCORE: f64 = 20.0;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check one record against the `GradedRecord` invariants.
pub fn validate_record(record: &GradedRecord) -> Result<(), String> {
    if !record.score.is_finite() || !(0.0..=MAX_SCORE).contains(&record.score) {
        return Err(format!("score {} is outside [0, {MAX_SCORE}]", record.score));
    }
    if record.weight == 0 {
        return Err("weight must be at least 1".into());
    }
    if let Some(confidence) = record.confidence {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(format!("confidence {confidence} is outside [0, 1]"));
        }
    }
    if record.source == RecordSource::Manual && record.subject.trim().is_empty() {
        return Err("subject is empty".into());
    }
    Ok(())
}

/// Validate a list, reporting the first offending record by position.
pub fn validate_records(origin: RecordSource, records: &[GradedRecord]) -> Result<(), ReconError> {
    for (index, record) in records.iter().enumerate() {
        validate_record(record).map_err(|reason| ReconError::InvalidRecord {
            origin,
            index,
            subject: record.subject.clone(),
            reason,
        })?;
    }
    Ok(())
}

pub fn validate_submission(submission: &CandidateSubmission) -> Result<(), ReconError> {
    validate_records(RecordSource::Manual, &submission.manual)?;
    validate_records(RecordSource::Extracted, &submission.extracted)?;
    if let Some(avg) = submission.declared_average {
        if !avg.is_finite() || !(0.0..=MAX_SCORE).contains(&avg) {
            return Err(ReconError::SubmissionParse(format!(
                "declared_average {avg} is outside [0, {MAX_SCORE}]"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse a score cell. Accepts a decimal comma ("13,5").
fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

/// Load grades from a header-addressed CSV document.
///
/// Required columns: `subject`, `score`, `term`, `academic_year`.
/// Optional: `weight` (empty or absent means 1), `confidence`,
/// `source_document`. Column order does not matter. Every row is validated
/// before the list is returned.
pub fn load_csv_records(origin: RecordSource, csv_data: &str) -> Result<Vec<GradedRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| -> Result<usize, ReconError> {
        position(name).ok_or_else(|| ReconError::MissingColumn {
            origin,
            column: name.into(),
        })
    };

    let subject_idx = required("subject")?;
    let score_idx = required("score")?;
    let term_idx = required("term")?;
    let year_idx = required("academic_year")?;
    let weight_idx = position("weight");
    let confidence_idx = position("confidence");
    let document_idx = position("source_document");

    let mut records = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| ReconError::Csv(e.to_string()))?;
        let row_no = i + 1;
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let score_str = cell(score_idx);
        let score = parse_score(score_str).ok_or_else(|| ReconError::ScoreParse {
            origin,
            row: row_no,
            value: score_str.into(),
        })?;

        let weight = match weight_idx.map(cell) {
            None | Some("") => 1,
            Some(raw) => raw.parse::<u32>().map_err(|_| ReconError::WeightParse {
                origin,
                row: row_no,
                value: raw.into(),
            })?,
        };

        let confidence = match (origin, confidence_idx.map(cell)) {
            (RecordSource::Manual, _) => None,
            (RecordSource::Extracted, None | Some("")) => Some(DEFAULT_EXTRACTION_CONFIDENCE),
            (RecordSource::Extracted, Some(raw)) => {
                Some(parse_score(raw).ok_or_else(|| ReconError::ConfidenceParse {
                    origin,
                    row: row_no,
                    value: raw.into(),
                })?)
            }
        };

        let source_document = document_idx
            .map(cell)
            .filter(|doc| !doc.is_empty())
            .map(str::to_string);

        records.push(GradedRecord {
            subject: cell(subject_idx).to_string(),
            score,
            weight,
            term: cell(term_idx).to_string(),
            academic_year: cell(year_idx).to_string(),
            source: origin,
            confidence,
            source_document,
        });
    }

    validate_records(origin, &records)?;
    log::debug!("loaded {} {origin} grade(s) from CSV", records.len());
    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Decode a submission document. The list a record sits in decides its
/// source, whatever the record itself says.
pub fn parse_submission(json: &str) -> Result<CandidateSubmission, ReconError> {
    let mut submission: CandidateSubmission =
        serde_json::from_str(json).map_err(|e| ReconError::SubmissionParse(e.to_string()))?;

    for record in &mut submission.manual {
        record.source = RecordSource::Manual;
        record.confidence = None;
    }
    for record in &mut submission.extracted {
        record.source = RecordSource::Extracted;
        record.confidence.get_or_insert(DEFAULT_EXTRACTION_CONFIDENCE);
    }

    validate_submission(&submission)?;
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_bounds() {
        assert!(validate_record(&GradedRecord::manual("Maths", 0.0, 1, "T1", "2024")).is_ok());
        assert!(validate_record(&GradedRecord::manual("Maths", 20.0, 1, "T1", "2024")).is_ok());
        assert!(validate_record(&GradedRecord::manual("Maths", 20.5, 1, "T1", "2024")).is_err());
        assert!(validate_record(&GradedRecord::manual("Maths", -1.0, 1, "T1", "2024")).is_err());
        assert!(validate_record(&GradedRecord::manual("Maths", f64::NAN, 1, "T1", "2024")).is_err());
        assert!(validate_record(&GradedRecord::manual("Maths", 12.0, 0, "T1", "2024")).is_err());
        assert!(validate_record(&GradedRecord::manual("  ", 12.0, 1, "T1", "2024")).is_err());
        assert!(
            validate_record(&GradedRecord::extracted("Maths", 12.0, 1, "T1", "2024", 1.2)).is_err()
        );
    }

    #[test]
    fn blank_extracted_subject_is_allowed() {
        let record = GradedRecord::extracted("", 12.0, 1, "T1", "2024", 0.9);
        assert!(validate_record(&record).is_ok());
    }

    #[test]
    fn first_invalid_record_reported() {
        let records = vec![
            GradedRecord::manual("Maths", 12.0, 1, "T1", "2024"),
            GradedRecord::manual("Anglais", 25.0, 1, "T1", "2024"),
            GradedRecord::manual("", 12.0, 1, "T1", "2024"),
        ];
        let err = validate_records(RecordSource::Manual, &records).unwrap_err();
        match err {
            ReconError::InvalidRecord { index, subject, .. } => {
                assert_eq!(index, 1);
                assert_eq!(subject, "Anglais");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_manual_csv() {
        let csv = "subject,score,weight,term,academic_year\n\
                   Mathématiques,\"13,5\",3,T1,2024\n\
                   Anglais,16,,T1,2024\n";
        let records = load_csv_records(RecordSource::Manual, csv).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subject, "Mathématiques");
        assert_eq!(records[0].score, 13.5);
        assert_eq!(records[0].weight, 3);
        assert_eq!(records[1].weight, 1);
        assert!(records.iter().all(|r| r.source == RecordSource::Manual));
        assert!(records.iter().all(|r| r.confidence.is_none()));
    }

    #[test]
    fn load_extracted_csv_defaults_confidence() {
        let csv = "academic_year,term,subject,score,confidence,source_document\n\
                   2024,T1,Maths,14,0.92,bulletin_t1.pdf\n\
                   2024,T1,Anglais,11,,bulletin_t1.pdf\n";
        let records = load_csv_records(RecordSource::Extracted, csv).unwrap();
        assert_eq!(records[0].confidence, Some(0.92));
        assert_eq!(records[1].confidence, Some(DEFAULT_EXTRACTION_CONFIDENCE));
        assert_eq!(records[0].source_document.as_deref(), Some("bulletin_t1.pdf"));
    }

    #[test]
    fn missing_required_column() {
        let err = load_csv_records(RecordSource::Manual, "subject,score,term\nMaths,12,T1\n").unwrap_err();
        match err {
            ReconError::MissingColumn { column, origin } => {
                assert_eq!(column, "academic_year");
                assert_eq!(origin, RecordSource::Manual);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparseable_cells() {
        let header = "subject,score,weight,term,academic_year\n";
        let err = load_csv_records(RecordSource::Manual, &format!("{header}Maths,abc,1,T1,2024\n"))
            .unwrap_err();
        assert!(matches!(err, ReconError::ScoreParse { row: 1, .. }));

        let err = load_csv_records(RecordSource::Manual, &format!("{header}Maths,12,-2,T1,2024\n"))
            .unwrap_err();
        assert!(matches!(err, ReconError::WeightParse { row: 1, .. }));
    }

    #[test]
    fn csv_rows_are_validated() {
        let csv = "subject,score,term,academic_year\nMaths,21,T1,2024\n";
        let err = load_csv_records(RecordSource::Manual, csv).unwrap_err();
        assert!(matches!(err, ReconError::InvalidRecord { index: 0, .. }));
    }

    #[test]
    fn submission_sources_forced_by_list() {
        let json = r#"{
            "candidate_id": "CAND-7",
            "form_identity": {"last": "Dupont", "first": "Marie"},
            "document_identities": [{"last": "Dupont", "first": "Marie", "source_document": "b.pdf"}],
            "manual": [{"subject": "Maths", "score": 14, "weight": 2, "source": "EXTRACTED", "confidence": 0.4}],
            "extracted": [{"subject": "Mathematiques", "score": 14, "weight": 2}]
        }"#;
        let submission = parse_submission(json).unwrap();
        assert_eq!(submission.candidate_id.as_str(), "CAND-7");
        assert_eq!(submission.manual[0].source, RecordSource::Manual);
        assert_eq!(submission.manual[0].confidence, None);
        assert_eq!(submission.extracted[0].source, RecordSource::Extracted);
        assert_eq!(submission.extracted[0].confidence, Some(DEFAULT_EXTRACTION_CONFIDENCE));
        assert_eq!(
            submission.document_identities[0].source_document.as_deref(),
            Some("b.pdf")
        );
    }

    #[test]
    fn submission_rejects_malformed_json_and_records() {
        assert!(matches!(parse_submission("{"), Err(ReconError::SubmissionParse(_))));

        let json = r#"{
            "candidate_id": "CAND-7",
            "form_identity": {"last": "Dupont", "first": "Marie"},
            "extracted": [{"subject": "Maths", "score": 14, "weight": 0}]
        }"#;
        assert!(matches!(
            parse_submission(json),
            Err(ReconError::InvalidRecord { origin: RecordSource::Extracted, index: 0, .. })
        ));
    }
}
