//! `gradecheck check`: reconcile one candidature.

use std::path::PathBuf;

use clap::Args;

use gradecheck_recon::export::{CandidateProfile, ExportDocument};
use gradecheck_recon::ingest::{load_csv_records, parse_submission, validate_submission};
use gradecheck_recon::model::{
    CandidateId, CandidateSubmission, DocumentIdentity, PersonName, ReconciliationReport,
    RecordSource, VerificationStatus,
};
use gradecheck_recon::{build_report, ReconError};

use crate::config::load_config;
use crate::exit_codes::{
    EXIT_CHECK_DISCREPANCIES, EXIT_CHECK_FRAUD, EXIT_CHECK_INVALID_CONFIG,
    EXIT_CHECK_INVALID_RECORDS, EXIT_ERROR,
};
use crate::{read_input, CliError};

#[derive(Args)]
pub struct CheckArgs {
    /// Submission JSON (candidate, identities, manual and extracted grades)
    #[arg(long, conflicts_with_all = ["manual", "extracted", "form_name", "document_names"])]
    pub submission: Option<PathBuf>,

    /// CSV of grades typed on the form
    #[arg(long, requires = "form_name")]
    pub manual: Option<PathBuf>,

    /// CSV of grades transcribed from the documents (none when omitted)
    #[arg(long, requires = "manual")]
    pub extracted: Option<PathBuf>,

    /// Name on the form, as LAST,FIRST
    #[arg(long, value_name = "LAST,FIRST")]
    pub form_name: Option<String>,

    /// Name read from a supporting document, as LAST,FIRST (repeatable)
    #[arg(long = "document-name", value_name = "LAST,FIRST")]
    pub document_names: Vec<String>,

    /// Candidature identifier (CSV mode)
    #[arg(long, default_value = "CLI")]
    pub candidate: String,

    /// Overall average declared on the form (CSV mode)
    #[arg(long, conflicts_with = "submission")]
    pub declared_average: Option<f64>,

    /// Reconciliation config (.recon.toml); defaults when omitted
    #[arg(long, env = "GRADECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print JSON to stdout instead of only the human summary
    #[arg(long)]
    pub json: bool,

    /// Emit the rounded export document instead of the raw report (implies --json
    /// unless --output is given)
    #[arg(long)]
    pub export: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Boundary errors: bad config vs bad records.
fn recon_err(err: ReconError) -> CliError {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
            CliError::new(EXIT_CHECK_INVALID_CONFIG, err.to_string())
        }
        _ => CliError::new(EXIT_CHECK_INVALID_RECORDS, err.to_string()),
    }
}

fn parse_person(raw: &str, flag: &str) -> Result<PersonName, CliError> {
    match raw.split_once(',') {
        Some((last, first)) if !last.trim().is_empty() => {
            Ok(PersonName::new(last.trim(), first.trim()))
        }
        _ => Err(CliError::args(format!("{flag}: expected LAST,FIRST, got '{raw}'"))
            .with_hint("e.g. --form-name 'Dupont,Marie'")),
    }
}

fn load_submission(args: &CheckArgs) -> Result<CandidateSubmission, CliError> {
    if let Some(ref path) = args.submission {
        let json = read_input(path, "submission")?;
        return parse_submission(&json).map_err(recon_err);
    }

    let Some(ref manual_path) = args.manual else {
        return Err(CliError::args("nothing to check")
            .with_hint("pass --submission FILE, or --manual FILE --form-name LAST,FIRST"));
    };

    let form_name = args
        .form_name
        .as_deref()
        .ok_or_else(|| CliError::args("--manual requires --form-name"))?;

    let manual = load_csv_records(RecordSource::Manual, &read_input(manual_path, "manual grades")?)
        .map_err(recon_err)?;
    let extracted = match args.extracted {
        Some(ref path) => {
            load_csv_records(RecordSource::Extracted, &read_input(path, "extracted grades")?)
                .map_err(recon_err)?
        }
        None => Vec::new(),
    };

    let document_identities = args
        .document_names
        .iter()
        .map(|raw| {
            parse_person(raw, "--document-name").map(|name| DocumentIdentity {
                name,
                source_document: None,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let submission = CandidateSubmission {
        candidate_id: CandidateId::new(args.candidate.clone()),
        form_identity: parse_person(form_name, "--form-name")?,
        document_identities,
        declared_average: args.declared_average,
        manual,
        extracted,
    };
    validate_submission(&submission).map_err(recon_err)?;
    Ok(submission)
}

pub fn cmd_check(args: CheckArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let submission = load_submission(&args)?;

    log::debug!(
        "checking {} with config {}",
        submission.candidate_id,
        config.fingerprint().short()
    );
    let report = build_report(&submission, &config);

    let to_stdout = args.json || (args.export && args.output.is_none());
    if to_stdout || args.output.is_some() {
        let json_str = if args.export {
            let profile = CandidateProfile {
                last_name: submission.form_identity.last.clone(),
                first_name: submission.form_identity.first.clone(),
                ..CandidateProfile::default()
            };
            serde_json::to_string_pretty(&ExportDocument::from_report(&report, &profile))
        } else {
            serde_json::to_string_pretty(&report)
        }
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = args.output {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if to_stdout {
            println!("{json_str}");
        }
    }

    print_summary(&report);
    verdict_exit(&report)
}

/// Human summary, on stderr so stdout stays machine-readable.
fn print_summary(report: &ReconciliationReport) {
    let s = &report.stats;
    eprintln!(
        "candidate {}: {}/{} grades matched ({:.0}%), {} anomalies ({} high, {} medium, {} low)",
        report.candidate_id,
        s.matched_count,
        s.manual_count,
        s.match_rate * 100.0,
        s.anomaly_count,
        s.severity_counts.high,
        s.severity_counts.medium,
        s.severity_counts.low,
    );

    for anomaly in &report.anomalies {
        let mut line = format!(
            "  {:<6} {:<26} {}",
            anomaly.severity.to_string(),
            anomaly.kind.to_string(),
            anomaly.subject
        );
        match (anomaly.manual_score, anomaly.extracted_score) {
            (Some(m), Some(e)) => line.push_str(&format!(": form {m:.2}, transcript {e:.2}")),
            (Some(m), None) => line.push_str(&format!(": form {m:.2}, not on transcript")),
            (None, Some(e)) => line.push_str(&format!(": transcript {e:.2}, not on form")),
            (None, None) => {}
        }
        if let Some(confidence) = anomaly.confidence {
            line.push_str(&format!(" (confidence {confidence:.2})"));
        }
        eprintln!("{line}");
    }

    let identity = &report.identity;
    if identity.usurpation_detected {
        eprintln!(
            "identity: MISMATCH - {}",
            identity.detail.as_deref().unwrap_or("form name not found on documents")
        );
    } else if identity.identity_confirmed {
        eprintln!("identity: confirmed ({})", identity.form_name);
    } else {
        eprintln!("identity: not verified (no document names)");
    }

    eprintln!("recommendation: {}", report.verdict.recommendation);
}

fn verdict_exit(report: &ReconciliationReport) -> Result<(), CliError> {
    match report.verdict.status {
        VerificationStatus::Clean => Ok(()),
        VerificationStatus::Fraud => Err(CliError::new(EXIT_CHECK_FRAUD, "identity fraud detected")
            .with_hint("the name on the form matches none of the supporting documents")),
        VerificationStatus::WithDiscrepancies => Err(CliError::new(
            EXIT_CHECK_DISCREPANCIES,
            format!("{} grade anomalies found", report.stats.anomaly_count),
        )),
    }
}
