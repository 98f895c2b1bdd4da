// End-to-end tests for the `gradecheck` binary: exit codes and the --json stdout contract.
// Run with: cargo test -p gradecheck-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn gradecheck() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gradecheck"));
    cmd.env_remove("GRADECHECK_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("process terminated by signal")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert stdout is a single, parseable JSON value.
fn single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}"))
}

const MANUAL_CSV: &str = "\
subject,score,weight,term,academic_year
Mathématiques,14,4,T1,2024
Anglais,16,2,T1,2024
";

const EXTRACTED_CLEAN_CSV: &str = "\
subject,score,weight,term,academic_year,confidence
Maths,14,4,T1,2024,0.95
ANGLAIS,15.5,2,T1,2024,0.9
";

const EXTRACTED_GAP_CSV: &str = "\
subject,score,weight,term,academic_year,confidence
Maths,14,4,T1,2024,0.95
Anglais,11,2,T1,2024,0.85
";

const SUBMISSION_FRAUD: &str = r#"{
  "candidate_id": "CAND-0342",
  "form_identity": { "last": "Dupont", "first": "Marie" },
  "document_identities": [{ "last": "Martin", "first": "Paul", "source_document": "bulletin.pdf" }],
  "manual": [{ "subject": "Maths", "score": 14, "weight": 2, "term": "T1", "academic_year": "2024" }],
  "extracted": [{ "subject": "Mathematiques", "score": 14, "weight": 2, "term": "T1", "academic_year": "2024", "confidence": 0.9 }]
}"#;

// ===========================================================================
// gradecheck check
// ===========================================================================

#[test]
fn clean_csv_check_exits_zero() {
    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);
    let extracted = write(dir.path(), "extracted.csv", EXTRACTED_CLEAN_CSV);

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--extracted").arg(&extracted)
        .args(["--form-name", "Dupont,Marie", "--document-name", "DUPONT,Marie"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty(), "human summary belongs on stderr");
    assert!(stderr(&output).contains("2/2 grades matched"), "{}", stderr(&output));
    assert!(stderr(&output).contains("recommendation: accept"));
}

#[test]
fn gap_exits_with_discrepancy_code_and_json() {
    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);
    let extracted = write(dir.path(), "extracted.csv", EXTRACTED_GAP_CSV);

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--extracted").arg(&extracted)
        .args(["--form-name", "Dupont,Marie", "--candidate", "CAND-0088", "--json"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 20, "stderr: {}", stderr(&output));
    let report = single_json(&output);
    assert_eq!(report["candidate_id"], "CAND-0088");
    assert_eq!(report["anomalies"][0]["type"], "LARGE_SCORE_GAP");
    assert_eq!(report["anomalies"][0]["severity"], "HIGH");
    assert_eq!(report["verdict"]["status"], "WITH_DISCREPANCIES");
    assert_eq!(report["verdict"]["recommendation"], "REVIEW");
}

#[test]
fn missing_transcript_flags_every_grade() {
    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .args(["--form-name", "Dupont,Marie", "--json"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 20);
    let report = single_json(&output);
    assert_eq!(report["stats"]["match_rate"], 0.0);
    assert_eq!(report["stats"]["anomaly_count"], 2);
    assert_eq!(report["anomalies"][1]["type"], "MANUAL_NOT_FOUND");
}

#[test]
fn fraud_submission_exits_21() {
    let dir = TempDir::new().unwrap();
    let submission = write(dir.path(), "sub.json", SUBMISSION_FRAUD);
    let out_file = dir.path().join("report.json");

    let output = gradecheck()
        .arg("check")
        .arg("--submission").arg(&submission)
        .arg("--output").arg(&out_file)
        .output()
        .unwrap();

    assert_eq!(code(&output), 21);
    let err = stderr(&output);
    assert!(err.contains("identity: MISMATCH"), "{err}");
    assert!(err.contains("error: identity fraud detected"), "{err}");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_file).unwrap()).unwrap();
    assert_eq!(written["verdict"]["priority_finding"], "IDENTITY_FRAUD");
}

#[test]
fn export_document_is_rounded() {
    let dir = TempDir::new().unwrap();
    let manual = write(
        dir.path(),
        "manual.csv",
        "subject,score,term,academic_year\nMaths,\"13,333\",T1,2024\n",
    );
    let extracted = write(
        dir.path(),
        "extracted.csv",
        "subject,score,term,academic_year,confidence\nMaths,13,T1,2024,0.876\n",
    );

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--extracted").arg(&extracted)
        .args(["--form-name", "Dupont,Marie", "--export", "--json"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let doc = single_json(&output);
    assert_eq!(doc["profile"]["last_name"], "Dupont");
    assert_eq!(doc["rows"][0]["manual_score"], 13.33);
    assert_eq!(doc["rows"][0]["confidence"], 0.88);
}

#[test]
fn export_alone_prints_the_export_document() {
    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);
    let extracted = write(dir.path(), "extracted.csv", EXTRACTED_CLEAN_CSV);

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--extracted").arg(&extracted)
        .args(["--form-name", "Dupont,Marie", "--export"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let doc = single_json(&output);
    assert_eq!(doc["profile"]["first_name"], "Marie");
    assert_eq!(doc["rows"].as_array().unwrap().len(), 2);

    let out_file = dir.path().join("export.json");
    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--extracted").arg(&extracted)
        .arg("--output").arg(&out_file)
        .args(["--form-name", "Dupont,Marie", "--export"])
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty(), "--output keeps stdout clean");
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out_file).unwrap()).unwrap();
    assert_eq!(written["profile"]["last_name"], "Dupont");
}

#[test]
fn half_read_document_name_is_not_fraud() {
    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);
    let extracted = write(dir.path(), "extracted.csv", EXTRACTED_CLEAN_CSV);

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--extracted").arg(&extracted)
        .args(["--form-name", "Dupont,Marie", "--document-name", "Dupont,", "--json"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let report = single_json(&output);
    assert_eq!(report["identity"]["usurpation_detected"], false);
    assert_eq!(report["verdict"]["status"], "CLEAN");
    assert!(stderr(&output).contains("identity: not verified"));
}

#[test]
fn out_of_range_score_exits_23() {
    let dir = TempDir::new().unwrap();
    let manual = write(
        dir.path(),
        "manual.csv",
        "subject,score,term,academic_year\nMaths,24,T1,2024\n",
    );

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .args(["--form-name", "Dupont,Marie"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 23);
    assert!(stderr(&output).contains("outside [0, 20]"), "{}", stderr(&output));
}

#[test]
fn missing_column_exits_23() {
    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", "subject,score\nMaths,12\n");

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .args(["--form-name", "Dupont,Marie"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 23);
    assert!(stderr(&output).contains("missing column 'term'"), "{}", stderr(&output));
}

#[test]
fn usage_errors_exit_2() {
    let output = gradecheck().arg("check").output().unwrap();
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("nothing to check"));

    let output = gradecheck()
        .args(["check", "--submission", "/nonexistent/sub.json"])
        .output()
        .unwrap();
    assert_eq!(code(&output), 2);

    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);
    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .args(["--form-name", "Dupont Marie"])
        .output()
        .unwrap();
    assert_eq!(code(&output), 2);
}

#[test]
fn config_changes_the_verdict() {
    let dir = TempDir::new().unwrap();
    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);
    let extracted = write(dir.path(), "extracted.csv", EXTRACTED_GAP_CSV);
    let config = write(dir.path(), "lenient.recon.toml", "[tolerance]\nscore = 6.0\n");

    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--extracted").arg(&extracted)
        .arg("--config").arg(&config)
        .args(["--form-name", "Dupont,Marie"])
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
}

// ===========================================================================
// gradecheck config
// ===========================================================================

#[test]
fn invalid_config_exits_22() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "bad.recon.toml", "[matching]\nsimilarity_threshold = 1.5\n");

    let output = gradecheck().args(["config", "validate"]).arg(&config).output().unwrap();
    assert_eq!(code(&output), 22);
    assert!(stderr(&output).contains("similarity_threshold"));

    let manual = write(dir.path(), "manual.csv", MANUAL_CSV);
    let output = gradecheck()
        .arg("check")
        .arg("--manual").arg(&manual)
        .arg("--config").arg(&config)
        .args(["--form-name", "Dupont,Marie"])
        .output()
        .unwrap();
    assert_eq!(code(&output), 22);
}

#[test]
fn config_validate_ok() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "ok.recon.toml", "[tolerance]\nscore = 0.5\n");

    let output = gradecheck().args(["config", "validate"]).arg(&config).output().unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(stderr(&output).starts_with("ok: "));
}

#[test]
fn config_show_prints_defaults_and_fingerprint() {
    let output = gradecheck().args(["config", "show"]).output().unwrap();
    assert_eq!(code(&output), 0);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# fingerprint: "), "{stdout}");
    assert!(stdout.contains("similarity_threshold = 0.7"), "{stdout}");
    assert!(stdout.contains("duplicate_subjects = \"last_write_wins\""), "{stdout}");
    assert!(stdout.contains("[recommendation]"), "{stdout}");
}
