// End-to-end tests for the confronto binary.
//
// Summaries come in as pdftotext -bbox dumps so the tests do not need poppler.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Run the binary with an isolated config directory so the developer's own
/// settings.json never leaks into a test.
fn confronto(args: &[&str]) -> (Output, TempDir) {
    let home = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_confronto"))
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("APPDATA", home.path())
        .env_remove("CONFRONTO_MAPPING")
        .env_remove("CONFRONTO_LOG")
        .output()
        .expect("failed to run confronto");
    (output, home)
}

fn run_args<'a>(ledger: &'a str, extra: &[&'a str]) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--tokens".to_string(),
        fixture("resumo_ferias.html").display().to_string(),
        "--ledger".to_string(),
        fixture(ledger).display().to_string(),
        "--mapping".to_string(),
        fixture("mapeamento_dp.json").display().to_string(),
        "--config".to_string(),
        fixture("recon.toml").display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}

fn run_with(ledger: &str, extra: &[&str]) -> (Output, TempDir) {
    let args = run_args(ledger, extra);
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    confronto(&refs)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// run
// ============================================================================

#[test]
fn run_all_matched_exits_zero() {
    let (output, _home) = run_with("lote_ok.txt", &[]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("all views match"));
}

#[test]
fn run_divergent_exits_one() {
    let (output, _home) = run_with("lote_divergente.txt", &[]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("Férias"), "stderr: {err}");
    assert!(err.contains("unmapped postings"), "stderr: {err}");
    assert!(err.contains("error: divergences found"));
}

#[test]
fn run_json_stdout_is_one_document() {
    let (output, _home) = run_with("lote_divergente.txt", &["--json", "--quiet"]);
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("stdout must be JSON");
    assert_eq!(value["meta"]["mapping"]["state"], "loaded");
    assert_eq!(value["summary"]["all_matched"], false);
    assert_eq!(value["summary"]["summary_events"], 4);

    let vacation = value["by_category"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["category"] == "Férias")
        .unwrap();
    assert_eq!(vacation["status"], "divergent");
    assert_eq!(vacation["difference"], "58.35");

    let unmapped = value["unmapped"].as_array().unwrap();
    assert_eq!(unmapped.len(), 1);
    assert_eq!(unmapped[0]["ledger_code"], "99999");
}

#[test]
fn run_writes_output_files() {
    let out = tempfile::tempdir().unwrap();
    let json_path = out.path().join("result.json");
    let csv_dir = out.path().join("views");
    let (output, _home) = run_with(
        "lote_ok.txt",
        &["--output", json_path.to_str().unwrap(), "--csv-dir", csv_dir.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(doc["summary"]["all_matched"], true);

    for name in ["by_category.csv", "by_event.csv", "by_ledger_code.csv", "taxes.csv", "composition.csv"] {
        assert!(csv_dir.join(name).is_file(), "missing {name}");
    }
    let by_category = std::fs::read_to_string(csv_dir.join("by_category.csv")).unwrap();
    assert!(by_category.contains("Férias,318.35,318.35,0.00,match"), "{by_category}");
}

#[test]
fn run_missing_mapping_exits_six_after_reporting() {
    let (output, _home) = confronto(&[
        "run",
        "--tokens",
        fixture("resumo_ferias.html").to_str().unwrap(),
        "--ledger",
        fixture("lote_ok.txt").to_str().unwrap(),
        "--mapping",
        "tests/fixtures/does_not_exist.json",
        "--config",
        fixture("recon.toml").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("code mapping not found"));
    assert!(err.contains("does_not_exist.json"));
}

#[test]
fn run_empty_summary_exits_seven() {
    let (output, _home) = confronto(&[
        "run",
        "--tokens",
        fixture("resumo_vazio.html").to_str().unwrap(),
        "--ledger",
        fixture("lote_ok.txt").to_str().unwrap(),
        "--mapping",
        fixture("mapeamento_dp.json").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(7));
    assert!(stderr(&output).contains("no payroll events"));
}

#[test]
fn run_invalid_config_exits_five() {
    let (output, _home) = confronto(&[
        "run",
        "--tokens",
        fixture("resumo_ferias.html").to_str().unwrap(),
        "--ledger",
        fixture("lote_ok.txt").to_str().unwrap(),
        "--config",
        fixture("bad_tolerance.toml").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("tolerance must be positive"));
}

#[test]
fn run_missing_ledger_exits_three() {
    let (output, _home) = run_with("no_such_ledger.txt", &[]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn run_requires_a_summary_source() {
    let (output, _home) = confronto(&["run", "--ledger", "x.txt"]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// parse
// ============================================================================

#[test]
fn parse_summary_prints_csv_rows() {
    let (output, _home) = confronto(&["parse", "summary", "--file", fixture("resumo_ferias.html").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "category,event_code,event_name,sign,amount");
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "Folha,001,SALARIO BASE,+,1234.56");
    assert!(lines[4].starts_with("Férias,310,INSS S/ FERIAS,-,40"));
}

#[test]
fn parse_ledger_as_json() {
    let (output, _home) = confronto(&[
        "parse",
        "ledger",
        "--file",
        fixture("lote_divergente.txt").to_str().unwrap(),
        "--config",
        fixture("recon.toml").to_str().unwrap(),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let rows: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3]["ledger_code"], "30001");
    assert_eq!(rows[3]["amount"], "1234.56");
}

// ============================================================================
// mapping / config
// ============================================================================

#[test]
fn mapping_validate_reports_links() {
    let (output, _home) = confronto(&["mapping", "validate", "--mapping", fixture("mapeamento_dp.json").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("categories: Folha, Férias"));
}

#[test]
fn mapping_validate_missing_file_exits_six() {
    let (output, _home) = confronto(&["mapping", "validate", "--mapping", "nowhere.json"]);
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn config_validate() {
    let (ok, _home) = confronto(&["config", "validate", fixture("recon.toml").to_str().unwrap()]);
    assert_eq!(ok.status.code(), Some(0));
    assert!(stdout(&ok).contains("ok"));

    let (bad, _home) = confronto(&["config", "validate", fixture("bad_tolerance.toml").to_str().unwrap()]);
    assert_eq!(bad.status.code(), Some(5));

    let (missing, _home) = confronto(&["config", "validate", "missing.toml"]);
    assert_eq!(missing.status.code(), Some(3));
}

#[test]
fn config_show_fills_defaults() {
    let (output, _home) = confronto(&["config", "show"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("[ledger]"));
    assert!(out.contains("[taxes]"));
}
