//! CLI smoke tests: help, the regression gate, predict, fixtures, config.

mod common;

use std::fs;

use serde_json::Value;

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: pdh [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains(env!("CARGO_PKG_VERSION")),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn reference_binding_passes_the_gate() {
    let result = common::run_cli_case("reference_binding_passes_the_gate", &["run"]);
    assert_eq!(
        result.status.code(),
        Some(0),
        "log: {}",
        result.log_path.display()
    );
    let lines: Vec<&str> = result.stdout.lines().collect();
    assert!(!lines.is_empty());
    for line in &lines {
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 4, "bad row {line:?}");
        assert_eq!(cols[3], "matches_correct", "row {line:?}");
    }
    assert!(result.stderr.contains("PASS"));
}

#[test]
fn accumulating_binding_fails_the_gate() {
    let result = common::run_cli_case(
        "accumulating_binding_fails_the_gate",
        &["run", "--transform", "accumulating", "--no-color"],
    );
    assert_eq!(
        result.status.code(),
        Some(4),
        "log: {}",
        result.log_path.display()
    );
    assert!(
        result
            .stdout
            .lines()
            .any(|line| line == "scenario-a\trounded_rect\t3\tmatches_buggy"),
        "log: {}",
        result.log_path.display()
    );
    assert!(
        result
            .stdout
            .lines()
            .any(|line| line == "scenario-b\trect\t3\tmatches_correct")
    );
    assert!(result.stderr.contains("regression: transform=accumulating"));
}

#[test]
fn copy_per_read_workaround_passes_in_parallel() {
    let result = common::run_cli_case(
        "copy_per_read_workaround_passes_in_parallel",
        &["run", "-t", "copy-per-read", "--jobs", "4", "--synthesize", "40", "--seed", "9"],
    );
    assert_eq!(
        result.status.code(),
        Some(0),
        "log: {}",
        result.log_path.display()
    );
    assert_eq!(result.stdout.lines().count(), 40);
}

#[test]
fn json_report_has_totals() {
    let result = common::run_cli_case(
        "json_report_has_totals",
        &["run", "--json", "--transform", "accumulating", "--filter", "^scenario-a$"],
    );
    assert_eq!(result.status.code(), Some(4), "log: {}", result.log_path.display());
    let report: Value = serde_json::from_str(&result.stdout).expect("json report");
    assert_eq!(report["transform"], "accumulating");
    assert_eq!(report["all_correct"], false);
    assert_eq!(report["tally"]["matches_buggy"], 1);
    assert_eq!(report["runs"][0]["fixture_id"], "scenario-a");
}

#[test]
fn env_selects_json_output() {
    let result = common::run_cli_case_with_env(
        "env_selects_json_output",
        &["run", "--filter", "^scenario-b$"],
        &[("PDH_OUTPUT_FORMAT", "json")],
    );
    assert_eq!(result.status.code(), Some(0), "log: {}", result.log_path.display());
    let report: Value = serde_json::from_str(&result.stdout).expect("json report");
    assert_eq!(report["all_correct"], true);
}

#[test]
fn injected_fault_is_a_regression() {
    let result = common::run_cli_case(
        "injected_fault_is_a_regression",
        &["run", "--fail-on-read", "1", "--filter", "^single-read$", "--header"],
    );
    assert_eq!(result.status.code(), Some(4), "log: {}", result.log_path.display());
    let lines: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "fixture_id\tpath_kind\tread_count\tclassification",
            "single-read\trounded_rect\t1\ttransform_failed",
        ]
    );
}

#[test]
fn unknown_binding_is_a_user_error() {
    let result = common::run_cli_case(
        "unknown_binding_is_a_user_error",
        &["run", "--transform", "uikit"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PDH-1101"));
}

#[test]
fn empty_filter_is_a_user_error() {
    let result = common::run_cli_case(
        "empty_filter_is_a_user_error",
        &["run", "--filter", "^nothing-matches$"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("no fixtures selected"));
}

#[test]
fn fixture_file_drives_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fixtures.toml");
    fs::write(
        &path,
        r#"
[[fixture]]
id = "file-rounded"
kind = "rounded_rect"
view_frame = [10.0, 20.0, 100.0, 100.0]
path_bounds = [1.0, 1.0, 8.0, 8.0]
reads = 4
"#,
    )
    .expect("write fixtures");
    let path_arg = path.to_string_lossy().to_string();

    let result = common::run_cli_case(
        "fixture_file_drives_the_run",
        &["run", "--transform", "accumulating", "--fixtures", &path_arg],
    );
    assert_eq!(result.status.code(), Some(4), "log: {}", result.log_path.display());
    assert_eq!(
        result.stdout.trim_end(),
        "file-rounded\trounded_rect\t4\tmatches_buggy"
    );
}

#[test]
fn malformed_fixture_file_is_a_user_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[[fixture]]\nid = \"neg\"\nkind = \"oval\"\nview_frame = [0.0, 0.0, 1.0, 1.0]\npath_bounds = [0.0, 0.0, -1.0, 1.0]\nreads = 1\n",
    )
    .expect("write fixtures");
    let path_arg = path.to_string_lossy().to_string();

    let result = common::run_cli_case(
        "malformed_fixture_file_is_a_user_error",
        &["run", "--fixtures", &path_arg],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn predict_prints_both_sequences() {
    let result = common::run_cli_case(
        "predict_prints_both_sequences",
        &[
            "predict", "--kind", "rounded_rect", "--view", "100,200,320,240", "--bounds",
            "0,0,60,40", "--reads", "3",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let lines: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(lines[0], "read\thypothesis\tx\ty\twidth\theight");
    assert_eq!(lines.len(), 7);
    assert!(lines.contains(&"3\tbuggy\t300\t600\t60\t40"));
    assert!(lines.contains(&"3\tcorrect\t100\t200\t60\t40"));
}

#[test]
fn predict_json_for_one_hypothesis() {
    let result = common::run_cli_case(
        "predict_json_for_one_hypothesis",
        &[
            "predict", "--json", "--kind", "explicit_elements", "--view", "-10,5,50,50",
            "--bounds", "0,0,4,4", "--reads", "2", "--hypothesis", "buggy",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload: Value = serde_json::from_str(result.stdout.trim()).expect("json");
    assert_eq!(payload["discriminating"], true);
    assert!(payload["predictions"].get("correct").is_none());
    assert_eq!(payload["predictions"]["buggy"][1]["origin_x"], -20.0);
    assert_eq!(payload["predictions"]["buggy"][1]["origin_y"], 10.0);
}

#[test]
fn predict_rejects_negative_reads_and_unknown_kinds() {
    let negative = common::run_cli_case(
        "predict_rejects_negative_reads",
        &[
            "predict", "--kind", "oval", "--view", "0,0,1,1", "--bounds", "0,0,1,1", "--reads",
            "-1",
        ],
    );
    assert_eq!(negative.status.code(), Some(1), "log: {}", negative.log_path.display());

    let unknown = common::run_cli_case(
        "predict_rejects_unknown_kinds",
        &[
            "predict", "--kind", "bezier", "--view", "0,0,1,1", "--bounds", "0,0,1,1", "--reads",
            "1",
        ],
    );
    assert_eq!(unknown.status.code(), Some(1), "log: {}", unknown.log_path.display());
    assert!(unknown.stderr.contains("bezier"));
}

#[test]
fn fixtures_listing_is_reproducible() {
    let args = ["fixtures", "--json", "--synthesize", "12", "--seed", "3"];
    let first = common::run_cli_case("fixtures_listing_first", &args);
    let second = common::run_cli_case("fixtures_listing_second", &args);
    assert!(first.status.success(), "log: {}", first.log_path.display());

    let a: Value = serde_json::from_str(first.stdout.trim()).expect("json");
    let b: Value = serde_json::from_str(second.stdout.trim()).expect("json");
    assert_eq!(a["count"], 12);
    assert_eq!(a["fingerprint"], b["fingerprint"]);
    assert_eq!(a["fixtures"], b["fixtures"]);
}

#[test]
fn config_commands_work_without_a_file() {
    let path = common::run_cli_case("config_path", &["config", "path"]);
    assert!(path.status.success(), "log: {}", path.log_path.display());
    assert!(path.stdout.contains("config.toml"));

    let validate = common::run_cli_case("config_validate", &["config", "validate"]);
    assert!(validate.status.success(), "log: {}", validate.log_path.display());
    assert!(validate.stdout.contains("Configuration is valid."));
}

#[test]
fn config_file_sets_default_binding() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pdh.toml");
    fs::write(&path, "[harness]\ndefault_transform = \"accumulating\"\n").expect("write config");
    let path_arg = path.to_string_lossy().to_string();

    let result = common::run_cli_case(
        "config_file_sets_default_binding",
        &["--config", &path_arg, "run", "--filter", "^scenario-a$"],
    );
    assert_eq!(result.status.code(), Some(4), "log: {}", result.log_path.display());

    let missing = common::run_cli_case(
        "missing_explicit_config",
        &["--config", "/nonexistent/pdh.toml", "config", "show"],
    );
    assert_eq!(missing.status.code(), Some(1), "log: {}", missing.log_path.display());
    assert!(missing.stderr.contains("PDH-1002"));
}

#[test]
fn completions_generate_scripts() {
    let result = common::run_cli_case("completions_generate_scripts", &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("pdh"));
}
