//! Report rendering: tab-separated table, JSON document, one-line summary.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::errors::Result;
use crate::harness::conformance::{SuiteReport, Tally};

/// Column header for [`render_table`].
pub const TABLE_HEADER: &str = "fixture_id\tpath_kind\tread_count\tclassification";

/// One `<fixture-id>\t<pathKind>\t<readCount>\t<classification>` line per fixture.
#[must_use]
pub fn render_table(report: &SuiteReport, with_header: bool) -> String {
    let mut out = String::new();
    if with_header {
        out.push_str(TABLE_HEADER);
        out.push('\n');
    }
    for run in &report.runs {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            run.fixture_id,
            run.path_kind,
            run.read_count,
            run.verdict.token()
        );
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    transform: &'a str,
    tolerance: f64,
    fingerprint: &'a str,
    all_correct: bool,
    tally: Tally,
    runs: &'a [crate::harness::conformance::FixtureRun],
}

/// Pretty JSON with totals alongside every run.
pub fn render_json(report: &SuiteReport) -> Result<String> {
    let doc = JsonReport {
        transform: &report.transform,
        tolerance: report.tolerance,
        fingerprint: &report.fingerprint,
        all_correct: report.all_correct(),
        tally: report.tally(),
        runs: &report.runs,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// `transform=<name> fixtures=<n> <tally> fingerprint=<first 12 hex>`
#[must_use]
pub fn summary_line(report: &SuiteReport) -> String {
    let short = report.fingerprint.get(..12).unwrap_or(&report.fingerprint);
    format!(
        "transform={} fixtures={} {} fingerprint={short}",
        report.transform,
        report.runs.len(),
        report.tally()
    )
}
