//! Thread-safe run log shared by suite workers.

#![allow(missing_docs)]

use parking_lot::Mutex;

use crate::harness::conformance::{FixtureRun, SuiteReport, Verdict};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Serializes harness events into one JSONL writer.
#[derive(Debug)]
pub struct RunLog {
    writer: Mutex<JsonlWriter>,
}

impl RunLog {
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        Self {
            writer: Mutex::new(JsonlWriter::open(config)),
        }
    }

    pub fn record(&self, entry: &LogEntry) {
        self.writer.lock().write_entry(entry);
    }

    pub fn suite_started(&self, transform: &str, fixture_count: usize, fingerprint: &str) {
        let mut entry = LogEntry::new(EventType::SuiteStart, Severity::Info);
        entry.transform = Some(transform.to_string());
        entry.fixture_count = Some(fixture_count);
        entry.fingerprint = Some(fingerprint.to_string());
        self.record(&entry);
    }

    pub fn fixture_finished(&self, transform: &str, run: &FixtureRun) {
        let (event, severity, failed_read, details) = match &run.verdict {
            Verdict::Classified { .. } if run.verdict.is_correct() => {
                (EventType::FixtureClassified, Severity::Info, None, None)
            }
            Verdict::Classified { .. } => {
                (EventType::FixtureClassified, Severity::Warning, None, None)
            }
            Verdict::TransformFailed { read, details } => (
                EventType::TransformFailed,
                Severity::Critical,
                Some(*read),
                Some(details.clone()),
            ),
        };
        let mut entry = LogEntry::new(event, severity);
        entry.transform = Some(transform.to_string());
        entry.fixture_id = Some(run.fixture_id.clone());
        entry.path_kind = Some(run.path_kind.as_str().to_string());
        entry.read_count = Some(run.read_count);
        entry.verdict = Some(run.verdict.token().to_string());
        entry.failed_read = failed_read;
        entry.details = details;
        self.record(&entry);
    }

    pub fn suite_finished(&self, report: &SuiteReport, duration_ms: u64) {
        let tally = report.tally();
        let severity = if report.all_correct() {
            Severity::Info
        } else {
            Severity::Warning
        };
        let mut entry = LogEntry::new(EventType::SuiteFinish, severity);
        entry.transform = Some(report.transform.clone());
        entry.fixture_count = Some(report.runs.len());
        entry.fingerprint = Some(report.fingerprint.clone());
        entry.duration_ms = Some(duration_ms);
        entry.details = Some(tally.to_string());
        self.record(&entry);
        self.writer.lock().flush();
    }

    /// Current writer sink, see [`JsonlWriter::state`].
    #[must_use]
    pub fn state(&self) -> &'static str {
        self.writer.lock().state()
    }
}
