//! JSONL run log: one self-contained JSON object per line for each harness event.
//!
//! Each line is serialized in memory and handed to `write_all` in one call so
//! a concurrent `tail -f` never sees a partial record.
//!
//! Degradation chain when the filesystem misbehaves:
//! 1. Primary file path
//! 2. Fallback path (if configured)
//! 3. stderr with `[PDH-JSONL]` prefix
//! 4. Silent discard (a logging failure never fails a suite run)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{PdhError, Result};

/// Severity level for run-log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Harness event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SuiteStart,
    FixtureClassified,
    TransformFailed,
    SuiteFinish,
}

/// A single run-log line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_count: Option<u32>,
    /// Classification token, or `transform_failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    /// 1-indexed read that raised, for `transform_failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_read: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// New entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            transform: None,
            fixture_id: None,
            path_kind: None,
            read_count: None,
            verdict: None,
            failed_read: None,
            fixture_count: None,
            fingerprint: None,
            duration_ms: None,
            details: None,
        }
    }
}

/// Where lines are currently going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

/// JSONL writer settings.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Rotate once the current file would exceed this size.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1` .. `<path>.N`.
    pub max_rotated_files: u32,
}

impl JsonlConfig {
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("pdh").join("runs.jsonl"),
            fallback_path: None,
            max_size_bytes: 16 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

/// Append-only JSONL writer with size rotation and the fallback chain above.
#[derive(Debug)]
pub struct JsonlWriter {
    config: JsonlConfig,
    file: Option<BufWriter<File>>,
    sink: Sink,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the primary path, degrading down the chain on failure.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut writer = Self {
            config,
            file: None,
            sink: Sink::Discard,
            bytes_written: 0,
        };
        let primary = writer.config.path.clone();
        if !writer.attach(&primary, Sink::Primary) {
            writer.fall_back();
        }
        writer
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[PDH-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Current sink: `primary`, `fallback`, `stderr` or `discard`.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.sink {
            Sink::Primary => "primary",
            Sink::Fallback => "fallback",
            Sink::Stderr => "stderr",
            Sink::Discard => "discard",
        }
    }

    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.file.is_some() && self.bytes_written + len > self.config.max_size_bytes {
            self.rotate();
        }

        match self.sink {
            Sink::Primary | Sink::Fallback => {
                let ok = self
                    .file
                    .as_mut()
                    .is_some_and(|file| file.write_all(line.as_bytes()).is_ok());
                if ok {
                    self.bytes_written += len;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            Sink::Stderr => {
                let _ = write!(io::stderr(), "[PDH-JSONL] {line}");
            }
            Sink::Discard => {}
        }
    }

    fn attach(&mut self, path: &Path, sink: Sink) -> bool {
        match open_append(path) {
            Ok((file, size)) => {
                self.file = Some(BufWriter::new(file));
                self.sink = sink;
                self.bytes_written = size;
                true
            }
            Err(_) => false,
        }
    }

    fn fall_back(&mut self) {
        self.file = None;
        if let Some(fallback) = self.config.fallback_path.clone()
            && self.attach(&fallback, Sink::Fallback)
        {
            let _ = writeln!(
                io::stderr(),
                "[PDH-JSONL] primary path failed, using fallback: {}",
                fallback.display()
            );
            return;
        }
        self.sink = Sink::Stderr;
        let _ = writeln!(io::stderr(), "[PDH-JSONL] no writable log file, using stderr");
    }

    fn degrade(&mut self) {
        match self.sink {
            Sink::Primary => self.fall_back(),
            Sink::Fallback => {
                self.file = None;
                self.sink = Sink::Stderr;
            }
            Sink::Stderr | Sink::Discard => {
                self.file = None;
                self.sink = Sink::Discard;
            }
        }
    }

    fn rotate(&mut self) {
        self.flush();
        self.file = None;

        let base = match self.sink {
            Sink::Primary => self.config.path.clone(),
            Sink::Fallback => match self.config.fallback_path.clone() {
                Some(path) => path,
                None => return,
            },
            Sink::Stderr | Sink::Discard => return,
        };

        // .N is dropped, .N-1 → .N, …, current → .1
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        for index in (1..self.config.max_rotated_files).rev() {
            let _ = fs::rename(rotated_name(&base, index), rotated_name(&base, index + 1));
        }
        if self.config.max_rotated_files > 0 {
            let _ = fs::rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        let sink = self.sink;
        if !self.attach(&base, sink) {
            self.degrade();
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Open or create `path` for appending; returns the file and its current size.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| PdhError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| PdhError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `runs.jsonl` → `runs.jsonl.2`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
