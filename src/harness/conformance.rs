//! Conformance harness: drive a transform through fixtures and classify what comes back.
//!
//! Each fixture is read `read_count` times, strictly in order, with one
//! [`PathInput`] reused across reads. The observed sequence is compared with
//! both predicted sequences component by component; the correct hypothesis
//! is checked first, so a non-discriminating fixture classifies as
//! `MatchesCorrect`. A transform fault stops that fixture only.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use serde::Serialize;

use crate::core::errors::{PdhError, Result};
use crate::geometry::kind::PathKind;
use crate::geometry::primitives::{Rect, worst_deviation};
use crate::harness::catalog;
use crate::harness::transform::{PathInput, TransformUnderTest};
use crate::logger::run_log::RunLog;
use crate::model::drift::{self, Hypothesis, Predictions};
use crate::model::fixture::Fixture;

/// Default per-component tolerance, in points.
pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// Which known behavior an observed sequence matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    MatchesCorrect,
    MatchesBuggy,
    /// Neither hypothesis fits: a behavior the model does not describe.
    Unmodeled,
}

impl Classification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MatchesCorrect => "matches_correct",
            Self::MatchesBuggy => "matches_buggy",
            Self::Unmodeled => "unmodeled",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Classified { classification: Classification },
    /// The transform raised on 1-indexed `read`; no classification was attempted.
    TransformFailed { read: u32, details: String },
}

impl Verdict {
    /// Report token: the classification, or `transform_failed`.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Classified { classification } => classification.as_str(),
            Self::TransformFailed { .. } => "transform_failed",
        }
    }

    #[must_use]
    pub const fn classification(&self) -> Option<Classification> {
        match self {
            Self::Classified { classification } => Some(*classification),
            Self::TransformFailed { .. } => None,
        }
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.classification() == Some(Classification::MatchesCorrect)
    }
}

/// Everything recorded about one fixture run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureRun {
    pub fixture_id: String,
    pub path_kind: PathKind,
    pub read_count: u32,
    /// Whether the two hypotheses predict different sequences for this fixture.
    pub discriminating: bool,
    /// Rects returned before completion or the first fault.
    pub observed: Vec<Rect>,
    /// Worst per-component deviation from each prediction (absent on fault).
    pub deviation_correct: Option<f64>,
    pub deviation_buggy: Option<f64>,
    pub verdict: Verdict,
}

/// Verdict counts across a suite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub matches_correct: usize,
    pub matches_buggy: usize,
    pub unmodeled: usize,
    pub transform_failed: usize,
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matches_correct, {} matches_buggy, {} unmodeled, {} transform_failed",
            self.matches_correct, self.matches_buggy, self.unmodeled, self.transform_failed
        )
    }
}

/// Results for a fixture set, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub transform: String,
    pub tolerance: f64,
    /// SHA-256 of the fixture set, see [`catalog::fingerprint`].
    pub fingerprint: String,
    pub runs: Vec<FixtureRun>,
}

impl SuiteReport {
    #[must_use]
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for run in &self.runs {
            match run.verdict.classification() {
                Some(Classification::MatchesCorrect) => tally.matches_correct += 1,
                Some(Classification::MatchesBuggy) => tally.matches_buggy += 1,
                Some(Classification::Unmodeled) => tally.unmodeled += 1,
                None => tally.transform_failed += 1,
            }
        }
        tally
    }

    /// True when every fixture matched the correct hypothesis.
    #[must_use]
    pub fn all_correct(&self) -> bool {
        self.runs.iter().all(|run| run.verdict.is_correct())
    }

    /// Verdicts keyed by fixture id.
    #[must_use]
    pub fn by_fixture(&self) -> BTreeMap<&str, &Verdict> {
        self.runs
            .iter()
            .map(|run| (run.fixture_id.as_str(), &run.verdict))
            .collect()
    }

    #[must_use]
    pub fn get(&self, fixture_id: &str) -> Option<&FixtureRun> {
        self.runs.iter().find(|run| run.fixture_id == fixture_id)
    }
}

/// Stateless driver; settings are fixed at construction.
#[derive(Debug, Clone)]
pub struct ConformanceHarness {
    tolerance: f64,
    log: Option<Arc<RunLog>>,
}

impl Default for ConformanceHarness {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            log: None,
        }
    }
}

impl ConformanceHarness {
    pub fn new(tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(PdhError::invalid(
                "tolerance",
                format!("must be finite and >= 0, got {tolerance}"),
            ));
        }
        Ok(Self {
            tolerance,
            log: None,
        })
    }

    /// Record every run into `log`.
    #[must_use]
    pub fn with_log(mut self, log: Arc<RunLog>) -> Self {
        self.log = Some(log);
        self
    }

    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Read one fixture `read_count` times and classify the observed sequence.
    pub fn run(&self, fixture: &Fixture, transform: &mut dyn TransformUnderTest) -> FixtureRun {
        let path = PathInput::for_fixture(fixture);
        let view_frame = fixture.view_frame();
        let mut observed = Vec::with_capacity(fixture.read_count().min(1024) as usize);
        let mut fault = None;

        for read in 1..=fixture.read_count() {
            match transform.read_bounds(&path, &view_frame) {
                Ok(rect) => observed.push(rect),
                Err(error) => {
                    fault = Some((read, error.to_string()));
                    break;
                }
            }
        }

        let run = match fault {
            Some((read, details)) => FixtureRun {
                fixture_id: fixture.id().to_string(),
                path_kind: fixture.path_kind(),
                read_count: fixture.read_count(),
                discriminating: drift::is_discriminating(fixture),
                observed,
                deviation_correct: None,
                deviation_buggy: None,
                verdict: Verdict::TransformFailed { read, details },
            },
            None => {
                let predictions = Predictions::for_fixture(fixture);
                let classification = classify(&observed, &predictions, self.tolerance);
                FixtureRun {
                    fixture_id: fixture.id().to_string(),
                    path_kind: fixture.path_kind(),
                    read_count: fixture.read_count(),
                    discriminating: drift::is_discriminating(fixture),
                    deviation_correct: Some(sequence_deviation(&observed, &predictions.correct)),
                    deviation_buggy: Some(sequence_deviation(&observed, &predictions.buggy)),
                    observed,
                    verdict: Verdict::Classified { classification },
                }
            }
        };

        if let Some(log) = &self.log {
            log.fixture_finished(transform.name(), &run);
        }
        run
    }

    /// Run every fixture, in order, against one transform instance.
    ///
    /// Never stops early: faults are recorded per fixture. Fails only on
    /// duplicate fixture ids.
    pub fn run_suite(
        &self,
        fixtures: &[Fixture],
        transform: &mut dyn TransformUnderTest,
    ) -> Result<SuiteReport> {
        catalog::ensure_unique_ids(fixtures)?;
        let fingerprint = catalog::fingerprint(fixtures)?;
        let label = transform.name().to_string();
        let started = Instant::now();
        self.log_start(&label, fixtures.len(), &fingerprint);

        let mut runs = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            runs.push(self.run(fixture, transform));
        }

        Ok(self.finish(label, fingerprint, runs, started))
    }

    /// Like [`Self::run_suite`], spreading fixtures over `jobs` worker threads.
    ///
    /// Each worker builds its own transform with `factory`, so per-path state
    /// never crosses workers. Reads within a fixture stay sequential and the
    /// report keeps input order.
    pub fn run_suite_parallel<F, T>(
        &self,
        fixtures: &[Fixture],
        jobs: usize,
        factory: F,
    ) -> Result<SuiteReport>
    where
        F: Fn() -> T + Sync,
        T: TransformUnderTest,
    {
        if jobs == 0 {
            return Err(PdhError::invalid("jobs", "must be >= 1"));
        }
        if jobs == 1 {
            let mut transform = factory();
            return self.run_suite(fixtures, &mut transform);
        }

        catalog::ensure_unique_ids(fixtures)?;
        let fingerprint = catalog::fingerprint(fixtures)?;
        let label = factory().name().to_string();
        let started = Instant::now();
        self.log_start(&label, fixtures.len(), &fingerprint);

        let (work_tx, work_rx) = crossbeam_channel::unbounded::<usize>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, FixtureRun)>();
        for index in 0..fixtures.len() {
            work_tx.send(index).map_err(|_| PdhError::Runtime {
                details: "suite work queue closed".to_string(),
            })?;
        }
        drop(work_tx);

        let factory = &factory;
        thread::scope(|scope| {
            for _ in 0..jobs.min(fixtures.len()) {
                let work_rx = work_rx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    let mut transform = factory();
                    for index in work_rx {
                        let run = self.run(&fixtures[index], &mut transform);
                        if done_tx.send((index, run)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(done_tx);

        let mut slots: Vec<Option<FixtureRun>> = vec![None; fixtures.len()];
        for (index, run) in done_rx {
            slots[index] = Some(run);
        }
        let runs = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PdhError::Runtime {
                details: "suite worker exited before finishing its fixtures".to_string(),
            })?;

        Ok(self.finish(label, fingerprint, runs, started))
    }

    fn log_start(&self, label: &str, fixture_count: usize, fingerprint: &str) {
        if let Some(log) = &self.log {
            log.suite_started(label, fixture_count, fingerprint);
        }
    }

    fn finish(
        &self,
        transform: String,
        fingerprint: String,
        runs: Vec<FixtureRun>,
        started: Instant,
    ) -> SuiteReport {
        let report = SuiteReport {
            transform,
            tolerance: self.tolerance,
            fingerprint,
            runs,
        };
        if let Some(log) = &self.log {
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            log.suite_finished(&report, elapsed);
        }
        report
    }
}

/// Correct first, then buggy, else unmodeled.
#[must_use]
pub fn classify(observed: &[Rect], predictions: &Predictions, tolerance: f64) -> Classification {
    for hypothesis in Hypothesis::ALL {
        if sequences_match(observed, predictions.get(hypothesis), tolerance) {
            return match hypothesis {
                Hypothesis::Correct => Classification::MatchesCorrect,
                Hypothesis::Buggy => Classification::MatchesBuggy,
            };
        }
    }
    Classification::Unmodeled
}

/// Same length, and every read within `tolerance` on each component.
#[must_use]
pub fn sequences_match(observed: &[Rect], predicted: &[Rect], tolerance: f64) -> bool {
    observed.len() == predicted.len()
        && observed
            .iter()
            .zip(predicted)
            .all(|(o, p)| o.approx_eq(p, tolerance))
}

fn sequence_deviation(observed: &[Rect], predicted: &[Rect]) -> f64 {
    if observed.len() != predicted.len() {
        return f64::INFINITY;
    }
    worst_deviation(observed.iter().zip(predicted).map(|(o, p)| o.max_deviation(p)))
}
