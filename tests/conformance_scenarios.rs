//! End-to-end harness scenarios against the simulated bindings and ad-hoc
//! closure transforms.

use std::fs;
use std::num::NonZeroU32;
use std::sync::Arc;

use path_drift_harness::harness::catalog;
use path_drift_harness::logger::jsonl::JsonlConfig;
use path_drift_harness::prelude::{
    AccumulatingTransform, BindingName, Classification, ConformanceHarness, CopyPerReadTransform,
    Fixture, FixtureRun, PathInput, PathKind, Rect, ReferenceTransform, RunLog, TransformFault,
    TransformUnderTest, Verdict, is_discriminating,
};
use serde_json::Value;

const VIEW: Rect = Rect::new(100.0, 200.0, 320.0, 240.0);
const BOUNDS: Rect = Rect::new(0.0, 0.0, 60.0, 40.0);

fn fixture(id: &str, view: Rect, kind: PathKind, reads: u32) -> Fixture {
    Fixture::new(id, view, kind, BOUNDS, reads).expect("valid fixture")
}

fn classification(run: &FixtureRun) -> Classification {
    run.verdict
        .classification()
        .unwrap_or_else(|| panic!("{} was not classified: {:?}", run.fixture_id, run.verdict))
}

#[test]
fn scenario_a_accumulating_rounded_rect_matches_buggy() {
    let fx = fixture("scenario-a", VIEW, PathKind::RoundedRect, 3);
    let run = ConformanceHarness::default().run(&fx, &mut AccumulatingTransform::new());

    let origins: Vec<(f64, f64)> = run
        .observed
        .iter()
        .map(|r| (r.origin_x, r.origin_y))
        .collect();
    assert_eq!(origins, vec![(100.0, 200.0), (200.0, 400.0), (300.0, 600.0)]);
    assert!(run.observed.iter().all(|r| r.width == 60.0 && r.height == 40.0));
    assert_eq!(classification(&run), Classification::MatchesBuggy);
    assert!(run.discriminating);
}

#[test]
fn scenario_b_plain_rect_is_immune() {
    let fx = fixture("scenario-b", VIEW, PathKind::Rect, 3);
    for mut transform in [
        BindingName::Reference.build(None),
        BindingName::Accumulating.build(None),
        BindingName::CopyPerRead.build(None),
    ] {
        let run = ConformanceHarness::default().run(&fx, &mut transform);
        assert_eq!(
            classification(&run),
            Classification::MatchesCorrect,
            "binding {}",
            transform.name()
        );
        assert!(run.observed.iter().all(|r| *r == Rect::new(100.0, 200.0, 60.0, 40.0)));
    }
}

#[test]
fn scenario_c_zero_offset_never_discriminates() {
    let origin = Rect::new(0.0, 0.0, 320.0, 240.0);
    for kind in PathKind::ALL {
        let fx = fixture("scenario-c", origin, kind, 5);
        assert!(!is_discriminating(&fx));
        let run = ConformanceHarness::default().run(&fx, &mut AccumulatingTransform::new());
        assert_eq!(classification(&run), Classification::MatchesCorrect, "{kind}");
    }
}

#[test]
fn scenario_d_copy_per_read_workaround_matches_correct() {
    let fx = fixture("scenario-d", VIEW, PathKind::ExplicitElements, 6);
    let run = ConformanceHarness::default().run(&fx, &mut CopyPerReadTransform::new());
    assert_eq!(classification(&run), Classification::MatchesCorrect);
    assert_eq!(run.deviation_correct, Some(0.0));
}

/// Transform that replays fixed origins for a 60x40 path, one per read.
fn replay(origins: &[(f64, f64)]) -> impl FnMut(&PathInput, &Rect) -> Result<Rect, TransformFault> {
    let mut remaining = origins.to_vec().into_iter();
    move |_path: &PathInput, _view: &Rect| {
        remaining
            .next()
            .map(|(x, y)| Rect::new(x, y, 60.0, 40.0))
            .ok_or_else(|| TransformFault::new("no more recorded reads"))
    }
}

#[test]
fn scenario_d_recorded_sequences_classify_by_shape() {
    let fx = fixture("scenario-a", VIEW, PathKind::RoundedRect, 3);
    let harness = ConformanceHarness::default();
    let cases = [
        (
            vec![(100.0, 200.0), (200.0, 400.0), (300.0, 600.0)],
            Classification::MatchesBuggy,
        ),
        (
            vec![(100.0, 200.0), (100.0, 200.0), (100.0, 200.0)],
            Classification::MatchesCorrect,
        ),
        (
            vec![(100.0, 200.0), (250.0, 200.0), (300.0, 600.0)],
            Classification::Unmodeled,
        ),
    ];
    for (origins, expected) in cases {
        let mut transform = replay(&origins);
        let run = harness.run(&fx, &mut transform);
        assert_eq!(classification(&run), expected, "sequence {origins:?}");
    }
}

#[test]
fn closure_with_unknown_drift_is_unmodeled() {
    let fx = fixture("double-drift", VIEW, PathKind::RoundedRect, 3);
    let mut reads = 0.0;
    let mut transform = |path: &PathInput, view: &Rect| -> Result<Rect, TransformFault> {
        reads += 1.0;
        Ok(path.local_bounds.translated(view.origin().scaled(2.0 * reads)))
    };
    let run = ConformanceHarness::default().run(&fx, &mut transform);
    assert_eq!(classification(&run), Classification::Unmodeled);
}

#[test]
fn small_noise_stays_within_tolerance() {
    let fx = fixture("noisy", VIEW, PathKind::Oval, 4);
    let mut transform = |path: &PathInput, view: &Rect| -> Result<Rect, TransformFault> {
        let mut r = path.local_bounds.translated(view.origin());
        r.origin_x += 0.4;
        r.height -= 0.3;
        Ok(r)
    };
    let run = ConformanceHarness::default().run(&fx, &mut transform);
    assert_eq!(classification(&run), Classification::MatchesCorrect);

    let strict = ConformanceHarness::new(0.1).expect("tolerance");
    let run = strict.run(&fx, &mut transform);
    assert_eq!(classification(&run), Classification::Unmodeled);
}

#[test]
fn suite_returns_one_result_per_fixture_even_when_transform_fails() {
    let fixtures = vec![
        fixture("first", VIEW, PathKind::RoundedRect, 3),
        fixture("second", VIEW, PathKind::Arc, 1),
        fixture("third", VIEW, PathKind::Rect, 0),
    ];
    let mut transform = FaultyTransformUnderTest::default();
    let report = ConformanceHarness::default()
        .run_suite(&fixtures, &mut transform)
        .expect("suite");

    assert_eq!(report.runs.len(), 3);
    let ids: Vec<&str> = report.runs.iter().map(|r| r.fixture_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
    assert_eq!(
        report.runs[0].verdict,
        Verdict::TransformFailed {
            read: 2,
            details: "second read always fails".to_string(),
        }
    );
    assert_eq!(report.runs[0].observed.len(), 1);
    assert_eq!(classification(&report.runs[1]), Classification::MatchesCorrect);
    assert_eq!(classification(&report.runs[2]), Classification::MatchesCorrect);
    assert!(report.runs[2].observed.is_empty());
    assert!(!report.all_correct());
    assert_eq!(report.tally().transform_failed, 1);
}

/// Fails the second read it ever sees.
#[derive(Default)]
struct FaultyTransformUnderTest {
    reads: u32,
}

impl TransformUnderTest for FaultyTransformUnderTest {
    fn name(&self) -> &str {
        "fails-second-read"
    }

    fn read_bounds(&mut self, path: &PathInput, view: &Rect) -> Result<Rect, TransformFault> {
        self.reads += 1;
        if self.reads == 2 {
            return Err(TransformFault::new("second read always fails"));
        }
        Ok(path.local_bounds.translated(view.origin()))
    }
}

#[test]
fn injected_fault_is_reported_per_fixture() {
    let fixtures = catalog::builtin().expect("catalog");
    let mut transform = BindingName::Reference.build(NonZeroU32::new(2));
    let report = ConformanceHarness::default()
        .run_suite(&fixtures, &mut transform)
        .expect("suite");
    assert_eq!(report.transform, "reference+fail@2");
    for run in &report.runs {
        if run.read_count >= 2 {
            assert_eq!(run.verdict.token(), "transform_failed", "{}", run.fixture_id);
        } else {
            assert!(run.verdict.is_correct(), "{}", run.fixture_id);
        }
    }
}

#[test]
fn duplicate_ids_are_rejected_before_any_read() {
    let fixtures = vec![
        fixture("same", VIEW, PathKind::Rect, 1),
        fixture("same", VIEW, PathKind::Oval, 1),
    ];
    let mut calls = 0;
    let mut transform = |path: &PathInput, view: &Rect| -> Result<Rect, TransformFault> {
        calls += 1;
        Ok(path.local_bounds.translated(view.origin()))
    };
    let err = ConformanceHarness::default()
        .run_suite(&fixtures, &mut transform)
        .expect_err("duplicate ids");
    assert_eq!(err.code(), "PDH-1102");
    assert_eq!(calls, 0);
}

#[test]
fn builtin_catalog_against_each_binding() {
    let fixtures = catalog::builtin().expect("catalog");
    let harness = ConformanceHarness::default();

    let reference = harness
        .run_suite(&fixtures, &mut BindingName::Reference.build(None))
        .expect("reference");
    assert!(reference.all_correct(), "{:?}", reference.tally());

    let workaround = harness
        .run_suite(&fixtures, &mut BindingName::CopyPerRead.build(None))
        .expect("copy-per-read");
    assert!(workaround.all_correct(), "{:?}", workaround.tally());

    let buggy = harness
        .run_suite(&fixtures, &mut BindingName::Accumulating.build(None))
        .expect("accumulating");
    assert!(!buggy.all_correct());
    for run in &buggy.runs {
        let expected = if run.discriminating {
            Classification::MatchesBuggy
        } else {
            Classification::MatchesCorrect
        };
        assert_eq!(classification(run), expected, "{}", run.fixture_id);
    }
}

#[test]
fn parallel_suite_matches_sequential() {
    let fixtures = catalog::synthesize(7, 64, 6).expect("synthetic set");
    let harness = ConformanceHarness::default();
    for binding in BindingName::ALL {
        let sequential = harness
            .run_suite(&fixtures, &mut binding.build(None))
            .expect("sequential");
        let parallel = harness
            .run_suite_parallel(&fixtures, 4, || binding.build(None))
            .expect("parallel");
        assert_eq!(sequential, parallel, "binding {binding}");
    }
}

#[test]
fn parallel_suite_rejects_zero_jobs() {
    let fixtures = catalog::builtin().expect("catalog");
    let err = ConformanceHarness::default()
        .run_suite_parallel(&fixtures, 0, || ReferenceTransform)
        .expect_err("zero jobs");
    assert_eq!(err.code(), "PDH-1101");
}

#[test]
fn run_log_records_suite_events() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("runs.jsonl");
    let log = Arc::new(RunLog::open(JsonlConfig::at(&path)));
    let harness = ConformanceHarness::default().with_log(Arc::clone(&log));

    let fixtures = vec![
        fixture("logged-a", VIEW, PathKind::RoundedRect, 3),
        fixture("logged-b", VIEW, PathKind::Rect, 2),
    ];
    harness
        .run_suite(&fixtures, &mut AccumulatingTransform::new())
        .expect("suite");
    drop(harness);
    drop(log);

    let raw = fs::read_to_string(&path).expect("log written");
    let events: Vec<Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| e["event"].as_str().expect("event"))
        .collect();
    assert_eq!(
        kinds,
        vec![
            "suite_start",
            "fixture_classified",
            "fixture_classified",
            "suite_finish"
        ]
    );
    assert_eq!(events[1]["verdict"], "matches_buggy");
    assert_eq!(events[1]["severity"], "warning");
    assert_eq!(events[2]["verdict"], "matches_correct");
    assert_eq!(events[3]["fixture_count"], 2);
}
