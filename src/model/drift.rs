//! Drift model: predicted bounding-box sequences under the correct and buggy hypotheses.
//!
//! The buggy law is a curve fit over collected reports, not a derivation:
//! for drift-prone path kinds, read `k` (1-indexed) of the same path lands
//! at `bounds + k × offset`, extent unchanged. Drift-immune kinds, and every
//! kind under the correct hypothesis, land at `bounds + offset` on every read.
//!
//! The read index is an explicit argument. Nothing here counts reads.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{PdhError, Result};
use crate::geometry::kind::PathKind;
use crate::geometry::primitives::{Point, Rect};
use crate::model::fixture::Fixture;

/// Candidate behavioral law for repeated reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hypothesis {
    /// Documented behavior: the offset is applied once per read.
    Correct,
    /// Observed defect: the offset accumulates with each read.
    Buggy,
}

impl Hypothesis {
    /// Both hypotheses, in the order the harness checks them.
    pub const ALL: [Self; 2] = [Self::Correct, Self::Buggy];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Buggy => "buggy",
        }
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hypothesis {
    type Err = PdhError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(Self::Correct),
            "buggy" => Ok(Self::Buggy),
            other => Err(PdhError::invalid(
                "hypothesis",
                format!("expected correct or buggy, got {other:?}"),
            )),
        }
    }
}

/// Predicted rect for a single 1-indexed read.
#[must_use]
pub fn predict_read(
    path_local_bounds: Rect,
    screen_offset: Point,
    path_kind: PathKind,
    hypothesis: Hypothesis,
    read: NonZeroU32,
) -> Rect {
    let multiplier = match hypothesis {
        Hypothesis::Buggy if path_kind.is_drift_prone() => f64::from(read.get()),
        Hypothesis::Correct | Hypothesis::Buggy => 1.0,
    };
    path_local_bounds.translated(screen_offset.scaled(multiplier))
}

/// Predicted rects for reads `1..=read_count`. Empty when `read_count == 0`.
#[must_use]
pub fn predict_sequence(
    path_local_bounds: Rect,
    screen_offset: Point,
    path_kind: PathKind,
    hypothesis: Hypothesis,
    read_count: u32,
) -> Vec<Rect> {
    (1..=read_count)
        .filter_map(NonZeroU32::new)
        .map(|read| predict_read(path_local_bounds, screen_offset, path_kind, hypothesis, read))
        .collect()
}

/// Predicted sequence for a fixture under one hypothesis.
#[must_use]
pub fn predict(fixture: &Fixture, hypothesis: Hypothesis) -> Vec<Rect> {
    predict_sequence(
        fixture.path_local_bounds(),
        fixture.screen_offset(),
        fixture.path_kind(),
        hypothesis,
        fixture.read_count(),
    )
}

/// Whether the two hypotheses predict different sequences for this fixture.
///
/// Read 1 never differs, so at least two reads of a drift-prone path at a
/// non-zero offset are needed.
#[must_use]
pub fn is_discriminating(fixture: &Fixture) -> bool {
    fixture.path_kind().is_drift_prone()
        && !fixture.screen_offset().is_zero()
        && fixture.read_count() >= 2
}

/// Both predicted sequences for one fixture, computed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions {
    pub correct: Vec<Rect>,
    pub buggy: Vec<Rect>,
}

impl Predictions {
    #[must_use]
    pub fn for_fixture(fixture: &Fixture) -> Self {
        Self {
            correct: predict(fixture, Hypothesis::Correct),
            buggy: predict(fixture, Hypothesis::Buggy),
        }
    }

    #[must_use]
    pub fn get(&self, hypothesis: Hypothesis) -> &[Rect] {
        match hypothesis {
            Hypothesis::Correct => &self.correct,
            Hypothesis::Buggy => &self.buggy,
        }
    }
}
