//! Fixture sets: the built-in catalog, fixture files, seeded synthetic sweeps.
//!
//! Fixture files are TOML with `[[fixture]]` tables, or a JSON array when the
//! file name ends in `.json`:
//!
//! ```toml
//! [[fixture]]
//! id = "rounded-offset"
//! kind = "rounded_rect"
//! view_frame = [100.0, 200.0, 320.0, 240.0]
//! path_bounds = [0.0, 0.0, 60.0, 40.0]
//! reads = 3
//! ```

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::core::errors::{PdhError, Result};
use crate::geometry::kind::PathKind;
use crate::geometry::primitives::Rect;
use crate::model::fixture::{Fixture, RawFixture};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    #[serde(default, rename = "fixture")]
    fixtures: Vec<RawFixture>,
}

/// The fixed fixture set the CLI runs when no file is given.
pub fn builtin() -> Result<Vec<Fixture>> {
    const VIEW: [f64; 4] = [100.0, 200.0, 320.0, 240.0];
    const ORIGIN_VIEW: [f64; 4] = [0.0, 0.0, 320.0, 240.0];
    const BOUNDS: [f64; 4] = [0.0, 0.0, 60.0, 40.0];

    let mut fixtures = vec![
        entry("scenario-a", VIEW, PathKind::RoundedRect, BOUNDS, 3)?,
        entry("scenario-b", VIEW, PathKind::Rect, BOUNDS, 3)?,
    ];
    for kind in PathKind::ALL {
        fixtures.push(entry(
            &format!("scenario-c-{kind}"),
            ORIGIN_VIEW,
            kind,
            BOUNDS,
            5,
        )?);
    }
    fixtures.extend([
        entry("oval-offset", VIEW, PathKind::Oval, [5.0, 5.0, 50.0, 30.0], 4)?,
        entry("arc-offset", VIEW, PathKind::Arc, [10.0, 0.0, 24.0, 24.0], 4)?,
        entry(
            "explicit-elements-long",
            [12.5, 48.0, 200.0, 200.0],
            PathKind::ExplicitElements,
            [4.0, 4.0, 32.0, 16.0],
            8,
        )?,
        entry(
            "negative-origin",
            [-40.0, -75.0, 100.0, 100.0],
            PathKind::RoundedRect,
            [-10.0, -5.0, 20.0, 10.0],
            4,
        )?,
        entry(
            "large-magnitude",
            [1.0e6, 2.5e6, 10.0, 10.0],
            PathKind::ExplicitElements,
            [1.0e5, -1.0e5, 500.0, 250.0],
            3,
        )?,
        entry("single-read", VIEW, PathKind::RoundedRect, BOUNDS, 1)?,
        entry("zero-reads", VIEW, PathKind::RoundedRect, BOUNDS, 0)?,
    ]);
    Ok(fixtures)
}

fn entry(
    id: &str,
    view_frame: [f64; 4],
    kind: PathKind,
    path_bounds: [f64; 4],
    reads: u32,
) -> Result<Fixture> {
    Fixture::new(
        id,
        Rect::from_array("view_frame", view_frame)?,
        kind,
        Rect::from_array("path_local_bounds", path_bounds)?,
        reads,
    )
}

/// Load and validate a fixture file (TOML, or JSON for `*.json`).
pub fn load(path: &Path) -> Result<Vec<Fixture>> {
    let raw = fs::read_to_string(path).map_err(|source| PdhError::io(path, source))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let records: Vec<RawFixture> = if is_json {
        serde_json::from_str(&raw).map_err(|e| PdhError::FixtureParse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?
    } else {
        toml::from_str::<FixtureFile>(&raw)
            .map_err(|e| PdhError::FixtureParse {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?
            .fixtures
    };

    let fixtures = records
        .into_iter()
        .map(Fixture::try_from)
        .collect::<Result<Vec<_>>>()?;
    ensure_unique_ids(&fixtures)?;
    Ok(fixtures)
}

/// Reproducible random fixtures; the same `seed` always yields the same set.
pub fn synthesize(seed: u64, count: usize, max_reads: u32) -> Result<Vec<Fixture>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut fixtures = Vec::with_capacity(count);
    for index in 0..count {
        let kind = PathKind::ALL[rng.random_range(0..PathKind::ALL.len())];
        let view_frame = [
            centi(rng.random_range(-500.0..=500.0)),
            centi(rng.random_range(-500.0..=500.0)),
            centi(rng.random_range(1.0..=400.0)),
            centi(rng.random_range(1.0..=400.0)),
        ];
        let path_bounds = [
            centi(rng.random_range(-50.0..=50.0)),
            centi(rng.random_range(-50.0..=50.0)),
            centi(rng.random_range(0.0..=200.0)),
            centi(rng.random_range(0.0..=200.0)),
        ];
        let reads = rng.random_range(0..=max_reads);
        fixtures.push(entry(
            &format!("synth-{seed}-{index:04}"),
            view_frame,
            kind,
            path_bounds,
            reads,
        )?);
    }
    Ok(fixtures)
}

fn centi(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Keep fixtures whose id matches `pattern`.
pub fn filter(fixtures: Vec<Fixture>, pattern: &str) -> Result<Vec<Fixture>> {
    let re = Regex::new(pattern)?;
    Ok(fixtures
        .into_iter()
        .filter(|fixture| re.is_match(fixture.id()))
        .collect())
}

pub fn ensure_unique_ids(fixtures: &[Fixture]) -> Result<()> {
    let mut seen = HashSet::with_capacity(fixtures.len());
    for fixture in fixtures {
        if !seen.insert(fixture.id()) {
            return Err(PdhError::DuplicateFixture {
                id: fixture.id().to_string(),
            });
        }
    }
    Ok(())
}

/// Lowercase hex SHA-256 over the canonical JSON of the fixture set.
pub fn fingerprint(fixtures: &[Fixture]) -> Result<String> {
    let canonical = serde_json::to_vec(fixtures)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("{:x}", hasher.finalize()))
}
