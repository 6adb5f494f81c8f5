//! `Point` and `Rect` in root (screen) coordinates.
//!
//! Both are plain `Copy` values. `Rect::validate` enforces the finite,
//! non-negative-extent contract for rects that come from untrusted input
//! (fixture files, CLI arguments); rects returned by a transform under test
//! are never validated, because malformed output is something to classify,
//! not reject.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{PdhError, Result};

/// 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise scalar multiple.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// Build from a `[x, y, width, height]` array, validating it.
    pub fn from_array(field: &'static str, raw: [f64; 4]) -> Result<Self> {
        let rect = Self::new(raw[0], raw[1], raw[2], raw[3]);
        rect.validate(field)?;
        Ok(rect)
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.origin_x, self.origin_y, self.width, self.height]
    }

    #[must_use]
    pub const fn origin(self) -> Point {
        Point {
            x: self.origin_x,
            y: self.origin_y,
        }
    }

    /// Check the finite, non-negative-extent contract.
    pub fn validate(&self, field: &'static str) -> Result<()> {
        let components = [
            ("origin_x", self.origin_x),
            ("origin_y", self.origin_y),
            ("width", self.width),
            ("height", self.height),
        ];
        for (name, value) in components {
            if !value.is_finite() {
                return Err(PdhError::invalid(
                    field,
                    format!("{name} must be finite, got {value}"),
                ));
            }
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(PdhError::invalid(
                field,
                format!(
                    "width/height must be >= 0, got {}x{}",
                    self.width, self.height
                ),
            ));
        }
        Ok(())
    }

    /// Translate the origin; extent is unchanged.
    #[must_use]
    pub fn translated(self, offset: Point) -> Self {
        Self {
            origin_x: self.origin_x + offset.x,
            origin_y: self.origin_y + offset.y,
            ..self
        }
    }

    /// Largest absolute per-component difference against `other`.
    ///
    /// NaN in either rect yields NaN, which never compares within tolerance.
    #[must_use]
    pub fn max_deviation(&self, other: &Self) -> f64 {
        let diffs = [
            (self.origin_x - other.origin_x).abs(),
            (self.origin_y - other.origin_y).abs(),
            (self.width - other.width).abs(),
            (self.height - other.height).abs(),
        ];
        worst_deviation(diffs)
    }

    /// Per-component comparison: origin x/y, width, height each within `tolerance`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.origin_x - other.origin_x).abs() <= tolerance
            && (self.origin_y - other.origin_y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

/// Largest of `deviations`, or NaN if any is NaN. Zero when empty.
#[must_use]
pub fn worst_deviation(deviations: impl IntoIterator<Item = f64>) -> f64 {
    deviations.into_iter().fold(0.0_f64, |acc, d| {
        if d.is_nan() || acc.is_nan() {
            f64::NAN
        } else {
            acc.max(d)
        }
    })
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.origin_x, self.origin_y, self.width, self.height
        )
    }
}

/// Parses `X,Y,W,H` (whitespace around components is ignored).
impl FromStr for Rect {
    type Err = PdhError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(PdhError::invalid(
                "rect",
                format!("expected X,Y,W,H with 4 components, got {s:?}"),
            ));
        }
        let mut raw = [0.0_f64; 4];
        for (slot, part) in raw.iter_mut().zip(&parts) {
            *slot = part.parse::<f64>().map_err(|error| {
                PdhError::invalid("rect", format!("component {part:?} in {s:?}: {error}"))
            })?;
        }
        Self::from_array("rect", raw)
    }
}
