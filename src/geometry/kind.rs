//! Path kinds observed to behave differently under repeated bounding-box reads.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::{PdhError, Result};

/// How the path was constructed. This tag alone decides whether drift is predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Rect,
    Oval,
    Arc,
    RoundedRect,
    ExplicitElements,
}

impl PathKind {
    pub const ALL: [Self; 5] = [
        Self::Rect,
        Self::Oval,
        Self::Arc,
        Self::RoundedRect,
        Self::ExplicitElements,
    ];

    /// Stable snake_case token used in reports and fixture files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Oval => "oval",
            Self::Arc => "arc",
            Self::RoundedRect => "rounded_rect",
            Self::ExplicitElements => "explicit_elements",
        }
    }

    /// Kinds whose reads accumulate the screen offset under the buggy hypothesis.
    #[must_use]
    pub const fn is_drift_prone(self) -> bool {
        matches!(self, Self::RoundedRect | Self::ExplicitElements)
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; `_` and `-` separators are optional (`rounded-rect`, `RoundedRect`).
impl FromStr for PathKind {
    type Err = PdhError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "rect" => Ok(Self::Rect),
            "oval" => Ok(Self::Oval),
            "arc" => Ok(Self::Arc),
            "roundedrect" => Ok(Self::RoundedRect),
            "explicitelements" => Ok(Self::ExplicitElements),
            _ => Err(PdhError::invalid(
                "path_kind",
                format!(
                    "unrecognized path kind {s:?}; expected one of rect, oval, arc, rounded_rect, explicit_elements"
                ),
            )),
        }
    }
}
