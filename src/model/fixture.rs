//! Immutable scenario descriptions shared by the drift model and the harness.
//!
//! A `Fixture` is validated once at construction and exposes getters only.
//! Fixture files go through [`RawFixture`], whose signed `reads` field lets
//! a negative count surface as `InvalidArgument` instead of a parse error
//! or a silent clamp.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::core::errors::{PdhError, Result};
use crate::geometry::kind::PathKind;
use crate::geometry::primitives::{Point, Rect};

/// Longest accepted fixture id.
pub const MAX_ID_LEN: usize = 128;

/// One scenario: a view at a known screen offset holding a path of a known
/// kind and local bounds, read `read_count` times in sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "RawFixture")]
pub struct Fixture {
    id: String,
    view_frame: Rect,
    path_kind: PathKind,
    path_local_bounds: Rect,
    read_count: u32,
}

impl Fixture {
    pub fn new(
        id: impl Into<String>,
        view_frame: Rect,
        path_kind: PathKind,
        path_local_bounds: Rect,
        read_count: u32,
    ) -> Result<Self> {
        let id = id.into();
        validate_id(&id)?;
        view_frame.validate("view_frame")?;
        path_local_bounds.validate("path_local_bounds")?;
        Ok(Self {
            id,
            view_frame,
            path_kind,
            path_local_bounds,
            read_count,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn view_frame(&self) -> Rect {
        self.view_frame
    }

    #[must_use]
    pub const fn path_kind(&self) -> PathKind {
        self.path_kind
    }

    #[must_use]
    pub const fn path_local_bounds(&self) -> Rect {
        self.path_local_bounds
    }

    #[must_use]
    pub const fn read_count(&self) -> u32 {
        self.read_count
    }

    /// Translation of the view in root coordinates.
    ///
    /// Views are modeled unrotated and unscaled, directly inside the root, so
    /// the offset is the frame origin.
    #[must_use]
    pub const fn screen_offset(&self) -> Point {
        self.view_frame.origin()
    }
}

/// Serialized fixture form used by fixture files and JSON listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFixture {
    pub id: String,
    pub kind: String,
    /// `[x, y, width, height]` of the view in root coordinates.
    pub view_frame: [f64; 4],
    /// `[x, y, width, height]` of the path in view-local coordinates.
    pub path_bounds: [f64; 4],
    pub reads: i64,
}

impl From<Fixture> for RawFixture {
    fn from(value: Fixture) -> Self {
        Self {
            id: value.id,
            kind: value.path_kind.as_str().to_string(),
            view_frame: value.view_frame.to_array(),
            path_bounds: value.path_local_bounds.to_array(),
            reads: i64::from(value.read_count),
        }
    }
}

impl TryFrom<RawFixture> for Fixture {
    type Error = PdhError;

    fn try_from(raw: RawFixture) -> Result<Self> {
        let path_kind: PathKind = raw.kind.parse()?;
        if raw.reads < 0 {
            return Err(PdhError::invalid(
                "read_count",
                format!("fixture {}: must be >= 0, got {}", raw.id, raw.reads),
            ));
        }
        let read_count = u32::try_from(raw.reads).map_err(|_| {
            PdhError::invalid(
                "read_count",
                format!("fixture {}: {} exceeds {}", raw.id, raw.reads, u32::MAX),
            )
        })?;
        Self::new(
            raw.id,
            Rect::from_array("view_frame", raw.view_frame)?,
            path_kind,
            Rect::from_array("path_local_bounds", raw.path_bounds)?,
            read_count,
        )
    }
}

fn validate_id(id: &str) -> Result<()> {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return Err(PdhError::invalid("id", "fixture id must not be empty"));
    };
    if id.len() > MAX_ID_LEN {
        return Err(PdhError::invalid(
            "id",
            format!("fixture id longer than {MAX_ID_LEN} bytes"),
        ));
    }
    if !first.is_ascii_alphanumeric()
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(PdhError::invalid(
            "id",
            format!("fixture id {id:?} must match [A-Za-z0-9][A-Za-z0-9_.-]*"),
        ));
    }
    Ok(())
}
