//! Transform-under-test capability and the simulated bindings the CLI can register.
//!
//! A transform maps a path's view-local bounding box into root coordinates.
//! The harness hands it the same [`PathInput`] on every read of a fixture;
//! reusing one logical path across reads is the condition under which the
//! defect shows up, so bindings key any per-path state on [`PathHandle`].

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::errors::{PdhError, Result};
use crate::geometry::kind::PathKind;
use crate::geometry::primitives::Rect;
use crate::model::fixture::Fixture;

/// Identity of one logical path object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PathHandle(u64);

impl PathHandle {
    /// Deterministic handle for the path a fixture describes (FNV-1a over the id).
    #[must_use]
    pub fn for_fixture_id(id: &str) -> Self {
        Self(fnv1a(id.as_bytes(), 0xcbf2_9ce4_8422_2325))
    }

    /// Handle of the `generation`-th copy of this path.
    #[must_use]
    pub fn copy(self, generation: u64) -> Self {
        Self(fnv1a(&generation.to_le_bytes(), self.0))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    let mut hash = seed;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// The logical path a transform reads: identity, kind, and view-local bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathInput {
    pub handle: PathHandle,
    pub kind: PathKind,
    pub local_bounds: Rect,
}

impl PathInput {
    #[must_use]
    pub fn for_fixture(fixture: &Fixture) -> Self {
        Self {
            handle: PathHandle::for_fixture_id(fixture.id()),
            kind: fixture.path_kind(),
            local_bounds: fixture.path_local_bounds(),
        }
    }
}

/// Failure raised by a transform during a read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformFault {
    pub message: String,
}

impl TransformFault {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Injected capability: convert a path's local bounds into root coordinates.
pub trait TransformUnderTest {
    /// Label used in reports and the run log.
    fn name(&self) -> &str {
        "closure"
    }

    /// One read of the path's bounding box, as placed by `view_frame`.
    ///
    /// Failures must come back as `Err(TransformFault)` to be recorded as a
    /// `TransformFailed` verdict. A panic is not caught: it ends the whole
    /// suite, and release builds abort.
    fn read_bounds(
        &mut self,
        path: &PathInput,
        view_frame: &Rect,
    ) -> std::result::Result<Rect, TransformFault>;
}

impl<F> TransformUnderTest for F
where
    F: FnMut(&PathInput, &Rect) -> std::result::Result<Rect, TransformFault>,
{
    fn read_bounds(
        &mut self,
        path: &PathInput,
        view_frame: &Rect,
    ) -> std::result::Result<Rect, TransformFault> {
        self(path, view_frame)
    }
}

// ──────────────────── simulated bindings ────────────────────

/// Documented behavior: translate by the view origin once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceTransform;

impl TransformUnderTest for ReferenceTransform {
    fn name(&self) -> &str {
        BindingName::Reference.as_str()
    }

    fn read_bounds(
        &mut self,
        path: &PathInput,
        view_frame: &Rect,
    ) -> std::result::Result<Rect, TransformFault> {
        Ok(path.local_bounds.translated(view_frame.origin()))
    }
}

/// Reproduces the reported defect with a per-path read counter.
///
/// Drift-prone kinds come back translated by `count × origin`; other kinds
/// are translated once. The counter persists for the life of the binding,
/// so the same path read again in a later run keeps accumulating.
#[derive(Debug, Clone, Default)]
pub struct AccumulatingTransform {
    reads_by_path: HashMap<PathHandle, u32>,
}

impl AccumulatingTransform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads recorded so far for `handle`.
    #[must_use]
    pub fn reads_of(&self, handle: PathHandle) -> u32 {
        self.reads_by_path.get(&handle).copied().unwrap_or(0)
    }

    /// Number of paths with a live counter.
    #[must_use]
    pub fn tracked_paths(&self) -> usize {
        self.reads_by_path.len()
    }

    /// Drop the counter for a path that no longer exists.
    pub fn release(&mut self, handle: PathHandle) {
        self.reads_by_path.remove(&handle);
    }
}

impl TransformUnderTest for AccumulatingTransform {
    fn name(&self) -> &str {
        BindingName::Accumulating.as_str()
    }

    fn read_bounds(
        &mut self,
        path: &PathInput,
        view_frame: &Rect,
    ) -> std::result::Result<Rect, TransformFault> {
        let count = self.reads_by_path.entry(path.handle).or_insert(0);
        *count = count.saturating_add(1);
        let multiplier = if path.kind.is_drift_prone() {
            f64::from(*count)
        } else {
            1.0
        };
        Ok(path
            .local_bounds
            .translated(view_frame.origin().scaled(multiplier)))
    }
}

/// Reported workaround: copy the path before every read.
///
/// Wraps the defective binding; each copy is a new path, so its counter never
/// passes one and the result matches the documented behavior. The copy is
/// released after its read.
#[derive(Debug, Clone, Default)]
pub struct CopyPerReadTransform {
    inner: AccumulatingTransform,
    copies: u64,
}

impl CopyPerReadTransform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters still held by the wrapped binding; zero between reads.
    #[must_use]
    pub fn tracked_paths(&self) -> usize {
        self.inner.tracked_paths()
    }
}

impl TransformUnderTest for CopyPerReadTransform {
    fn name(&self) -> &str {
        BindingName::CopyPerRead.as_str()
    }

    fn read_bounds(
        &mut self,
        path: &PathInput,
        view_frame: &Rect,
    ) -> std::result::Result<Rect, TransformFault> {
        self.copies = self.copies.wrapping_add(1);
        let copy = PathInput {
            handle: path.handle.copy(self.copies),
            ..path.clone()
        };
        let result = self.inner.read_bounds(&copy, view_frame);
        self.inner.release(copy.handle);
        result
    }
}

/// Fails the `fail_on_read`-th read of every path; other reads go to `inner`.
pub struct FaultyTransform {
    inner: Box<dyn TransformUnderTest + Send>,
    fail_on_read: NonZeroU32,
    reads_by_path: HashMap<PathHandle, u32>,
    label: String,
}

impl FaultyTransform {
    #[must_use]
    pub fn new(inner: Box<dyn TransformUnderTest + Send>, fail_on_read: NonZeroU32) -> Self {
        let label = format!("{}+fail@{}", inner.name(), fail_on_read);
        Self {
            inner,
            fail_on_read,
            reads_by_path: HashMap::new(),
            label,
        }
    }
}

impl fmt::Debug for FaultyTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultyTransform")
            .field("inner", &self.inner.name())
            .field("fail_on_read", &self.fail_on_read)
            .finish_non_exhaustive()
    }
}

impl TransformUnderTest for FaultyTransform {
    fn name(&self) -> &str {
        &self.label
    }

    fn read_bounds(
        &mut self,
        path: &PathInput,
        view_frame: &Rect,
    ) -> std::result::Result<Rect, TransformFault> {
        let count = self.reads_by_path.entry(path.handle).or_insert(0);
        *count = count.saturating_add(1);
        if *count == self.fail_on_read.get() {
            return Err(TransformFault::new(format!(
                "injected fault on read {} of {} path",
                self.fail_on_read, path.kind
            )));
        }
        self.inner.read_bounds(path, view_frame)
    }
}

// ──────────────────── registry ────────────────────

/// Bindings selectable by name from the CLI and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingName {
    Reference,
    Accumulating,
    CopyPerRead,
}

impl BindingName {
    pub const ALL: [Self; 3] = [Self::Reference, Self::Accumulating, Self::CopyPerRead];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Accumulating => "accumulating",
            Self::CopyPerRead => "copy-per-read",
        }
    }

    /// Fresh binding instance, optionally wrapped to fail on a given read.
    #[must_use]
    pub fn build(self, fail_on_read: Option<NonZeroU32>) -> BoundTransform {
        let base: Box<dyn TransformUnderTest + Send> = match self {
            Self::Reference => Box::new(ReferenceTransform),
            Self::Accumulating => Box::new(AccumulatingTransform::new()),
            Self::CopyPerRead => Box::new(CopyPerReadTransform::new()),
        };
        let inner: Box<dyn TransformUnderTest + Send> = match fail_on_read {
            Some(read) => Box::new(FaultyTransform::new(base, read)),
            None => base,
        };
        BoundTransform { inner }
    }
}

/// A binding built from the registry.
pub struct BoundTransform {
    inner: Box<dyn TransformUnderTest + Send>,
}

impl fmt::Debug for BoundTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundTransform")
            .field(&self.inner.name())
            .finish()
    }
}

impl TransformUnderTest for BoundTransform {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn read_bounds(
        &mut self,
        path: &PathInput,
        view_frame: &Rect,
    ) -> std::result::Result<Rect, TransformFault> {
        self.inner.read_bounds(path, view_frame)
    }
}

impl fmt::Display for BindingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingName {
    type Err = PdhError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| {
                PdhError::invalid(
                    "transform",
                    format!("unknown binding {s:?}; expected reference, accumulating, or copy-per-read"),
                )
            })
    }
}
