//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use path_drift_harness::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{PdhError, Result};

// Geometry
pub use crate::geometry::kind::PathKind;
pub use crate::geometry::primitives::{Point, Rect};

// Model
pub use crate::model::drift::{Hypothesis, Predictions, is_discriminating, predict};
pub use crate::model::fixture::{Fixture, RawFixture};

// Harness
pub use crate::harness::conformance::{
    Classification, ConformanceHarness, DEFAULT_TOLERANCE, FixtureRun, SuiteReport, Verdict,
};
pub use crate::harness::transform::{
    AccumulatingTransform, BindingName, BoundTransform, CopyPerReadTransform, PathInput,
    ReferenceTransform,
    TransformFault, TransformUnderTest,
};

// Logging
pub use crate::logger::run_log::RunLog;
