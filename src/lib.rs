#![forbid(unsafe_code)]

//! Path Drift Harness (pdh): a black-box model of a bounding-box transform
//! defect and a conformance harness that classifies real or simulated
//! transforms against it.
//!
//! Two pieces:
//! 1. **Drift model**: pure predicted sequences for the `correct` and
//!    `buggy` hypotheses, where the buggy law accumulates the view's screen
//!    offset once per repeated read of the same rounded-rect or
//!    explicit-element path.
//! 2. **Conformance harness**: drives an injected transform through
//!    immutable fixtures and classifies each as matching the correct
//!    behavior, the buggy behavior, or neither.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use path_drift_harness::prelude::*;
//!
//! # fn main() -> path_drift_harness::core::errors::Result<()> {
//! let fixture = Fixture::new(
//!     "scenario-a",
//!     Rect::new(100.0, 200.0, 320.0, 240.0),
//!     PathKind::RoundedRect,
//!     Rect::new(0.0, 0.0, 60.0, 40.0),
//!     3,
//! )?;
//! let run = ConformanceHarness::default().run(&fixture, &mut AccumulatingTransform::new());
//! assert_eq!(run.verdict.classification(), Some(Classification::MatchesBuggy));
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod core;
pub mod geometry;
pub mod harness;
pub mod logger;
pub mod model;
