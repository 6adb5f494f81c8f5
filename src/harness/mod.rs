//! Conformance harness: transform bindings, fixture catalog, suite runner, reports.

pub mod catalog;
pub mod conformance;
pub mod report;
pub mod transform;
