//! Drift model: immutable fixtures and the pure predicted-sequence functions.

pub mod drift;
pub mod fixture;
