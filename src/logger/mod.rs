//! Append-only JSONL run log with graceful degradation.

pub mod jsonl;
pub mod run_log;
