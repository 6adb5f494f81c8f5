//! PDH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, PdhError>;

/// Top-level error type for the drift harness.
#[derive(Debug, Error)]
pub enum PdhError {
    #[error("[PDH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PDH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[PDH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[PDH-1101] invalid argument `{field}`: {details}")]
    InvalidArgument {
        field: &'static str,
        details: String,
    },

    #[error("[PDH-1102] duplicate fixture id: {id}")]
    DuplicateFixture { id: String },

    #[error("[PDH-2001] fixture file parse failure in {path}: {details}")]
    FixtureParse { path: PathBuf, details: String },

    #[error("[PDH-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[PDH-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[PDH-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl PdhError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "PDH-1001",
            Self::MissingConfig { .. } => "PDH-1002",
            Self::ConfigParse { .. } => "PDH-1003",
            Self::InvalidArgument { .. } => "PDH-1101",
            Self::DuplicateFixture { .. } => "PDH-1102",
            Self::FixtureParse { .. } => "PDH-2001",
            Self::Serialization { .. } => "PDH-2101",
            Self::Io { .. } => "PDH-3002",
            Self::Runtime { .. } => "PDH-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for argument validation failures.
    #[must_use]
    pub fn invalid(field: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for PdhError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for PdhError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<regex::Error> for PdhError {
    fn from(value: regex::Error) -> Self {
        Self::InvalidArgument {
            field: "pattern",
            details: value.to_string(),
        }
    }
}
