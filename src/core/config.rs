//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{PdhError, Result};
use crate::harness::conformance::DEFAULT_TOLERANCE;
use crate::harness::transform::BindingName;
use crate::logger::jsonl::JsonlConfig;

/// Full harness configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub harness: HarnessConfig,
    pub log: LogConfig,
    pub paths: PathsConfig,
}

/// Suite execution knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Per-component tolerance when comparing observed and predicted rects.
    pub tolerance: f64,
    /// Binding used by `pdh run` when `--transform` is omitted.
    pub default_transform: BindingName,
    /// Worker threads for suite runs (1 = sequential).
    pub jobs: usize,
    /// Print the column header above tabular reports.
    pub table_header: bool,
}

/// JSONL run log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// Fixture file loaded instead of the built-in catalog.
    pub fixtures_file: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            default_transform: BindingName::Reference,
            jobs: 1,
            table_header: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: data_dir().join("runs.jsonl"),
            fallback_path: Some(env::temp_dir().join("pdh-runs.jsonl")),
            max_size_bytes: 16 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir().join(".config").join("pdh").join("config.toml"),
            fixtures_file: None,
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[PDH-CONFIG] WARNING: HOME not set, falling back to /tmp");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("pdh")
}

impl LogConfig {
    /// Writer settings for the JSONL run log.
    #[must_use]
    pub fn jsonl_config(&self) -> JsonlConfig {
        JsonlConfig {
            path: self.path.clone(),
            fallback_path: self.fallback_path.clone(),
            max_size_bytes: self.max_size_bytes,
            max_rotated_files: self.max_rotated_files,
        }
    }
}

impl Config {
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load from the default or an explicit path, then apply env overrides and validate.
    ///
    /// A missing file at the default path means defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| PdhError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(PdhError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// FNV-1a over the canonical JSON; stable across processes and releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("PDH_HARNESS_TOLERANCE") {
            self.harness.tolerance = parse_env("PDH_HARNESS_TOLERANCE", &raw)?;
        }
        if let Some(raw) = lookup("PDH_HARNESS_DEFAULT_TRANSFORM") {
            self.harness.default_transform =
                raw.parse::<BindingName>()
                    .map_err(|error| PdhError::ConfigParse {
                        context: "env",
                        details: format!("PDH_HARNESS_DEFAULT_TRANSFORM={raw:?}: {error}"),
                    })?;
        }
        if let Some(raw) = lookup("PDH_HARNESS_JOBS") {
            self.harness.jobs = parse_env("PDH_HARNESS_JOBS", &raw)?;
        }
        if let Some(raw) = lookup("PDH_FIXTURES_FILE") {
            self.paths.fixtures_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("PDH_LOG_ENABLED") {
            self.log.enabled = parse_env("PDH_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("PDH_LOG_PATH") {
            self.log.path = PathBuf::from(raw);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let tolerance = self.harness.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(PdhError::InvalidConfig {
                details: format!("harness.tolerance must be finite and >= 0, got {tolerance}"),
            });
        }
        if self.harness.jobs == 0 {
            return Err(PdhError::InvalidConfig {
                details: "harness.jobs must be >= 1".to_string(),
            });
        }
        if self.log.enabled && self.log.max_size_bytes < 1024 {
            return Err(PdhError::InvalidConfig {
                details: format!(
                    "log.max_size_bytes ({}) must be >= 1024",
                    self.log.max_size_bytes
                ),
            });
        }
        if self.log.enabled && self.log.path.as_os_str().is_empty() {
            return Err(PdhError::InvalidConfig {
                details: "log.path must not be empty when log.enabled=true".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| PdhError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
