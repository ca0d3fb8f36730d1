//! Runtime configuration: resolution timings and the `DICEDUEL_*` environment.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CATALOG_PATH;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const BIND_ENV: &str = "DICEDUEL_BIND";
pub const CARDS_ENV: &str = "DICEDUEL_CARDS";
pub const LOG_ENV: &str = "DICEDUEL_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Fixed offsets of one resolution, in milliseconds from the roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Gap between consecutive hits of one attacker.
    pub hit_interval_ms: u64,
    pub progress_tick_ms: u64,
    pub progress_duration_ms: u64,
    /// When the turn switch fires.
    pub resolution_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            hit_interval_ms: 200,
            progress_tick_ms: 50,
            progress_duration_ms: 1500,
            resolution_delay_ms: 1500,
        }
    }
}

/// Upper bound for any single timing value.
pub const MAX_TIMING_MS: u64 = 60_000;
/// Upper bound for progress ticks queued per resolution.
pub const MAX_PROGRESS_STEPS: u64 = 1_000;

impl TimingConfig {
    /// Reject timings that would overflow offsets or flood the scheduler.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("hit_interval_ms", self.hit_interval_ms),
            ("progress_duration_ms", self.progress_duration_ms),
            ("resolution_delay_ms", self.resolution_delay_ms),
            ("progress_tick_ms", self.progress_tick_ms),
        ] {
            if value > MAX_TIMING_MS {
                return Err(ConfigError::InvalidTiming {
                    field,
                    reason: "exceeds 60000 ms",
                });
            }
        }
        if self.progress_tick_ms == 0 {
            return Err(ConfigError::InvalidTiming {
                field: "progress_tick_ms",
                reason: "must be at least 1 ms",
            });
        }
        if self.progress_duration_ms / self.progress_tick_ms > MAX_PROGRESS_STEPS {
            return Err(ConfigError::InvalidTiming {
                field: "progress_tick_ms",
                reason: "more than 1000 progress ticks per resolution",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTiming {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTiming { field, reason } => write!(f, "invalid timing {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Explicit catalog file, or `data/cards.json` when it exists.
    pub cards_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup(BIND_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let cards_path = match lookup(CARDS_ENV) {
            Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => Some(PathBuf::from(DEFAULT_CATALOG_PATH)).filter(|p| p.is_file()),
        };

        Self {
            bind_addr,
            cards_path,
        }
    }
}
