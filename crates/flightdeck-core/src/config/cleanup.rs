//! Cleanup scheduler configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Cleanup interval bounds, in minutes. The upper bound is one day.
pub const MIN_CLEANUP_INTERVAL_MINUTES: i64 = 1;
pub const MAX_CLEANUP_INTERVAL_MINUTES: i64 = 1_440;

/// Configuration for the expired-token cleanup scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// How often the cleanup task runs, in minutes.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,

    /// Human-readable job name used in logs.
    #[serde(default = "default_job_name")]
    pub job_name: String,
}

impl CleanupConfig {
    /// Validate bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_minutes < MIN_CLEANUP_INTERVAL_MINUTES
            || self.interval_minutes > MAX_CLEANUP_INTERVAL_MINUTES
        {
            return Err(ConfigError::OutOfRange {
                field: "cleanup.interval_minutes",
                value: self.interval_minutes,
                min: MIN_CLEANUP_INTERVAL_MINUTES,
                max: MAX_CLEANUP_INTERVAL_MINUTES,
            });
        }
        Ok(())
    }

    /// The interval as a `std::time::Duration`.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_minutes as u64 * 60)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            job_name: default_job_name(),
        }
    }
}

fn default_interval_minutes() -> i64 {
    30
}

fn default_job_name() -> String {
    "Cleanup expired tokens and chat memory".to_string()
}
