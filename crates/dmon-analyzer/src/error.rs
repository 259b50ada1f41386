use std::path::PathBuf;

use thiserror::Error;

/// Problems with the analysis setup. Telemetry problems are never errors,
/// see [`crate::telemetry::LogCondition`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid phase `{spec}`: {reason}")]
    InvalidPhaseSpec { spec: String, reason: String },

    #[error("phase `{name}` targets {target}%, expected 0..=100")]
    TargetOutOfRange { name: String, target: u32 },

    #[error("tolerance must be a finite, non-negative number of percentage points, got `{0}`")]
    InvalidTolerance(String),

    #[error("window size must be at least one sample")]
    EmptyWindow,

    #[error("failed to read phase plan `{path}`")]
    PlanRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse phase plan `{path}`")]
    PlanParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
